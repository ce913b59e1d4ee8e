//! Process-wide application state shared by every request.
//!
//! `CoreState` owns the database location, the server-side session
//! store and the audit buffer. Locks are `std::sync` and are never held
//! across an `.await`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::config;
use crate::db;

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

/// Expired sessions are swept once the store grows past this size.
const SESSION_SWEEP_THRESHOLD: usize = 1_000;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Shared application state, wrapped in `Arc` at startup.
pub struct CoreState {
    db_path: PathBuf,
    session_ttl: Duration,
    /// SHA-256 of the session token → session. Raw tokens are never stored.
    sessions: RwLock<HashMap<[u8; 32], SessionEntry>>,
    audit: AuditLogger,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    identity_key: String,
    expires_at: Instant,
}

impl CoreState {
    pub fn new(db_path: impl Into<PathBuf>, session_ttl: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            session_ttl,
            sessions: RwLock::new(HashMap::new()),
            audit: AuditLogger::new(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Open a connection to the clinic database.
    ///
    /// The schema is created once at startup, so this only sets pragmas.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_connection(&self.db_path).map_err(CoreError::Database)
    }

    // ── Sessions ────────────────────────────────────────────

    /// Store a session for `identity_key` under the hash of its token.
    pub fn create_session(&self, token_hash: [u8; 32], identity_key: &str) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().map_err(|_| CoreError::LockPoisoned)?;
        if sessions.len() >= SESSION_SWEEP_THRESHOLD {
            let now = Instant::now();
            sessions.retain(|_, s| s.expires_at > now);
        }
        sessions.insert(token_hash, SessionEntry {
            identity_key: identity_key.to_string(),
            expires_at: Instant::now() + self.session_ttl,
        });
        Ok(())
    }

    /// Identity key for a live session; expired sessions are dropped.
    pub fn resolve_session(&self, token_hash: &[u8; 32]) -> Result<Option<String>, CoreError> {
        {
            let sessions = self.sessions.read().map_err(|_| CoreError::LockPoisoned)?;
            match sessions.get(token_hash) {
                None => return Ok(None),
                Some(s) if s.expires_at > Instant::now() => {
                    return Ok(Some(s.identity_key.clone()));
                }
                Some(_) => {}
            }
        }
        self.remove_session(token_hash)?;
        Ok(None)
    }

    /// Returns `true` if a session was removed.
    pub fn remove_session(&self, token_hash: &[u8; 32]) -> Result<bool, CoreError> {
        let mut sessions = self.sessions.write().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.remove(token_hash).is_some())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    // ── Audit logging ───────────────────────────────────────

    /// Log an access event. Auto-flushes to DB when buffer is full.
    pub fn log_access(&self, source: AccessSource, action: &str, entity: &str) {
        let needs_flush = self.audit.log(source, action, entity);
        if needs_flush {
            if let Err(e) = self.flush_and_prune_audit() {
                tracing::warn!("Auto-flush audit failed: {e}");
            }
        }
    }

    /// Get the current audit buffer contents.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Flush audit buffer to DB and prune old entries.
    pub fn flush_and_prune_audit(&self) -> Result<usize, CoreError> {
        let conn = self.open_db()?;
        let flushed = self.audit.flush_to_db(&conn)?;
        if let Err(e) = db::repository::prune_audit_log(&conn, config::AUDIT_RETENTION_DAYS) {
            tracing::warn!("Failed to prune audit log: {e}");
        }
        Ok(flushed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Access source tracking
// ═══════════════════════════════════════════════════════════

/// Who made a request, for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessSource {
    Anonymous,
    /// Signed-in user, by composite identity key.
    User { identity_key: String },
}

impl std::fmt::Display for AccessSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User { identity_key } => f.write_str(identity_key),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// In-memory audit log buffer. Entries are flushed to SQLite
/// when the buffer reaches capacity or on explicit flush.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source: AccessSource,
    pub action: String,
    pub entity: String,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Log an access event to the in-memory buffer.
    /// Returns `true` if the buffer has reached flush threshold.
    pub fn log(&self, source: AccessSource, action: &str, entity: &str) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditEntry {
                timestamp: chrono::Utc::now(),
                source,
                action: action.to_string(),
                entity: entity.to_string(),
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    /// Write buffered entries to the `audit_log` table.
    ///
    /// Timestamps use SQLite's `datetime()` layout so retention queries
    /// compare correctly.
    pub fn flush_to_db(&self, conn: &rusqlite::Connection) -> Result<usize, CoreError> {
        let entries = self.drain();
        if entries.is_empty() {
            return Ok(0);
        }

        let tuples: Vec<(String, String, String, String)> = entries
            .iter()
            .map(|e| {
                (
                    e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    e.source.to_string(),
                    e.action.clone(),
                    e.entity.clone(),
                )
            })
            .collect();

        let count = tuples.len();
        db::repository::insert_audit_entries(conn, &tuples)?;

        tracing::debug!(count, "Flushed audit entries to database");
        Ok(count)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
