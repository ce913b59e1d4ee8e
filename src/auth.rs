//! Credential checks across the admin, doctor and patient tables.
//!
//! A login is looked up in role priority order (admin, doctor, patient);
//! the first table that knows it decides the outcome. Callers only ever
//! see "authenticated" or "not authenticated".

use std::str::FromStr;

use rusqlite::Connection;
use serde::Serialize;

use crate::crypto;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::Role;

/// A signed-in user: role plus the row id in that role's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub role: Role,
    pub id: i64,
    pub login: String,
}

impl Identity {
    /// Composite `<role>_<id>` key stored in the session.
    pub fn key(&self) -> String {
        format!("{}_{}", self.role.as_str(), self.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Split a composite identity key into role and id.
pub fn parse_identity_key(key: &str) -> Option<(Role, i64)> {
    let (role, id) = key.split_once('_')?;
    let role = Role::from_str(role).ok()?;
    let id = id.parse::<i64>().ok().filter(|id| *id > 0)?;
    Some((role, id))
}

/// Verify `login` / `password`.
///
/// Returns `Ok(None)` for an unknown login, a wrong password or an
/// unreadable stored hash alike.
pub fn authenticate(
    conn: &Connection,
    login: &str,
    password: &str,
) -> Result<Option<Identity>, AuthError> {
    let login = login.trim();
    if login.is_empty() || password.is_empty() {
        return Ok(None);
    }

    for role in Role::ALL {
        let Some(stored) = repository::find_credentials(conn, role, login)? else {
            continue;
        };

        return match crypto::verify_password(password, &stored.password_hash) {
            Ok(true) => {
                tracing::info!(role = %role, id = stored.id, "Login succeeded");
                Ok(Some(Identity {
                    role,
                    id: stored.id,
                    login: stored.login,
                }))
            }
            Ok(false) => {
                tracing::info!(role = %role, id = stored.id, "Login rejected: password mismatch");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(role = %role, id = stored.id, error = %e, "Login rejected: stored hash unreadable");
                Ok(None)
            }
        };
    }

    tracing::info!("Login rejected: unknown login");
    Ok(None)
}

/// Resolve a composite identity key back to a live identity.
///
/// A malformed key, or one naming a row that no longer exists, yields `None`.
pub fn load_identity(conn: &Connection, key: &str) -> Result<Option<Identity>, AuthError> {
    let Some((role, id)) = parse_identity_key(key) else {
        return Ok(None);
    };
    let login = repository::find_login_by_id(conn, role, id)?;
    Ok(login.map(|login| Identity { role, id, login }))
}
