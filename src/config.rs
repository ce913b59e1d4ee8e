use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Records";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;
pub const DEFAULT_DB_CONNECT_RETRIES: u32 = 30;
pub const DEFAULT_DB_RETRY_INTERVAL_SECS: u64 = 2;

/// Schema initialisation attempts at startup.
pub const SCHEMA_INIT_ATTEMPTS: u32 = 5;

/// Audit rows older than this are pruned on flush.
pub const AUDIT_RETENTION_DAYS: i64 = 90;

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinic_lib=info,clinic_records=info,tower_http=info"
}

/// Get the application data directory
/// `<platform data dir>/clinic`, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clinic")
}

pub fn default_database_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub seed_demo_data: bool,
    pub db_connect_retries: u32,
    pub db_retry_interval: Duration,
    pub cookie_secure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            seed_demo_data: true,
            db_connect_retries: DEFAULT_DB_CONNECT_RETRIES,
            db_retry_interval: Duration::from_secs(DEFAULT_DB_RETRY_INTERVAL_SECS),
            cookie_secure: false,
        }
    }
}

impl ServerConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(path = %path.display(), "Loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            database_path: get("CLINIC_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            bind_addr: parse_or("CLINIC_BIND_ADDR", get("CLINIC_BIND_ADDR"), defaults.bind_addr),
            session_ttl: Duration::from_secs(parse_or(
                "CLINIC_SESSION_TTL_SECS",
                get("CLINIC_SESSION_TTL_SECS"),
                DEFAULT_SESSION_TTL_SECS,
            )),
            seed_demo_data: parse_flag("CLINIC_SEED_DEMO_DATA", get("CLINIC_SEED_DEMO_DATA"), defaults.seed_demo_data),
            db_connect_retries: parse_or(
                "CLINIC_DB_CONNECT_RETRIES",
                get("CLINIC_DB_CONNECT_RETRIES"),
                DEFAULT_DB_CONNECT_RETRIES,
            ),
            db_retry_interval: Duration::from_secs(parse_or(
                "CLINIC_DB_RETRY_INTERVAL_SECS",
                get("CLINIC_DB_RETRY_INTERVAL_SECS"),
                DEFAULT_DB_RETRY_INTERVAL_SECS,
            )),
            cookie_secure: parse_flag("CLINIC_COOKIE_SECURE", get("CLINIC_COOKIE_SECURE"), defaults.cookie_secure),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid setting, using default");
            default
        }),
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            tracing::warn!(key, value = other, "Invalid flag, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.session_ttl, Duration::from_secs(28_800));
        assert!(config.seed_demo_data);
        assert!(!config.cookie_secure);
        assert_eq!(config.db_connect_retries, 30);
        assert_eq!(config.db_retry_interval, Duration::from_secs(2));
        assert!(config.database_path.ends_with("clinic/clinic.db"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("CLINIC_DATABASE_PATH", "/var/lib/clinic/test.db"),
            ("CLINIC_BIND_ADDR", "127.0.0.1:8080"),
            ("CLINIC_SESSION_TTL_SECS", "60"),
            ("CLINIC_SEED_DEMO_DATA", "false"),
            ("CLINIC_COOKIE_SECURE", "YES"),
            ("CLINIC_DB_CONNECT_RETRIES", "3"),
        ]);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/clinic/test.db"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert!(!config.seed_demo_data);
        assert!(config.cookie_secure);
        assert_eq!(config.db_connect_retries, 3);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("CLINIC_BIND_ADDR", "not-an-address"),
            ("CLINIC_SESSION_TTL_SECS", "-5"),
            ("CLINIC_SEED_DEMO_DATA", "maybe"),
            ("CLINIC_DATABASE_PATH", "   "),
        ]);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert!(config.seed_demo_data);
        assert_eq!(config.database_path, default_database_path());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(APP_NAME, "Clinic Records");
    }

    #[test]
    fn log_filter_names_this_crate() {
        assert!(default_log_filter().contains("clinic_lib=info"));
    }
}
