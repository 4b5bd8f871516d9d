//! Process-level settings resolved from the environment.
//!
//! # Responsibility
//! - Resolve the database path and logging options once per process.
//! - Keep library entry points (`open_db`, `init_logging`) argument-driven;
//!   only hosts such as the CLI probe read the environment.
//!
//! # Invariants
//! - Values are read once and cached; later environment changes are ignored.
//! - Blank variables are treated as unset.

use crate::logging::default_log_level;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "USER_SERVICE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "USER_SERVICE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "USER_SERVICE_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "user_service.sqlite3";

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Resolved process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Log level passed to `init_logging`.
    pub log_level: String,
    /// Log directory; logging stays disabled when `None`.
    pub log_dir: Option<String>,
}

impl Settings {
    /// Builds settings from a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV),
        }
    }
}

/// Returns settings resolved from the process environment.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| Settings::from_lookup(|name| std::env::var(name).ok()))
}

#[cfg(test)]
mod tests {
    use super::{Settings, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let settings = Settings::from_lookup(lookup_from(&[]));
        assert_eq!(
            settings.db_path,
            std::env::temp_dir().join("user_service.sqlite3")
        );
        assert_eq!(settings.log_level, default_log_level());
        assert_eq!(settings.log_dir, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /var/lib/users.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/users"),
        ]));
        assert_eq!(settings.db_path, PathBuf::from("/var/lib/users.db"));
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.log_dir.as_deref(), Some("/var/log/users"));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let settings = Settings::from_lookup(lookup_from(&[(LOG_DIR_ENV, "   ")]));
        assert_eq!(settings.log_dir, None);
    }
}
