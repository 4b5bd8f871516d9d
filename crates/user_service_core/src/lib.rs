//! Core data model and persistence for the user-management service.
//! This crate is the single source of truth for `Country`/`User` invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::country::{Country, CountryId};
pub use model::user::{NewUser, User, UserChanges, UserId};
pub use model::validation::ValidationError;
pub use repo::country_repo::{CountryRepository, SqliteCountryRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{ConstraintViolation, RecordKey, RepoError, RepoResult};
pub use service::country_service::CountryService;
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
