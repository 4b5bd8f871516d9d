//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `user_service_core` linkage and database bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use user_service_core::config::settings;
use user_service_core::db::migrations::current_user_version;
use user_service_core::db::open_db;
use user_service_core::{init_logging, CountryRepository, SqliteCountryRepository};

fn main() -> ExitCode {
    let settings = settings();
    if let Some(log_dir) = settings.log_dir.as_deref() {
        if let Err(err) = init_logging(&settings.log_level, log_dir) {
            eprintln!("user_service logging disabled: {err}");
        }
    }

    println!("user_service_core version={}", user_service_core::core_version());
    println!("db_path={}", settings.db_path.display());

    match probe(&settings.db_path) {
        Ok((schema_version, country_count)) => {
            println!("schema_version={schema_version}");
            println!("countries={country_count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn probe(path: &std::path::Path) -> Result<(u32, usize), Box<dyn std::error::Error>> {
    let conn = open_db(path)?;
    let schema_version = current_user_version(&conn)?;
    let countries = SqliteCountryRepository::try_new(&conn)?.list_countries()?;
    Ok((schema_version, countries.len()))
}
