//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Stamp write operations with the current time at the transaction
//!   boundary.
//! - Turn missing lookups into `RepoError::NotFound`.
//! - Emit metadata-only write events (ids, durations, error kinds).

use crate::repo::RepoResult;
use log::{info, warn};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub mod country_service;
pub mod user_service;

/// Current wall-clock time in Unix epoch milliseconds.
///
/// A clock set before 1970 yields `0`; the repository keeps `updated_at`
/// monotonic regardless.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Logs the outcome of one write operation.
///
/// Never logs field values; errors are reported through their kind label and
/// display text, which only carry table/column names and ids.
pub(crate) fn log_write<T>(
    event: &'static str,
    started_at: Instant,
    result: &RepoResult<T>,
    record_id: impl FnOnce(&T) -> i64,
) {
    match result {
        Ok(value) => info!(
            "event={} module=service status=ok id={} duration_ms={}",
            event,
            record_id(value),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=service status=error error_kind={} duration_ms={} error={}",
            event,
            err.kind_label(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
