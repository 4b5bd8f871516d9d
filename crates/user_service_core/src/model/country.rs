//! Country domain model.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes.
//! - `title` is required, at most 64 characters, and globally unique.

use crate::model::validation::{check_required, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated country identifier.
pub type CountryId = i64;

pub const COUNTRY_TITLE_MAX_CHARS: usize = 64;

/// Persisted country record.
///
/// Residents are not carried here; see `CountryRepository::list_residents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub title: String,
}

/// Checks a country title against column constraints.
pub fn validate_country_title(title: &str) -> Result<(), ValidationError> {
    check_required("title", title, COUNTRY_TITLE_MAX_CHARS)
}
