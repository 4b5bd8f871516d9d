//! Field constraint checks shared by model write requests.
//!
//! Lengths are counted in Unicode scalar values, matching SQLite `length()`
//! on TEXT columns.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Constraint failure detected before any SQL runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace-only.
    Blank { field: &'static str },
    /// Text field exceeds its column limit.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// `updated_at` precedes `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{field} is required"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} exceeds {max} characters (got {actual})")
            }
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn check_required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    check_length(field, value, max)
}

pub(crate) fn check_optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_length(field, value, max),
        None => Ok(()),
    }
}

/// Maps empty or whitespace-only optional text to `None`.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}
