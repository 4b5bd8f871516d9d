//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service orchestration.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate model constraints before SQL mutations.
//! - Every write runs in one `IMMEDIATE` transaction.
//! - Repository APIs return semantic errors (`Constraint`, `Reference`,
//!   `NotFound`) in addition to DB transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use rusqlite::{ffi, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod country_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by country and user persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A uniqueness, field or integrity rule rejected the write.
    Constraint(ConstraintViolation),
    /// A foreign key target does not exist.
    Reference { table: &'static str, id: i64 },
    /// Lookup found no record.
    NotFound(RecordKey),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

/// Kinds of constraint violation reported as `RepoError::Constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Field-level rule (required, max length, timestamp order).
    Invalid(ValidationError),
    /// Value already taken by another row.
    Unique { table: String, column: String },
    /// A user attempted to follow itself.
    SelfFollow(UserId),
    /// Row is still referenced and deletion is restricted.
    Restricted {
        table: &'static str,
        id: i64,
        referenced_by: &'static str,
    },
}

/// Lookup key that produced `RepoError::NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    CountryId(i64),
    CountryTitle(String),
    UserId(UserId),
    Username(String),
    Email(String),
}

impl RepoError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    pub fn is_reference_error(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `(table, column)` when this is a unique-key collision.
    pub fn unique_violation(&self) -> Option<(&str, &str)> {
        match self {
            Self::Constraint(ConstraintViolation::Unique { table, column }) => {
                Some((table.as_str(), column.as_str()))
            }
            _ => None,
        }
    }

    /// Short stable label used in log lines.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Db(_) => "db",
            Self::Constraint(_) => "constraint_violation",
            Self::Reference { .. } => "reference_error",
            Self::NotFound(_) => "not_found",
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => "schema",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(violation) => write!(f, "constraint violation: {violation}"),
            Self::Reference { table, id } => {
                write!(f, "referenced {table} row does not exist: {id}")
            }
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Unique { table, column } => {
                write!(f, "{table}.{column} value is already taken")
            }
            Self::SelfFollow(id) => write!(f, "user {id} cannot follow itself"),
            Self::Restricted {
                table,
                id,
                referenced_by,
            } => write!(f, "{table} row {id} is still referenced by {referenced_by}"),
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountryId(id) => write!(f, "country id {id}"),
            Self::CountryTitle(title) => write!(f, "country title `{title}`"),
            Self::UserId(id) => write!(f, "user id {id}"),
            Self::Username(username) => write!(f, "username `{username}`"),
            Self::Email(email) => write!(f, "email `{email}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Constraint(ConstraintViolation::Invalid(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Constraint(ConstraintViolation::Invalid(value))
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let Some((table, column)) = unique_violation_target(&value) {
            return Self::Constraint(ConstraintViolation::Unique { table, column });
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Extracts `(table, columns)` from a SQLite unique/primary-key failure.
///
/// SQLite reports these as `UNIQUE constraint failed: users.email` or, for
/// composite keys, `UNIQUE constraint failed: t.a, t.b`.
fn unique_violation_target(err: &rusqlite::Error) -> Option<(String, String)> {
    let rusqlite::Error::SqliteFailure(failure, Some(message)) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    if failure.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE
        && failure.extended_code != ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    {
        return None;
    }
    parse_unique_message(message)
}

fn parse_unique_message(message: &str) -> Option<(String, String)> {
    let targets = message.split_once("constraint failed:")?.1;
    let mut table = None;
    let mut columns = Vec::new();
    for target in targets.split(',') {
        let (current_table, column) = target.trim().split_once('.')?;
        table.get_or_insert_with(|| current_table.to_string());
        columns.push(column);
    }
    Some((table?, columns.join(", ")))
}

/// Returns whether a row with the given integer `id` exists in `table`.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Verifies migration version plus the presence of tables and columns.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
