//! Country repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/rename/delete/lookup APIs over the `country` table.
//! - Derive the `residents` view from `users.country_id` on every call.
//!
//! # Invariants
//! - `title` uniqueness is enforced by a SQLite UNIQUE index.
//! - A country referenced by any user cannot be deleted.

use crate::model::country::{validate_country_title, Country, CountryId};
use crate::model::user::User;
use crate::repo::user_repo::{query_users, USER_COLUMNS};
use crate::repo::{
    ensure_connection_ready, row_exists, ConstraintViolation, RecordKey, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const COUNTRY_SELECT_SQL: &str = "SELECT id, title FROM country";
const COUNTRY_TABLE_COLUMNS: &[&str] = &["id", "title"];

/// Repository interface for country records.
pub trait CountryRepository {
    fn create_country(&self, title: &str) -> RepoResult<Country>;
    fn get_country(&self, id: CountryId) -> RepoResult<Option<Country>>;
    fn get_country_by_title(&self, title: &str) -> RepoResult<Option<Country>>;
    /// Lists all countries ordered by title.
    fn list_countries(&self) -> RepoResult<Vec<Country>>;
    /// Corrects the title of an existing country.
    fn rename_country(&self, id: CountryId, title: &str) -> RepoResult<Country>;
    /// Deletes a country that no user references.
    fn delete_country(&self, id: CountryId) -> RepoResult<()>;
    /// Users whose `country_id` is `id`, ordered by user id.
    fn list_residents(&self, id: CountryId) -> RepoResult<Vec<User>>;
}

/// SQLite-backed country repository.
pub struct SqliteCountryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCountryRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("country", COUNTRY_TABLE_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl CountryRepository for SqliteCountryRepository<'_> {
    fn create_country(&self, title: &str) -> RepoResult<Country> {
        validate_country_title(title)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("INSERT INTO country (title) VALUES (?1);", [title])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Country {
            id,
            title: title.to_string(),
        })
    }

    fn get_country(&self, id: CountryId) -> RepoResult<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!("{COUNTRY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_country_row,
            )
            .optional()?;
        Ok(country)
    }

    fn get_country_by_title(&self, title: &str) -> RepoResult<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!("{COUNTRY_SELECT_SQL} WHERE title = ?1;"),
                [title],
                parse_country_row,
            )
            .optional()?;
        Ok(country)
    }

    fn list_countries(&self) -> RepoResult<Vec<Country>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COUNTRY_SELECT_SQL} ORDER BY title ASC, id ASC;"))?;
        let countries = stmt
            .query_map([], parse_country_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(countries)
    }

    fn rename_country(&self, id: CountryId, title: &str) -> RepoResult<Country> {
        validate_country_title(title)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE country SET title = ?2 WHERE id = ?1;",
            params![id, title],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordKey::CountryId(id)));
        }
        tx.commit()?;

        Ok(Country {
            id,
            title: title.to_string(),
        })
    }

    fn delete_country(&self, id: CountryId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "country", id)? {
            return Err(RepoError::NotFound(RecordKey::CountryId(id)));
        }

        let referenced: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE country_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if referenced == 1 {
            return Err(RepoError::Constraint(ConstraintViolation::Restricted {
                table: "country",
                id,
                referenced_by: "users.country_id",
            }));
        }

        tx.execute("DELETE FROM country WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(())
    }

    fn list_residents(&self, id: CountryId) -> RepoResult<Vec<User>> {
        if !row_exists(self.conn, "country", id)? {
            return Err(RepoError::NotFound(RecordKey::CountryId(id)));
        }

        query_users(
            self.conn,
            &format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 WHERE u.country_id = ?1
                 ORDER BY u.id ASC;"
            ),
            [id],
        )
    }
}

fn parse_country_row(row: &Row<'_>) -> rusqlite::Result<Country> {
    Ok(Country {
        id: row.get("id")?,
        title: row.get("title")?,
    })
}
