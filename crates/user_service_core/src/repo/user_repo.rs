//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/lookup APIs over the `users` table.
//! - Own the `user_followers` join table (follow / unfollow) and derive the
//!   `followees` / `followers` views from it.
//!
//! # Invariants
//! - Uniqueness of `username`, `email`, `phone`, `telegram_id` is enforced by
//!   SQLite UNIQUE indexes, so concurrent writers cannot both succeed.
//! - `country_id` is checked inside the write transaction; an unknown
//!   country aborts the write with `RepoError::Reference`.
//! - `created_at` is written once; `updated_at` never moves backwards.
//! - A `user_followers` row `(a, b)` means "a follows b"; `a != b`.

use crate::model::user::{NewUser, User, UserChanges, UserId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, row_exists, ConstraintViolation,
    RecordKey, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};

/// Select list for `users` aliased as `u`.
pub(crate) const USER_COLUMNS: &str = "u.id AS id,
    u.username AS username,
    u.email AS email,
    u.phone AS phone,
    u.telegram_id AS telegram_id,
    u.password AS password,
    u.active AS active,
    u.about_me AS about_me,
    u.country_id AS country_id,
    u.city AS city,
    u.experience AS experience,
    u.created_at AS created_at,
    u.updated_at AS updated_at";

const USER_TABLE_COLUMNS: &[&str] = &[
    "id",
    "username",
    "email",
    "phone",
    "telegram_id",
    "password",
    "active",
    "about_me",
    "country_id",
    "city",
    "experience",
    "created_at",
    "updated_at",
];

const FOLLOW_TABLE_COLUMNS: &[&str] = &["follower_id", "followee_id"];

/// Repository interface for user records and follow edges.
pub trait UserRepository {
    /// Inserts a user stamped with `now_ms` for both timestamps.
    fn create_user(&self, user: &NewUser, now_ms: i64) -> RepoResult<User>;
    /// Applies a partial change set; `updated_at` becomes `max(previous, now_ms)`.
    fn update_user(&self, id: UserId, changes: &UserChanges, now_ms: i64) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Users that `id` follows, ordered by user id.
    fn list_followees(&self, id: UserId) -> RepoResult<Vec<User>>;
    /// Users following `id`, ordered by user id.
    fn list_followers(&self, id: UserId) -> RepoResult<Vec<User>>;
    /// Records "follower follows followee". Returns `false` when the edge
    /// already existed.
    fn follow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool>;
    /// Removes the edge. Returns `false` when there was nothing to remove.
    fn unfollow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("users", USER_TABLE_COLUMNS),
                ("user_followers", FOLLOW_TABLE_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser, now_ms: i64) -> RepoResult<User> {
        let user = user.normalized();
        user.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_country_exists(&tx, user.country_id)?;

        tx.execute(
            "INSERT INTO users (
                username,
                email,
                phone,
                telegram_id,
                password,
                active,
                about_me,
                country_id,
                city,
                experience,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9, ?10, ?10);",
            params![
                user.username.as_str(),
                user.email.as_str(),
                user.phone.as_deref(),
                user.telegram_id.as_deref(),
                user.password.as_str(),
                user.about_me.as_deref(),
                user.country_id,
                user.city.as_deref(),
                user.experience,
                now_ms,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(user.into_user(id, now_ms))
    }

    fn update_user(&self, id: UserId, changes: &UserChanges, now_ms: i64) -> RepoResult<User> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut user = load_user_where(&tx, "u.id = ?1", [id])?
            .ok_or(RepoError::NotFound(RecordKey::UserId(id)))?;

        changes.apply_to(&mut user);
        user.updated_at = user.updated_at.max(now_ms);
        user.validate()?;
        if changes.country_id.is_some() {
            ensure_country_exists(&tx, user.country_id)?;
        }

        tx.execute(
            "UPDATE users
             SET
                username = ?2,
                email = ?3,
                phone = ?4,
                telegram_id = ?5,
                password = ?6,
                active = ?7,
                about_me = ?8,
                country_id = ?9,
                city = ?10,
                experience = ?11,
                updated_at = ?12
             WHERE id = ?1;",
            params![
                id,
                user.username.as_str(),
                user.email.as_str(),
                user.phone.as_deref(),
                user.telegram_id.as_deref(),
                user.password.as_str(),
                bool_to_int(user.active),
                user.about_me.as_deref(),
                user.country_id,
                user.city.as_deref(),
                user.experience,
                user.updated_at,
            ],
        )?;
        let updated = load_required_user(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user_where(self.conn, "u.id = ?1", [id])
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        load_user_where(self.conn, "u.username = ?1", [username])
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        load_user_where(self.conn, "u.email = ?1", [email])
    }

    fn list_followees(&self, id: UserId) -> RepoResult<Vec<User>> {
        ensure_user_found(self.conn, id)?;
        query_users(
            self.conn,
            &format!(
                "SELECT {USER_COLUMNS}
                 FROM user_followers f
                 INNER JOIN users u ON u.id = f.followee_id
                 WHERE f.follower_id = ?1
                 ORDER BY u.id ASC;"
            ),
            [id],
        )
    }

    fn list_followers(&self, id: UserId) -> RepoResult<Vec<User>> {
        ensure_user_found(self.conn, id)?;
        query_users(
            self.conn,
            &format!(
                "SELECT {USER_COLUMNS}
                 FROM user_followers f
                 INNER JOIN users u ON u.id = f.follower_id
                 WHERE f.followee_id = ?1
                 ORDER BY u.id ASC;"
            ),
            [id],
        )
    }

    fn follow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool> {
        if follower_id == followee_id {
            return Err(RepoError::Constraint(ConstraintViolation::SelfFollow(
                follower_id,
            )));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for id in [follower_id, followee_id] {
            if !row_exists(&tx, "users", id)? {
                return Err(RepoError::Reference { table: "users", id });
            }
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO user_followers (follower_id, followee_id)
             VALUES (?1, ?2);",
            params![follower_id, followee_id],
        )?;
        tx.commit()?;
        Ok(inserted == 1)
    }

    fn unfollow(&self, follower_id: UserId, followee_id: UserId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            "DELETE FROM user_followers
             WHERE follower_id = ?1
               AND followee_id = ?2;",
            params![follower_id, followee_id],
        )?;
        tx.commit()?;
        Ok(removed == 1)
    }
}

/// Runs a user query whose select list is `USER_COLUMNS`.
pub(crate) fn query_users(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }
    Ok(users)
}

fn load_user_where(
    conn: &Connection,
    predicate: &str,
    params: impl Params,
) -> RepoResult<Option<User>> {
    let mut users = query_users(
        conn,
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE {predicate} LIMIT 1;"),
        params,
    )?;
    Ok(users.pop())
}

fn load_required_user(conn: &Connection, id: UserId) -> RepoResult<User> {
    load_user_where(conn, "u.id = ?1", [id])?.ok_or_else(|| {
        RepoError::InvalidData(format!("user {id} missing in read-back after write"))
    })
}

fn ensure_user_found(conn: &Connection, id: UserId) -> RepoResult<()> {
    if !row_exists(conn, "users", id)? {
        return Err(RepoError::NotFound(RecordKey::UserId(id)));
    }
    Ok(())
}

fn ensure_country_exists(conn: &Connection, country_id: i64) -> RepoResult<()> {
    if !row_exists(conn, "country", country_id)? {
        return Err(RepoError::Reference {
            table: "country",
            id: country_id,
        });
    }
    Ok(())
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user = User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        telegram_id: row.get("telegram_id")?,
        password: row.get("password")?,
        active: int_to_bool(row.get("active")?, "users.active")?,
        about_me: row.get("about_me")?,
        country_id: row.get("country_id")?,
        city: row.get("city")?,
        experience: row.get("experience")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    user.validate().map_err(|err| {
        RepoError::InvalidData(format!("user {} failed validation: {err}", user.id))
    })?;
    Ok(user)
}
