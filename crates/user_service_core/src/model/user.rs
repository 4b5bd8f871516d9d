//! User domain model.
//!
//! # Responsibility
//! - Define the persisted `User` record.
//! - Define write requests: `NewUser` for creation, `UserChanges` for
//!   partial updates.
//!
//! # Invariants
//! - `username` and `email` are required and unique.
//! - `phone` and `telegram_id` are unique only when present; blank values are
//!   stored as absent.
//! - `created_at <= updated_at`, both in Unix epoch milliseconds.
//! - `active = false` is the soft-delete tombstone.

use crate::model::country::CountryId;
use crate::model::validation::{blank_to_none, check_optional, check_required, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated user identifier.
pub type UserId = i64;

pub const USERNAME_MAX_CHARS: usize = 64;
pub const EMAIL_MAX_CHARS: usize = 64;
pub const PHONE_MAX_CHARS: usize = 32;
pub const TELEGRAM_ID_MAX_CHARS: usize = 32;
pub const PASSWORD_MAX_CHARS: usize = 128;
pub const ABOUT_ME_MAX_CHARS: usize = 4096;
pub const CITY_MAX_CHARS: usize = 64;

/// Persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub telegram_id: Option<String>,
    /// Stored representation supplied by the caller; hashing happens upstream.
    pub password: String,
    pub active: bool,
    pub about_me: Option<String>,
    pub country_id: CountryId,
    pub city: Option<String>,
    pub experience: Option<i32>,
    /// Unix epoch milliseconds. Never rewritten after creation.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed on every mutation.
    pub updated_at: i64,
}

impl User {
    /// Checks every field constraint plus timestamp ordering.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_profile(ProfileFields {
            username: &self.username,
            email: &self.email,
            password: &self.password,
            phone: self.phone.as_deref(),
            telegram_id: self.telegram_id.as_deref(),
            about_me: self.about_me.as_deref(),
            city: self.city.as_deref(),
        })?;

        if self.updated_at < self.created_at {
            return Err(ValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Marks this user as inactive (soft delete).
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Clears the soft-delete marker.
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Creation request for a user.
///
/// `active` is not part of the request: new users always start active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country_id: CountryId,
    pub phone: Option<String>,
    pub telegram_id: Option<String>,
    pub about_me: Option<String>,
    pub city: Option<String>,
    pub experience: Option<i32>,
}

impl NewUser {
    /// Creates a request holding only the mandatory fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        country_id: CountryId,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            country_id,
            phone: None,
            telegram_id: None,
            about_me: None,
            city: None,
            experience: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_telegram_id(mut self, telegram_id: impl Into<String>) -> Self {
        self.telegram_id = Some(telegram_id.into());
        self
    }

    pub fn with_about_me(mut self, about_me: impl Into<String>) -> Self {
        self.about_me = Some(about_me.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_experience(mut self, experience: i32) -> Self {
        self.experience = Some(experience);
        self
    }

    /// Returns a copy with blank optional text fields mapped to `None`.
    pub fn normalized(&self) -> Self {
        Self {
            phone: blank_to_none(self.phone.clone()),
            telegram_id: blank_to_none(self.telegram_id.clone()),
            about_me: blank_to_none(self.about_me.clone()),
            city: blank_to_none(self.city.clone()),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_profile(ProfileFields {
            username: &self.username,
            email: &self.email,
            password: &self.password,
            phone: self.phone.as_deref(),
            telegram_id: self.telegram_id.as_deref(),
            about_me: self.about_me.as_deref(),
            city: self.city.as_deref(),
        })
    }

    /// Materializes the record the store will hold once `id` is assigned.
    pub fn into_user(self, id: UserId, now_ms: i64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            phone: self.phone,
            telegram_id: self.telegram_id,
            password: self.password,
            active: true,
            about_me: self.about_me,
            country_id: self.country_id,
            city: self.city,
            experience: self.experience,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Partial update for a user.
///
/// `None` leaves a field untouched. For nullable columns the inner `Option`
/// is the new value, so `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub country_id: Option<CountryId>,
    pub phone: Option<Option<String>>,
    pub telegram_id: Option<Option<String>>,
    pub about_me: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub experience: Option<Option<i32>>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the change set in place. Timestamps are left to the caller.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        match self.active {
            Some(true) => user.activate(),
            Some(false) => user.deactivate(),
            None => {}
        }
        if let Some(country_id) = self.country_id {
            user.country_id = country_id;
        }
        if let Some(phone) = &self.phone {
            user.phone = blank_to_none(phone.clone());
        }
        if let Some(telegram_id) = &self.telegram_id {
            user.telegram_id = blank_to_none(telegram_id.clone());
        }
        if let Some(about_me) = &self.about_me {
            user.about_me = blank_to_none(about_me.clone());
        }
        if let Some(city) = &self.city {
            user.city = blank_to_none(city.clone());
        }
        if let Some(experience) = self.experience {
            user.experience = experience;
        }
    }
}

struct ProfileFields<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    phone: Option<&'a str>,
    telegram_id: Option<&'a str>,
    about_me: Option<&'a str>,
    city: Option<&'a str>,
}

fn validate_profile(fields: ProfileFields<'_>) -> Result<(), ValidationError> {
    check_required("username", fields.username, USERNAME_MAX_CHARS)?;
    check_required("email", fields.email, EMAIL_MAX_CHARS)?;
    check_required("password", fields.password, PASSWORD_MAX_CHARS)?;
    check_optional("phone", fields.phone, PHONE_MAX_CHARS)?;
    check_optional("telegram_id", fields.telegram_id, TELEGRAM_ID_MAX_CHARS)?;
    check_optional("about_me", fields.about_me, ABOUT_ME_MAX_CHARS)?;
    check_optional("city", fields.city, CITY_MAX_CHARS)?;
    Ok(())
}
