//! User use-case service.
//!
//! # Responsibility
//! - Provide create/update/lookup entry points for user profiles.
//! - Capture `now` once per write and hand it to the repository transaction.
//! - Expose the follow graph (`follow`, `unfollow`, followee/follower views).
//!
//! # Invariants
//! - New users start active with `created_at == updated_at`.
//! - Deactivation is the only removal path (soft delete).

use crate::model::user::{NewUser, User, UserChanges, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::{RecordKey, RepoError, RepoResult};
use crate::service::{log_write, now_epoch_ms};
use log::{debug, info};
use std::time::Instant;

/// Use-case service wrapper for user operations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a user profile.
    ///
    /// # Contract
    /// - `active = true`, `created_at = updated_at = now`.
    /// - Unique collisions and field violations fail with
    ///   `RepoError::Constraint`; an unknown country fails with
    ///   `RepoError::Reference`. Nothing is persisted on failure.
    pub fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let started_at = Instant::now();
        let result = self.repo.create_user(user, now_epoch_ms());
        log_write("user_create", started_at, &result, |created| created.id);
        result
    }

    /// Applies a partial update and refreshes `updated_at`.
    ///
    /// Returns repository-level not-found, reference and constraint errors
    /// unchanged.
    /// An empty change set only refreshes `updated_at`.
    pub fn update_user(&self, id: UserId, changes: &UserChanges) -> RepoResult<User> {
        let started_at = Instant::now();
        if changes.is_empty() {
            debug!("event=user_update module=service status=touch id={id}");
        }
        let result = self.repo.update_user(id, changes, now_epoch_ms());
        log_write("user_update", started_at, &result, |updated| updated.id);
        result
    }

    /// Soft-deletes a user by clearing `active`.
    pub fn deactivate_user(&self, id: UserId) -> RepoResult<User> {
        self.update_user(
            id,
            &UserChanges {
                active: Some(false),
                ..UserChanges::default()
            },
        )
    }

    /// Restores a soft-deleted user.
    pub fn activate_user(&self, id: UserId) -> RepoResult<User> {
        self.update_user(
            id,
            &UserChanges {
                active: Some(true),
                ..UserChanges::default()
            },
        )
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<User> {
        self.repo
            .get_user(id)?
            .ok_or(RepoError::NotFound(RecordKey::UserId(id)))
    }

    pub fn get_user_by_username(&self, username: &str) -> RepoResult<User> {
        self.repo
            .get_user_by_username(username)?
            .ok_or_else(|| RepoError::NotFound(RecordKey::Username(username.to_string())))
    }

    pub fn get_user_by_email(&self, email: &str) -> RepoResult<User> {
        self.repo
            .get_user_by_email(email)?
            .ok_or_else(|| RepoError::NotFound(RecordKey::Email(email.to_string())))
    }

    /// Users that `id` follows.
    pub fn list_followees(&self, id: UserId) -> RepoResult<Vec<User>> {
        self.repo.list_followees(id)
    }

    /// Users that follow `id`.
    pub fn list_followers(&self, id: UserId) -> RepoResult<Vec<User>> {
        self.repo.list_followers(id)
    }

    /// Makes `user_id` follow `target_id`. Idempotent.
    ///
    /// Returns `true` when a new edge was recorded.
    pub fn follow(&self, user_id: UserId, target_id: UserId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.repo.follow(user_id, target_id);
        log_write("user_follow", started_at, &result, |_| user_id);
        if let Ok(false) = result {
            info!("event=user_follow module=service status=noop id={user_id} target_id={target_id}");
        }
        result
    }

    /// Removes the `user_id` → `target_id` edge. Idempotent.
    ///
    /// Returns `true` when an edge was removed.
    pub fn unfollow(&self, user_id: UserId, target_id: UserId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.repo.unfollow(user_id, target_id);
        log_write("user_unfollow", started_at, &result, |_| user_id);
        result
    }
}
