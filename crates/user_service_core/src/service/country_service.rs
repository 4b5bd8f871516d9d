//! Country use-case service.
//!
//! # Responsibility
//! - Provide stable country entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - `list_residents` is recomputed on every call; nothing is cached.

use crate::model::country::{Country, CountryId};
use crate::model::user::User;
use crate::repo::country_repo::CountryRepository;
use crate::repo::{RecordKey, RepoError, RepoResult};
use crate::service::log_write;
use std::time::Instant;

/// Use-case service wrapper for country operations.
pub struct CountryService<R: CountryRepository> {
    repo: R,
}

impl<R: CountryRepository> CountryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new country name.
    ///
    /// # Contract
    /// - Returns the stored record with its generated id.
    /// - Duplicate, blank or over-long titles fail with a constraint
    ///   violation.
    pub fn create_country(&self, title: &str) -> RepoResult<Country> {
        let started_at = Instant::now();
        let result = self.repo.create_country(title);
        log_write("country_create", started_at, &result, |country| country.id);
        result
    }

    /// Gets one country by id, failing with `NotFound` when absent.
    pub fn get_country(&self, id: CountryId) -> RepoResult<Country> {
        self.repo
            .get_country(id)?
            .ok_or(RepoError::NotFound(RecordKey::CountryId(id)))
    }

    /// Gets one country by exact title, failing with `NotFound` when absent.
    pub fn get_country_by_title(&self, title: &str) -> RepoResult<Country> {
        self.repo
            .get_country_by_title(title)?
            .ok_or_else(|| RepoError::NotFound(RecordKey::CountryTitle(title.to_string())))
    }

    pub fn list_countries(&self) -> RepoResult<Vec<Country>> {
        self.repo.list_countries()
    }

    /// Corrects a country title under the same rules as creation.
    pub fn rename_country(&self, id: CountryId, title: &str) -> RepoResult<Country> {
        let started_at = Instant::now();
        let result = self.repo.rename_country(id, title);
        log_write("country_rename", started_at, &result, |country| country.id);
        result
    }

    /// Deletes a country with no residents.
    pub fn delete_country(&self, id: CountryId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_country(id);
        log_write("country_delete", started_at, &result, |_| id);
        result
    }

    /// Lists users living in the country, active or not.
    pub fn list_residents(&self, id: CountryId) -> RepoResult<Vec<User>> {
        self.repo.list_residents(id)
    }
}
