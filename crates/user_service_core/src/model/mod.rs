//! Domain model for the user-management store.
//!
//! # Responsibility
//! - Define the `Country` and `User` records and their write requests.
//! - Own field-level constraints (required, max length) shared by every
//!   write path.
//!
//! # Invariants
//! - Records are identified by store-generated integer ids.
//! - Inverse collections (`residents`, `followees`, `followers`) are never
//!   part of a record; repositories compute them on demand.
//! - Users are soft-deleted through `active`, never removed.

pub mod country;
pub mod user;
pub mod validation;
