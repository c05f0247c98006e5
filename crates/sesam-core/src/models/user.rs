//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned numeric user id. Immutable for the life of the row.
pub type UserId = i64;

/// A user record as held by the relational store.
///
/// Rows are soft-deleted: `deleted_at`/`deleted_by` are set and the
/// row stays in place. Exactly one non-deleted user exists per email,
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    /// Argon2id digest in PHC string format. Never serialized
    /// outward; a deserialized copy carries an empty string here.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<UserId>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a new user. The id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub address: String,
    /// Already-hashed digest; raw passwords never reach the store.
    pub password_hash: String,
    pub created_by: UserId,
}

/// Canonical form of an email for lookups and uniqueness checks.
/// Stored emails keep their original casing; only probes are
/// normalized.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
