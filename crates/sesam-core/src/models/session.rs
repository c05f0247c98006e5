//! Session domain model.
//!
//! A session lives in the key-value store under the key
//! `"<type>:<token>"` and is serialized as
//! `{"id", "type", "expiredAt", "info", "user"}`. That layout is part
//! of the store contract; the serde attributes below pin it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::user::{User, UserId};

/// Sessions are created with this lifetime, and every explicit
/// renewal resets to it.
pub const SESSION_TTL_HOURS: i64 = 48;

/// Key in the session info bag carrying the owning user's id.
pub const INFO_USER_ID: &str = "UserID";

/// Session discriminator. Only login sessions exist today; the
/// discriminator is part of the store key, so adding a kind never
/// collides with existing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Login,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Login => "login",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active login session.
///
/// The token doubles as the store key; the embedded [`User`] is a
/// snapshot taken at creation or last sync, never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque random token identifying this session.
    #[serde(rename = "id")]
    pub token: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    #[serde(rename = "expiredAt")]
    pub expires_at: DateTime<Utc>,
    /// Free-form attribute bag. Carries at minimum the owning user's
    /// id under [`INFO_USER_ID`].
    #[serde(default)]
    pub info: Map<String, Value>,
    /// Cached copy of the owning user. May be absent on malformed or
    /// hand-written records.
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// The owning user's id: read from the info bag, falling back to
    /// the embedded snapshot.
    pub fn owner_id(&self) -> Option<UserId> {
        self.info
            .get(INFO_USER_ID)
            .and_then(Value::as_i64)
            .or_else(|| self.user.as_ref().map(|u| u.id))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// First characters of a token, for diagnostics. Full tokens are
/// credentials and must never be logged.
pub fn token_preview(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
