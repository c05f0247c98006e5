//! Error types for the sesam system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SesamError {
    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Unknown email and wrong password collapse into this one
    /// variant so callers cannot tell which emails exist.
    #[error("email or password is wrong")]
    InvalidCredentials,

    #[error("cryptography error: {0}")]
    CryptoFailure(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A session write was attempted with a non-positive time to live.
    #[error("session ttl is not positive ({ttl_ms} ms)")]
    InvalidExpiry { ttl_ms: i64 },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SesamResult<T> = Result<T, SesamError>;
