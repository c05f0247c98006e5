//! Store-specific error types and conversions.

use sesam_core::error::SesamError;

/// Store-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("relational store error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("key-value store error: {0}")]
    Kv(#[from] redis::RedisError),

    #[error("stored value could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("session ttl is not positive ({ttl_ms} ms)")]
    InvalidExpiry { ttl_ms: i64 },

    #[error("record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl From<StoreError> for SesamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidExpiry { ttl_ms } => SesamError::InvalidExpiry { ttl_ms },
            StoreError::AlreadyExists { entity } => SesamError::AlreadyExists { entity },
            StoreError::Codec(e) => SesamError::Internal(format!("undecodable stored value: {e}")),
            other => SesamError::StoreUnavailable(other.to_string()),
        }
    }
}
