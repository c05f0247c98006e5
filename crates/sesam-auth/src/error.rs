//! Authentication error types.

use sesam_core::error::SesamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for SesamError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => SesamError::InvalidCredentials,
            AuthError::Crypto(msg) => SesamError::CryptoFailure(msg),
        }
    }
}
