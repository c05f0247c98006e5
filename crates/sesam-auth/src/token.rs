//! Opaque session token generation.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Random bytes behind each session token.
const TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random opaque session token
/// (32 bytes, hex-encoded). Tokens carry no embedded claims; the
/// session store is the single source of truth for what they mean.
///
/// Fails only if the operating system's entropy source does.
pub fn generate_session_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Crypto(format!("entropy source failed: {e}")))?;
    Ok(hex::encode(bytes))
}
