//! Authentication configuration.

/// Configuration for the authentication services.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification. Rotating it invalidates every stored digest.
    pub pepper: Option<String>,
}
