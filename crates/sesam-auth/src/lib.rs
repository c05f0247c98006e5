//! Sesam Auth: credential verification, session policy, and the auth
//! orchestrator.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginOutput, NewUserInput, UserUpdate};
pub use session::SessionService;
