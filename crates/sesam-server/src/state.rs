//! Shared application state for handlers and middleware.

use std::sync::Arc;

use sesam_auth::AuthService;
use sesam_core::store::{SessionStore, UserStore};

pub struct AppState<U: UserStore, S: SessionStore> {
    pub auth: Arc<AuthService<U, S>>,
}

impl<U: UserStore, S: SessionStore> AppState<U, S> {
    pub fn new(auth: AuthService<U, S>) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }
}

// Manual impl: a derived Clone would demand U: Clone and S: Clone.
impl<U: UserStore, S: SessionStore> Clone for AppState<U, S> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}
