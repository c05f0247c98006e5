//! Session middleware guarding the authenticated routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sesam_core::error::SesamError;
use sesam_core::models::user::UserId;
use sesam_core::store::{SessionStore, UserStore};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated request context, injected into request extensions
/// for handlers behind the session guard.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub token: String,
}

/// Pull the session token out of an `Authorization` header value of
/// the form `session <token>`.
fn extract_token(header: &str) -> Option<&str> {
    let (_, rest) = header.split_once("session")?;
    let token = rest.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Require a live session. No token at all is a 403; a token that
/// does not resolve, or whose owner is gone from the directory, is
/// a 401.
pub async fn require_session<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = {
        let header = request
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        match header.and_then(extract_token) {
            Some(token) => token.to_string(),
            None => return Err(ApiError::MissingToken),
        }
    };

    let Some(session) = state.auth.current_session(&token).await? else {
        debug!("session token did not resolve");
        return Err(ApiError::Unauthorized);
    };
    let Some(user_id) = session.owner_id() else {
        debug!("session has no recorded owner");
        return Err(ApiError::Unauthorized);
    };
    match state.auth.get_user(user_id).await {
        Ok(_) => {}
        Err(SesamError::NotFound { .. }) => {
            debug!(user_id, "session owner is gone from the directory");
            return Err(ApiError::Unauthorized);
        }
        Err(err) => return Err(err.into()),
    }

    request
        .extensions_mut()
        .insert(AuthContext { user_id, token });
    Ok(next.run(request).await)
}
