//! Route table.

use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use sesam_core::store::{SessionStore, UserStore};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::middleware::require_session;
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router. Only `/health` and the login
/// endpoint are reachable without a session.
pub fn router<U, S>(state: AppState<U, S>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
{
    let open = Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/auth/login", post(handlers::login::<U, S>));

    let authed = Router::new()
        .route("/v1/auth/logout", post(handlers::logout::<U, S>))
        .route("/v1/auth/session", get(handlers::current_session::<U, S>))
        .route("/v1/auth/extend", post(handlers::extend_session::<U, S>))
        .route(
            "/v1/users",
            post(handlers::create_user::<U, S>).get(handlers::list_users::<U, S>),
        )
        .route(
            "/v1/users/{id}",
            get(handlers::get_user::<U, S>)
                .put(handlers::update_user::<U, S>)
                .delete(handlers::delete_user::<U, S>),
        )
        .route(
            "/v1/users/{id}/password",
            post(handlers::change_password::<U, S>),
        )
        .route_layer(from_fn_with_state(state.clone(), require_session::<U, S>));

    open.merge(authed)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
