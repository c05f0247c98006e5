//! Request handlers and their wire types.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use sesam_auth::{NewUserInput, UserUpdate};
use sesam_core::models::session::Session;
use sesam_core::models::user::{User, UserId};
use sesam_core::store::{ListUsersParams, SessionStore, UserStore};

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<ListUsersQuery> for ListUsersParams {
    fn from(query: ListUsersQuery) -> Self {
        ListUsersParams {
            page: query.page,
            limit: query.limit,
            search: query.search,
            email: query.email,
            name: query.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub async fn login<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let out = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token: out.token,
        session: out.session,
    }))
}

pub async fn logout<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Session>, ApiError> {
    match state.auth.current_session(&auth.token).await? {
        Some(session) => Ok(Json(session)),
        None => Err(ApiError::Unauthorized),
    }
}

pub async fn extend_session<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Session>, ApiError> {
    match state.auth.extend_session(&auth.token).await? {
        Some(session) => Ok(Json(session)),
        // The session ran out between the guard and the renewal.
        None => Err(ApiError::Unauthorized),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn create_user<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .auth
        .create_user(
            auth.user_id,
            NewUserInput {
                name: req.name,
                email: req.email,
                address: req.address,
                password: req.password,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.auth.list_users(query.into()).await?))
}

pub async fn get_user<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.get_user(id).await?))
}

pub async fn update_user<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .auth
        .update_user(
            auth.user_id,
            id,
            UserUpdate {
                name: req.name,
                email: req.email,
                address: req.address,
            },
        )
        .await?;
    Ok(Json(user))
}

pub async fn delete_user<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    state.auth.delete_user(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password<U: UserStore, S: SessionStore>(
    State(state): State<AppState<U, S>>,
    Path(id): Path<UserId>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth
        .change_password(id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
