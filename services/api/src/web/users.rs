//! services/api/src/web/users.rs
//!
//! Axum handlers for the user directory.

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use lendhub_core::domain::{NewUser, User, UserPatch};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Register a new user.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserPayload,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 409, description = "Email already in use")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .create(NewUser {
            name: payload.name,
            email: payload.email,
        })
        .await?;
    Ok(Json(user.into()))
}

/// List all users.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, body = [UserResponse])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Fetch one user by id.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "No such user")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user.into()))
}

/// Partially update a user's name and/or email.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already in use")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .update(
            id,
            UserPatch {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

/// Delete a user, returning the removed record.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "No such user")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.delete(id).await?;
    Ok(Json(user.into()))
}
