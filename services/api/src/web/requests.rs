//! services/api/src/web/requests.rs
//!
//! Axum handlers for the request board.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::extract::{page, sharer_user_id};
use crate::web::items::ItemResponse;
use crate::web::state::AppState;
use lendhub_core::domain::{ItemView, NewRequest, RequestView};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", get(get_own_requests).post(create_request))
        .route("/requests/all", get(get_other_requests))
        .route("/requests/{id}", get(get_request))
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct RequestResponse {
    pub id: i64,
    pub description: String,
    pub created: DateTime<Utc>,
    /// Catalog items listed in answer to this request, possibly empty.
    pub items: Vec<ItemResponse>,
}

impl From<RequestView> for RequestResponse {
    fn from(view: RequestView) -> Self {
        Self {
            id: view.request.id,
            description: view.request.description,
            created: view.request.created,
            items: view
                .items
                .into_iter()
                .map(|item| ItemView::bare(item).into())
                .collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRequestPayload {
    pub description: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub from: Option<i64>,
    pub size: Option<i64>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Ask for an item nobody has listed yet.
#[utoipa::path(
    post,
    path = "/requests",
    params(("X-Sharer-User-Id" = i64, Header, description = "Acting user id")),
    request_body = CreateRequestPayload,
    responses(
        (status = 200, body = RequestResponse),
        (status = 404, description = "Unknown user")
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<Json<RequestResponse>, ApiError> {
    let user_id = sharer_user_id(&headers)?;
    let view = state
        .requests
        .create(
            user_id,
            NewRequest {
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(view.into()))
}

/// The caller's own requests, newest first, with fulfilling items.
#[utoipa::path(
    get,
    path = "/requests",
    params(("X-Sharer-User-Id" = i64, Header, description = "Acting user id")),
    responses((status = 200, body = [RequestResponse])),
    tag = "requests"
)]
pub async fn get_own_requests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let user_id = sharer_user_id(&headers)?;
    let views = state.requests.get_own(user_id).await?;
    Ok(Json(views.into_iter().map(RequestResponse::from).collect()))
}

/// Other users' requests, newest first.
#[utoipa::path(
    get,
    path = "/requests/all",
    params(
        ("from" = Option<i64>, Query, description = "Offset into the listing"),
        ("size" = Option<i64>, Query, description = "Page length"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses((status = 200, body = [RequestResponse])),
    tag = "requests"
)]
pub async fn get_other_requests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let user_id = sharer_user_id(&headers)?;
    let page = page(query.from, query.size)?;
    let views = state.requests.get_others(user_id, page).await?;
    Ok(Json(views.into_iter().map(RequestResponse::from).collect()))
}

/// One request with its fulfilling items.
#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(
        ("id" = i64, Path, description = "Request id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, body = RequestResponse),
        (status = 404, description = "No such request")
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<RequestResponse>, ApiError> {
    let user_id = sharer_user_id(&headers)?;
    let view = state.requests.get_by_id(id, user_id).await?;
    Ok(Json(view.into()))
}
