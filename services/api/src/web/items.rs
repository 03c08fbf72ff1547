//! services/api/src/web/items.rs
//!
//! Axum handlers for the item catalog, including free-text search and
//! comments. The acting user comes from the `X-Sharer-User-Id` header.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::extract::{page, sharer_user_id};
use crate::web::state::AppState;
use lendhub_core::domain::{Comment, ItemPatch, ItemView, NewComment, NewItem, ShortBooking};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/search", get(search_items))
        .route(
            "/items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/{id}/comment", post(add_comment))
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortBookingResponse {
    pub id: i64,
    pub booker_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<ShortBooking> for ShortBookingResponse {
    fn from(booking: ShortBooking) -> Self {
        Self {
            id: booking.id,
            booker_id: booking.booker_id,
            start: booking.start,
            end: booking.end,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub author_name: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author_name: comment.author_name,
            created: comment.created,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub owner_id: i64,
    pub request_id: Option<i64>,
    pub last_booking: Option<ShortBookingResponse>,
    pub next_booking: Option<ShortBookingResponse>,
    pub comments: Vec<CommentResponse>,
}

impl From<ItemView> for ItemResponse {
    fn from(view: ItemView) -> Self {
        Self {
            id: view.item.id,
            name: view.item.name,
            description: view.item.description,
            available: view.item.available,
            owner_id: view.item.owner_id,
            request_id: view.item.request_id,
            last_booking: view.last_booking.map(Into::into),
            next_booking: view.next_booking.map(Into::into),
            comments: view.comments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub request_id: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateItemPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCommentPayload {
    pub text: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub from: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: String,
    pub from: Option<i64>,
    pub size: Option<i64>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List an item for borrowing.
#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemPayload,
    responses(
        (status = 200, body = ItemResponse),
        (status = 404, description = "Unknown owner or request reference")
    ),
    params(("X-Sharer-User-Id" = i64, Header, description = "Acting user id")),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateItemPayload>,
) -> Result<Json<ItemResponse>, ApiError> {
    let owner_id = sharer_user_id(&headers)?;
    let view = state
        .items
        .create(
            owner_id,
            NewItem {
                name: payload.name,
                description: payload.description,
                available: payload.available,
                request_id: payload.request_id,
            },
        )
        .await?;
    Ok(Json(view.into()))
}

/// The caller's own items, with booking annotations and comments.
#[utoipa::path(
    get,
    path = "/items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id"),
        ("from" = Option<i64>, Query, description = "Offset into the listing"),
        ("size" = Option<i64>, Query, description = "Page length")
    ),
    responses((status = 200, body = [ItemResponse])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let owner_id = sharer_user_id(&headers)?;
    let page = page(query.from, query.size)?;
    let views = state.items.get_by_owner(owner_id, page).await?;
    Ok(Json(views.into_iter().map(ItemResponse::from).collect()))
}

/// Fetch one item. Booking annotations are included only for the owner.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, body = ItemResponse),
        (status = 404, description = "No such item")
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    let viewer_id = sharer_user_id(&headers)?;
    let view = state.items.get_by_id(id, viewer_id).await?;
    Ok(Json(view.into()))
}

/// Partial update by the owner.
#[utoipa::path(
    patch,
    path = "/items/{id}",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    request_body = UpdateItemPayload,
    responses(
        (status = 200, body = ItemResponse),
        (status = 404, description = "No such item, or not the owner")
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<ItemResponse>, ApiError> {
    let actor_id = sharer_user_id(&headers)?;
    let view = state
        .items
        .update(
            id,
            actor_id,
            ItemPatch {
                name: payload.name,
                description: payload.description,
                available: payload.available,
            },
        )
        .await?;
    Ok(Json(view.into()))
}

/// Delete an item (owner only), returning the removed record.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, body = ItemResponse),
        (status = 404, description = "No such item, or not the owner")
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    let actor_id = sharer_user_id(&headers)?;
    let view = state.items.delete(id, actor_id).await?;
    Ok(Json(view.into()))
}

/// Free-text search over available items. Blank text yields an empty list.
#[utoipa::path(
    get,
    path = "/items/search",
    params(
        ("text" = String, Query, description = "Substring to match against name or description"),
        ("from" = Option<i64>, Query, description = "Offset into the listing"),
        ("size" = Option<i64>, Query, description = "Page length")
    ),
    responses((status = 200, body = [ItemResponse])),
    tag = "items"
)]
pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let page = page(query.from, query.size)?;
    let views = state.items.search(&query.text, page).await?;
    Ok(Json(views.into_iter().map(ItemResponse::from).collect()))
}

/// Comment on an item after a finished booking.
#[utoipa::path(
    post,
    path = "/items/{id}/comment",
    params(
        ("id" = i64, Path, description = "Item id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    request_body = CreateCommentPayload,
    responses(
        (status = 200, body = CommentResponse),
        (status = 400, description = "No finished booking on this item")
    ),
    tag = "items"
)]
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<Json<CommentResponse>, ApiError> {
    let author_id = sharer_user_id(&headers)?;
    let comment = state
        .items
        .add_comment(id, author_id, NewComment { text: payload.text })
        .await?;
    Ok(Json(comment.into()))
}
