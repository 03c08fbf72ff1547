//! services/api/src/web/bookings.rs
//!
//! Axum handlers for the booking ledger: creation, the approve/reject
//! transition, single-booking lookup, and the state-filtered listings.

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
use crate::web::users::UserResponse;
use lendhub_core::domain::{BookingState, BookingView, ItemView, NewBooking};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_by_booker).post(create_booking))
        .route("/bookings/owner", get(list_by_owner))
        .route("/bookings/{id}", get(get_booking).patch(decide_booking))
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    pub item: ItemResponse,
    pub booker: UserResponse,
}

impl From<BookingView> for BookingResponse {
    fn from(view: BookingView) -> Self {
        Self {
            id: view.booking.id,
            start: view.booking.start,
            end: view.booking.end,
            status: view.booking.status.as_str().to_string(),
            item: ItemView::bare(view.item).into(),
            booker: view.booker.into(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub item_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub state: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Deserialize)]
pub struct ApproveQuery {
    pub approved: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Book an item for a date range. The new booking starts out WAITING.
#[utoipa::path(
    post,
    path = "/bookings",
    params(("X-Sharer-User-Id" = i64, Header, description = "Booking user id")),
    request_body = CreateBookingPayload,
    responses(
        (status = 200, body = BookingResponse),
        (status = 400, description = "Bad date range, unavailable item, or overlapping booking"),
        (status = 404, description = "Unknown item, or the caller owns it")
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booker_id = sharer_user_id(&headers)?;
    let view = state
        .bookings
        .create(
            booker_id,
            NewBooking {
                item_id: payload.item_id,
                start: payload.start,
                end: payload.end,
            },
        )
        .await?;
    Ok(Json(view.into()))
}

/// Approve or reject a WAITING booking (item owner only).
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    params(
        ("id" = i64, Path, description = "Booking id"),
        ("approved" = bool, Query, description = "true approves, false rejects"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, body = BookingResponse),
        (status = 400, description = "Booking already decided"),
        (status = 404, description = "No such booking, or not the item owner")
    ),
    tag = "bookings"
)]
pub async fn decide_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(query): Query<ApproveQuery>,
) -> Result<Json<BookingResponse>, ApiError> {
    let actor_id = sharer_user_id(&headers)?;
    let view = state.bookings.update(id, actor_id, query.approved).await?;
    Ok(Json(view.into()))
}

/// Fetch one booking; visible only to the booker and the item owner.
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(
        ("id" = i64, Path, description = "Booking id"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, body = BookingResponse),
        (status = 404, description = "No such booking, or no visibility")
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BookingResponse>, ApiError> {
    let actor_id = sharer_user_id(&headers)?;
    let view = state.bookings.get_by_id(id, actor_id).await?;
    Ok(Json(view.into()))
}

/// Bookings made by the caller, filtered by state, newest start first.
#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("state" = Option<String>, Query, description = "ALL, CURRENT, PAST, FUTURE, WAITING or REJECTED"),
        ("from" = Option<i64>, Query, description = "Offset into the listing"),
        ("size" = Option<i64>, Query, description = "Page length"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses((status = 200, body = [BookingResponse])),
    tag = "bookings"
)]
pub async fn list_by_booker(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let booker_id = sharer_user_id(&headers)?;
    let filter = BookingState::parse(query.state.as_deref())?;
    let page = page(query.from, query.size)?;
    let views = state
        .bookings
        .get_all_by_booker(booker_id, filter, page)
        .await?;
    Ok(Json(views.into_iter().map(BookingResponse::from).collect()))
}

/// Bookings on the caller's items, same filter and order.
#[utoipa::path(
    get,
    path = "/bookings/owner",
    params(
        ("state" = Option<String>, Query, description = "ALL, CURRENT, PAST, FUTURE, WAITING or REJECTED"),
        ("from" = Option<i64>, Query, description = "Offset into the listing"),
        ("size" = Option<i64>, Query, description = "Page length"),
        ("X-Sharer-User-Id" = i64, Header, description = "Acting user id")
    ),
    responses((status = 200, body = [BookingResponse])),
    tag = "bookings"
)]
pub async fn list_by_owner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let owner_id = sharer_user_id(&headers)?;
    let filter = BookingState::parse(query.state.as_deref())?;
    let page = page(query.from, query.size)?;
    let views = state
        .bookings
        .get_all_by_owner(owner_id, filter, page)
        .await?;
    Ok(Json(views.into_iter().map(BookingResponse::from).collect()))
}
