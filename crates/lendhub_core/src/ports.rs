//! crates/lendhub_core/src/ports.rs
//!
//! Defines the storage contract (trait) for the application's core logic.
//! The trait forms the boundary of the hexagonal architecture, allowing the
//! services to be independent of the concrete database behind them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingState, Comment, Item, ItemRequest, NewBooking, NewItem, NewUser, Page, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// `NotFound` deliberately covers both "the entity does not exist" and "the
/// caller may not see it", so unauthorized callers cannot tell the two apart.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("email {0} is already in use")]
    DuplicateEmail(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        PortError::NotFound(format!("{entity} with id {id}"))
    }

    /// Machine-readable kind, used as the `error` field of the wire payload.
    pub fn kind(&self) -> &'static str {
        match self {
            PortError::NotFound(_) => "not_found",
            PortError::Validation(_) => "validation",
            PortError::DuplicateEmail(_) => "duplicate_email",
            PortError::Unexpected(_) => "internal",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port (Trait)
//=========================================================================================

#[async_trait]
pub trait Storage: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new: &NewUser) -> PortResult<User>;
    async fn save_user(&self, user: &User) -> PortResult<User>;
    async fn find_user(&self, id: i64) -> PortResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;
    async fn list_users(&self) -> PortResult<Vec<User>>;
    async fn delete_user(&self, id: i64) -> PortResult<()>;

    // --- Items ---
    async fn create_item(&self, owner_id: i64, new: &NewItem) -> PortResult<Item>;
    async fn save_item(&self, item: &Item) -> PortResult<Item>;
    async fn find_item(&self, id: i64) -> PortResult<Option<Item>>;
    async fn delete_item(&self, id: i64) -> PortResult<()>;

    /// The owner's items, ordered by id ascending.
    async fn list_items_by_owner(&self, owner_id: i64, page: Page) -> PortResult<Vec<Item>>;

    /// Case-insensitive substring match on name or description, restricted
    /// to available items. The caller is responsible for short-circuiting
    /// blank input.
    async fn search_items(&self, text: &str, page: Page) -> PortResult<Vec<Item>>;

    async fn list_items_by_request(&self, request_id: i64) -> PortResult<Vec<Item>>;

    /// Every item that was created against some request, for grouping on
    /// the request board.
    async fn list_items_with_request(&self) -> PortResult<Vec<Item>>;

    // --- Bookings ---
    /// Persists a new booking with status WAITING. Implementations must
    /// re-check interval overlap under a write lock on the item so that two
    /// racing creations serialize; the loser fails with `Validation`.
    async fn create_booking(&self, booker_id: i64, new: &NewBooking) -> PortResult<Booking>;

    async fn save_booking(&self, booking: &Booking) -> PortResult<Booking>;
    async fn find_booking(&self, id: i64) -> PortResult<Option<Booking>>;
    async fn list_bookings_for_item(&self, item_id: i64) -> PortResult<Vec<Booking>>;

    /// Bookings made by `booker_id` matching `state` at `now`, descending
    /// by start time.
    async fn list_bookings_by_booker(
        &self,
        booker_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>>;

    /// Bookings on items owned by `owner_id`, same filter and order.
    async fn list_bookings_by_owner(
        &self,
        owner_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>>;

    /// Most recent non-rejected booking with `start <= now`.
    async fn last_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>>;

    /// Earliest non-rejected booking with `start > now`.
    async fn next_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>>;

    /// Number of bookings by `booker_id` on `item_id` that ended before `now`.
    async fn count_finished_bookings(
        &self,
        item_id: i64,
        booker_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<i64>;

    // --- Requests ---
    async fn create_request(
        &self,
        user_id: i64,
        description: &str,
        created: DateTime<Utc>,
    ) -> PortResult<ItemRequest>;
    async fn find_request(&self, id: i64) -> PortResult<Option<ItemRequest>>;

    /// The user's own requests, newest first.
    async fn list_requests_by_user(&self, user_id: i64) -> PortResult<Vec<ItemRequest>>;

    /// Everyone else's requests, newest first.
    async fn list_requests_excluding_user(
        &self,
        user_id: i64,
        page: Page,
    ) -> PortResult<Vec<ItemRequest>>;

    // --- Comments ---
    async fn create_comment(
        &self,
        item_id: i64,
        author_id: i64,
        author_name: &str,
        text: &str,
        created: DateTime<Utc>,
    ) -> PortResult<Comment>;
    async fn list_comments_for_item(&self, item_id: i64) -> PortResult<Vec<Comment>>;
}
