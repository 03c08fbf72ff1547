//! crates/lendhub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

use crate::ports::{PortError, PortResult};

/// A registered user. Emails are unique across all live users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// An item listed for borrowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub owner_id: i64,
    /// Set when the item was listed in answer to an open item request.
    /// Weak reference, used only for grouping on the request board.
    pub request_id: Option<i64>,
}

/// A user's ask for an item that nobody has listed yet.
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRequest {
    pub id: i64,
    pub description: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
}

/// Lifecycle of a booking. `Canceled` exists in the stored vocabulary and in
/// overlap exclusion, but no endpoint produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "WAITING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> PortResult<Self> {
        match s {
            "WAITING" => Ok(BookingStatus::Waiting),
            "APPROVED" => Ok(BookingStatus::Approved),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "CANCELED" => Ok(BookingStatus::Canceled),
            other => Err(PortError::Unexpected(format!(
                "unknown booking status '{other}'"
            ))),
        }
    }

    /// Whether a booking in this status still reserves its time slot.
    /// A WAITING booking blocks the interval just like an approved one.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, BookingStatus::Rejected | BookingStatus::Canceled)
    }
}

/// A reservation of an item for the half-open interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub item_id: i64,
    pub booker_id: i64,
    pub status: BookingStatus,
}

impl Booking {
    /// Standard half-open interval intersection.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// A comment left on an item by a user who finished a booking for it.
/// The author's display name is snapshotted at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub item_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub created: DateTime<Utc>,
}

/// Query-time classification of bookings relative to `now`. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingState {
    #[default]
    All,
    Current,
    Past,
    Future,
    Waiting,
    Rejected,
}

impl BookingState {
    /// Parses the `state` query parameter; case-insensitive, absent means ALL.
    pub fn parse(s: Option<&str>) -> PortResult<Self> {
        let Some(s) = s else {
            return Ok(BookingState::All);
        };
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(BookingState::All),
            "CURRENT" => Ok(BookingState::Current),
            "PAST" => Ok(BookingState::Past),
            "FUTURE" => Ok(BookingState::Future),
            "WAITING" => Ok(BookingState::Waiting),
            "REJECTED" => Ok(BookingState::Rejected),
            other => Err(PortError::Validation(format!(
                "Unknown state: {other}"
            ))),
        }
    }

    /// Whether `booking` falls into this classification at instant `now`.
    pub fn matches(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        match self {
            BookingState::All => true,
            BookingState::Current => booking.start <= now && now < booking.end,
            BookingState::Past => booking.end < now,
            BookingState::Future => booking.start > now,
            BookingState::Waiting => booking.status == BookingStatus::Waiting,
            BookingState::Rejected => booking.status == BookingStatus::Rejected,
        }
    }
}

/// Optional offset/limit pagination. Absent means unpaginated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub from: Option<i64>,
    pub size: Option<i64>,
}

impl Page {
    pub fn new(from: Option<i64>, size: Option<i64>) -> PortResult<Self> {
        if let Some(from) = from {
            if from < 0 {
                return Err(PortError::Validation(format!(
                    "'from' must not be negative, got {from}"
                )));
            }
        }
        if let Some(size) = size {
            if size <= 0 {
                return Err(PortError::Validation(format!(
                    "'size' must be positive, got {size}"
                )));
            }
        }
        Ok(Self { from, size })
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Applies this page to an already-ordered in-memory sequence.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.from.unwrap_or(0) as usize;
        let take = self.size.map(|s| s as usize).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}

//=========================================================================================
// Service Inputs
//=========================================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub request_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub item_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
}

//=========================================================================================
// Read-time Views (assembled by the services, never persisted)
//=========================================================================================

/// Just enough of a booking to annotate an item read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortBooking {
    pub id: i64,
    pub booker_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&Booking> for ShortBooking {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            booker_id: booking.booker_id,
            start: booking.start,
            end: booking.end,
        }
    }
}

/// An item decorated with its comments and, for the owner, the most recent
/// and nearest upcoming bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub item: Item,
    pub last_booking: Option<ShortBooking>,
    pub next_booking: Option<ShortBooking>,
    pub comments: Vec<Comment>,
}

impl ItemView {
    pub fn bare(item: Item) -> Self {
        Self {
            item,
            last_booking: None,
            next_booking: None,
            comments: Vec::new(),
        }
    }
}

/// A booking with its item and booker resolved, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub booking: Booking,
    pub item: Item,
    pub booker: User,
}

/// A request annotated with the catalog items created against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestView {
    pub request: ItemRequest,
    pub items: Vec<Item>,
}
