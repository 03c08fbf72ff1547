//! crates/lendhub_core/src/services/bookings.rs
//!
//! The booking ledger: creation invariants, the approve/reject transition,
//! visibility rules, and the six-way state-filtered listings.
//!
//! Status state machine: WAITING -> APPROVED | REJECTED, nothing else. The
//! initial status is always WAITING and terminal states never transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Booking, BookingState, BookingStatus, BookingView, NewBooking, Page};
use crate::ports::{PortError, PortResult, Storage};
use crate::services::{require_item, require_user};

/// Pre-condition on the requested interval, checked before anything is read
/// from storage.
pub fn check_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> PortResult<()> {
    if start >= end {
        return Err(PortError::Validation(format!(
            "booking start ({start}) must be before its end ({end})"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookingService {
    storage: Arc<dyn Storage>,
}

impl BookingService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, booker_id: i64, new: NewBooking) -> PortResult<BookingView> {
        check_interval(new.start, new.end)?;

        let booker = require_user(self.storage.as_ref(), booker_id).await?;
        let item = require_item(self.storage.as_ref(), new.item_id).await?;

        if !item.available {
            return Err(PortError::Validation(format!(
                "item {} is not available for booking",
                item.id
            )));
        }
        // Owners cannot book their own items; reported as NotFound so the
        // caller cannot probe ownership.
        if item.owner_id == booker_id {
            return Err(PortError::not_found("item", item.id));
        }

        // Every booking that still reserves the slot counts, WAITING included.
        let existing = self.storage.list_bookings_for_item(item.id).await?;
        if existing
            .iter()
            .any(|b| b.status.blocks_slot() && b.overlaps(new.start, new.end))
        {
            return Err(PortError::Validation(format!(
                "item {} is already booked between {} and {}",
                item.id, new.start, new.end
            )));
        }

        let booking = self.storage.create_booking(booker_id, &new).await?;
        debug!(booking_id = booking.id, item_id = item.id, "booking created");
        Ok(BookingView {
            booking,
            item,
            booker,
        })
    }

    /// The approve/reject transition, the only mutation path for a booking's
    /// status. Only the item owner may perform it, and only while WAITING.
    pub async fn update(
        &self,
        booking_id: i64,
        actor_id: i64,
        approved: bool,
    ) -> PortResult<BookingView> {
        let mut booking = self
            .storage
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| PortError::not_found("booking", booking_id))?;
        let item = require_item(self.storage.as_ref(), booking.item_id).await?;

        if item.owner_id != actor_id {
            return Err(PortError::not_found("booking", booking_id));
        }
        if booking.status != BookingStatus::Waiting {
            return Err(PortError::Validation(format!(
                "booking {} has already been decided ({})",
                booking_id,
                booking.status.as_str()
            )));
        }

        booking.status = if approved {
            BookingStatus::Approved
        } else {
            BookingStatus::Rejected
        };
        let booking = self.storage.save_booking(&booking).await?;
        debug!(
            booking_id = booking.id,
            status = booking.status.as_str(),
            "booking decided"
        );

        let booker = require_user(self.storage.as_ref(), booking.booker_id).await?;
        Ok(BookingView {
            booking,
            item,
            booker,
        })
    }

    /// Visible only to the booker and the item owner; anyone else gets the
    /// same NotFound an absent id would produce.
    pub async fn get_by_id(&self, booking_id: i64, actor_id: i64) -> PortResult<BookingView> {
        let booking = self
            .storage
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| PortError::not_found("booking", booking_id))?;
        let item = require_item(self.storage.as_ref(), booking.item_id).await?;

        if actor_id != booking.booker_id && actor_id != item.owner_id {
            return Err(PortError::not_found("booking", booking_id));
        }

        let booker = require_user(self.storage.as_ref(), booking.booker_id).await?;
        Ok(BookingView {
            booking,
            item,
            booker,
        })
    }

    /// Bookings made by `booker_id`, filtered by `state`, newest start first.
    pub async fn get_all_by_booker(
        &self,
        booker_id: i64,
        state: BookingState,
        page: Page,
    ) -> PortResult<Vec<BookingView>> {
        require_user(self.storage.as_ref(), booker_id).await?;
        let bookings = self
            .storage
            .list_bookings_by_booker(booker_id, state, Utc::now(), page)
            .await?;
        self.views(bookings).await
    }

    /// Bookings on items owned by `owner_id`, same filter and order.
    pub async fn get_all_by_owner(
        &self,
        owner_id: i64,
        state: BookingState,
        page: Page,
    ) -> PortResult<Vec<BookingView>> {
        require_user(self.storage.as_ref(), owner_id).await?;
        let bookings = self
            .storage
            .list_bookings_by_owner(owner_id, state, Utc::now(), page)
            .await?;
        self.views(bookings).await
    }

    async fn views(&self, bookings: Vec<Booking>) -> PortResult<Vec<BookingView>> {
        let mut views = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let item = require_item(self.storage.as_ref(), booking.item_id).await?;
            let booker = require_user(self.storage.as_ref(), booking.booker_id).await?;
            views.push(BookingView {
                booking,
                item,
                booker,
            });
        }
        Ok(views)
    }
}
