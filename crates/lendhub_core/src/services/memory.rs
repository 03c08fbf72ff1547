//! crates/lendhub_core/src/services/memory.rs
//!
//! A `Storage` implementation backed by plain vectors, used to exercise the
//! service layer in unit tests. It honors the same contracts the PostgreSQL
//! adapter does: unique emails, the transactional overlap re-check in
//! `create_booking`, and the documented orderings.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingState, BookingStatus, Comment, Item, ItemRequest, NewBooking, NewItem,
    NewUser, Page, User,
};
use crate::ports::{PortError, PortResult, Storage};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    items: Vec<Item>,
    bookings: Vec<Booking>,
    requests: Vec<ItemRequest>,
    comments: Vec<Comment>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a booking with an explicit status and interval, bypassing the
    /// creation invariants. Test fixtures only.
    pub fn add_booking(
        &self,
        item_id: i64,
        booker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: BookingStatus,
    ) -> Booking {
        let mut inner = self.inner.lock().unwrap();
        let booking = Booking {
            id: inner.next_id(),
            start,
            end,
            item_id,
            booker_id,
            status,
        };
        inner.bookings.push(booking.clone());
        booking
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, new: &NewUser) -> PortResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(PortError::DuplicateEmail(new.email.clone()));
        }
        let user = User {
            id: inner.next_id(),
            name: new.name.clone(),
            email: new.email.clone(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(PortError::DuplicateEmail(user.email.clone()));
        }
        let slot = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| PortError::not_found("user", user.id))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn find_user(&self, id: i64) -> PortResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.clone())
    }

    async fn delete_user(&self, id: i64) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.users.retain(|u| u.id != id);
        Ok(())
    }

    async fn create_item(&self, owner_id: i64, new: &NewItem) -> PortResult<Item> {
        let mut inner = self.inner.lock().unwrap();
        let item = Item {
            id: inner.next_id(),
            name: new.name.clone(),
            description: new.description.clone(),
            available: new.available,
            owner_id,
            request_id: new.request_id,
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn save_item(&self, item: &Item) -> PortResult<Item> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| PortError::not_found("item", item.id))?;
        *slot = item.clone();
        Ok(item.clone())
    }

    async fn find_item(&self, id: i64) -> PortResult<Option<Item>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.items.iter().find(|i| i.id == id).cloned())
    }

    async fn delete_item(&self, id: i64) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.items.retain(|i| i.id != id);
        Ok(())
    }

    async fn list_items_by_owner(&self, owner_id: i64, page: Page) -> PortResult<Vec<Item>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<Item> = inner
            .items
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(page.apply(items))
    }

    async fn search_items(&self, text: &str, page: Page) -> PortResult<Vec<Item>> {
        let needle = text.to_lowercase();
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<Item> = inner
            .items
            .iter()
            .filter(|i| {
                i.available
                    && (i.name.to_lowercase().contains(&needle)
                        || i.description.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(page.apply(items))
    }

    async fn list_items_by_request(&self, request_id: i64) -> PortResult<Vec<Item>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .items
            .iter()
            .filter(|i| i.request_id == Some(request_id))
            .cloned()
            .collect())
    }

    async fn list_items_with_request(&self) -> PortResult<Vec<Item>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .items
            .iter()
            .filter(|i| i.request_id.is_some())
            .cloned()
            .collect())
    }

    async fn create_booking(&self, booker_id: i64, new: &NewBooking) -> PortResult<Booking> {
        let mut inner = self.inner.lock().unwrap();
        // Same guard the database adapter runs inside its transaction.
        if inner
            .bookings
            .iter()
            .filter(|b| b.item_id == new.item_id && b.status.blocks_slot())
            .any(|b| b.overlaps(new.start, new.end))
        {
            return Err(PortError::Validation(format!(
                "item {} is already booked between {} and {}",
                new.item_id, new.start, new.end
            )));
        }
        let booking = Booking {
            id: inner.next_id(),
            start: new.start,
            end: new.end,
            item_id: new.item_id,
            booker_id,
            status: BookingStatus::Waiting,
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn save_booking(&self, booking: &Booking) -> PortResult<Booking> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| PortError::not_found("booking", booking.id))?;
        *slot = booking.clone();
        Ok(booking.clone())
    }

    async fn find_booking(&self, id: i64) -> PortResult<Option<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings_for_item(&self, item_id: i64) -> PortResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn list_bookings_by_booker(
        &self,
        booker_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.booker_id == booker_id && state.matches(b, now))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(page.apply(bookings))
    }

    async fn list_bookings_by_owner(
        &self,
        owner_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        let owned: Vec<i64> = inner
            .items
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .map(|i| i.id)
            .collect();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| owned.contains(&b.item_id) && state.matches(b, now))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(page.apply(bookings))
    }

    async fn last_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.item_id == item_id && b.status.blocks_slot() && b.start <= now)
            .max_by_key(|b| b.start)
            .cloned())
    }

    async fn next_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.item_id == item_id && b.status.blocks_slot() && b.start > now)
            .min_by_key(|b| b.start)
            .cloned())
    }

    async fn count_finished_bookings(
        &self,
        item_id: i64,
        booker_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.item_id == item_id && b.booker_id == booker_id && b.end < now)
            .count() as i64)
    }

    async fn create_request(
        &self,
        user_id: i64,
        description: &str,
        created: DateTime<Utc>,
    ) -> PortResult<ItemRequest> {
        let mut inner = self.inner.lock().unwrap();
        let request = ItemRequest {
            id: inner.next_id(),
            description: description.to_owned(),
            user_id,
            created,
        };
        inner.requests.push(request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: i64) -> PortResult<Option<ItemRequest>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests_by_user(&self, user_id: i64) -> PortResult<Vec<ItemRequest>> {
        let inner = self.inner.lock().unwrap();
        let mut requests: Vec<ItemRequest> = inner
            .requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn list_requests_excluding_user(
        &self,
        user_id: i64,
        page: Page,
    ) -> PortResult<Vec<ItemRequest>> {
        let inner = self.inner.lock().unwrap();
        let mut requests: Vec<ItemRequest> = inner
            .requests
            .iter()
            .filter(|r| r.user_id != user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(page.apply(requests))
    }

    async fn create_comment(
        &self,
        item_id: i64,
        author_id: i64,
        author_name: &str,
        text: &str,
        created: DateTime<Utc>,
    ) -> PortResult<Comment> {
        let mut inner = self.inner.lock().unwrap();
        let comment = Comment {
            id: inner.next_id(),
            text: text.to_owned(),
            item_id,
            author_id,
            author_name: author_name.to_owned(),
            created,
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments_for_item(&self, item_id: i64) -> PortResult<Vec<Comment>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .comments
            .iter()
            .filter(|c| c.item_id == item_id)
            .cloned()
            .collect())
    }
}
