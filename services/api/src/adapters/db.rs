//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `Storage` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lendhub_core::domain::{
    Booking, BookingState, BookingStatus, Comment, Item, ItemRequest, NewBooking, NewItem,
    NewUser, Page, User,
};
use lendhub_core::ports::{PortError, PortResult, Storage};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `Storage` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// The users table carries the only unique constraint in the schema, so a
/// unique violation on a user write can only mean a duplicated email.
fn user_write_error(e: sqlx::Error, email: &str) -> PortError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return PortError::DuplicateEmail(email.to_string());
        }
    }
    unexpected(e)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct ItemRecord {
    id: i64,
    name: String,
    description: String,
    available: bool,
    owner_id: i64,
    request_id: Option<i64>,
}
impl ItemRecord {
    fn to_domain(self) -> Item {
        Item {
            id: self.id,
            name: self.name,
            description: self.description,
            available: self.available,
            owner_id: self.owner_id,
            request_id: self.request_id,
        }
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    item_id: i64,
    booker_id: i64,
    status: String,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        Ok(Booking {
            id: self.id,
            start: self.start_date,
            end: self.end_date,
            item_id: self.item_id,
            booker_id: self.booker_id,
            status: BookingStatus::parse(&self.status)?,
        })
    }
}

#[derive(FromRow)]
struct RequestRecord {
    id: i64,
    description: String,
    user_id: i64,
    created: DateTime<Utc>,
}
impl RequestRecord {
    fn to_domain(self) -> ItemRequest {
        ItemRequest {
            id: self.id,
            description: self.description,
            user_id: self.user_id,
            created: self.created,
        }
    }
}

#[derive(FromRow)]
struct CommentRecord {
    id: i64,
    text: String,
    item_id: i64,
    author_id: i64,
    author_name: String,
    created: DateTime<Utc>,
}
impl CommentRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            text: self.text,
            item_id: self.item_id,
            author_id: self.author_id,
            author_name: self.author_name,
            created: self.created,
        }
    }
}

const BOOKING_COLUMNS: &str = "id, start_date, end_date, item_id, booker_id, status";
const ITEM_COLUMNS: &str = "id, name, description, available, owner_id, request_id";

/// Boolean filter matching `BookingState::matches`. Every bind is referenced
/// on all paths so one prepared statement serves all six states.
const STATE_FILTER: &str = "CASE $2::text \
     WHEN 'CURRENT' THEN b.start_date <= $3 AND $3 < b.end_date \
     WHEN 'PAST' THEN b.end_date < $3 \
     WHEN 'FUTURE' THEN b.start_date > $3 \
     WHEN 'WAITING' THEN b.status = 'WAITING' \
     WHEN 'REJECTED' THEN b.status = 'REJECTED' \
     ELSE TRUE END";

fn state_tag(state: BookingState) -> &'static str {
    match state {
        BookingState::All => "ALL",
        BookingState::Current => "CURRENT",
        BookingState::Past => "PAST",
        BookingState::Future => "FUTURE",
        BookingState::Waiting => "WAITING",
        BookingState::Rejected => "REJECTED",
    }
}

//=========================================================================================
// `Storage` Trait Implementation
//=========================================================================================

#[async_trait]
impl Storage for DbAdapter {
    async fn create_user(&self, new: &NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(&new.name)
        .bind(&new.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| user_write_error(e, &new.email))?;
        Ok(record.to_domain())
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "UPDATE users SET name = $2, email = $3 WHERE id = $1 RETURNING id, name, email",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| user_write_error(e, &user.email))?
        .ok_or_else(|| PortError::not_found("user", user.id))?;
        Ok(record.to_domain())
    }

    async fn find_user(&self, id: i64) -> PortResult<Option<User>> {
        let record =
            sqlx::query_as::<_, UserRecord>("SELECT id, name, email FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record =
            sqlx::query_as::<_, UserRecord>("SELECT id, name, email FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records =
            sqlx::query_as::<_, UserRecord>("SELECT id, name, email FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn delete_user(&self, id: i64) -> PortResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_item(&self, owner_id: i64, new: &NewItem) -> PortResult<Item> {
        let record = sqlx::query_as::<_, ItemRecord>(
            "INSERT INTO items (name, description, available, owner_id, request_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, description, available, owner_id, request_id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.available)
        .bind(owner_id)
        .bind(new.request_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn save_item(&self, item: &Item) -> PortResult<Item> {
        let record = sqlx::query_as::<_, ItemRecord>(
            "UPDATE items SET name = $2, description = $3, available = $4 \
             WHERE id = $1 \
             RETURNING id, name, description, available, owner_id, request_id",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.available)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::not_found("item", item.id))?;
        Ok(record.to_domain())
    }

    async fn find_item(&self, id: i64) -> PortResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ItemRecord::to_domain))
    }

    async fn delete_item(&self, id: i64) -> PortResult<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_items_by_owner(&self, owner_id: i64, page: Page) -> PortResult<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(page.size)
        .bind(page.from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ItemRecord::to_domain).collect())
    }

    async fn search_items(&self, text: &str, page: Page) -> PortResult<Vec<Item>> {
        let pattern = format!("%{text}%");
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE available = TRUE AND (name ILIKE $1 OR description ILIKE $1) \
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(page.size)
        .bind(page.from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ItemRecord::to_domain).collect())
    }

    async fn list_items_by_request(&self, request_id: i64) -> PortResult<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE request_id = $1 ORDER BY id"
        ))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ItemRecord::to_domain).collect())
    }

    async fn list_items_with_request(&self) -> PortResult<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE request_id IS NOT NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ItemRecord::to_domain).collect())
    }

    /// The overlap re-check runs inside a transaction holding a row lock on
    /// the item, so two racing creations for the same item serialize here
    /// and the loser observes the winner's row.
    async fn create_booking(&self, booker_id: i64, new: &NewBooking) -> PortResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("SELECT id FROM items WHERE id = $1 FOR UPDATE")
            .bind(new.item_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::not_found("item", new.item_id))?;

        let conflicts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE item_id = $1 AND status NOT IN ('REJECTED', 'CANCELED') \
             AND start_date < $3 AND end_date > $2",
        )
        .bind(new.item_id)
        .bind(new.start)
        .bind(new.end)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;
        if conflicts > 0 {
            return Err(PortError::Validation(format!(
                "item {} is already booked between {} and {}",
                new.item_id, new.start, new.end
            )));
        }

        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "INSERT INTO bookings (start_date, end_date, item_id, booker_id, status) \
             VALUES ($1, $2, $3, $4, 'WAITING') RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(new.start)
        .bind(new.end)
        .bind(new.item_id)
        .bind(booker_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn save_booking(&self, booking: &Booking) -> PortResult<Booking> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "UPDATE bookings SET start_date = $2, end_date = $3, status = $4 \
             WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(booking.start)
        .bind(booking.end)
        .bind(booking.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::not_found("booking", booking.id))?;
        record.to_domain()
    }

    async fn find_booking(&self, id: i64) -> PortResult<Option<Booking>> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(BookingRecord::to_domain).transpose()
    }

    async fn list_bookings_for_item(&self, item_id: i64) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE item_id = $1"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn list_bookings_by_booker(
        &self,
        booker_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT b.id, b.start_date, b.end_date, b.item_id, b.booker_id, b.status \
             FROM bookings b WHERE b.booker_id = $1 AND {STATE_FILTER} \
             ORDER BY b.start_date DESC LIMIT $4 OFFSET $5"
        ))
        .bind(booker_id)
        .bind(state_tag(state))
        .bind(now)
        .bind(page.size)
        .bind(page.from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn list_bookings_by_owner(
        &self,
        owner_id: i64,
        state: BookingState,
        now: DateTime<Utc>,
        page: Page,
    ) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT b.id, b.start_date, b.end_date, b.item_id, b.booker_id, b.status \
             FROM bookings b JOIN items i ON i.id = b.item_id \
             WHERE i.owner_id = $1 AND {STATE_FILTER} \
             ORDER BY b.start_date DESC LIMIT $4 OFFSET $5"
        ))
        .bind(owner_id)
        .bind(state_tag(state))
        .bind(now)
        .bind(page.size)
        .bind(page.from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn last_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = $1 AND status NOT IN ('REJECTED', 'CANCELED') AND start_date <= $2 \
             ORDER BY start_date DESC LIMIT 1"
        ))
        .bind(item_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(BookingRecord::to_domain).transpose()
    }

    async fn next_booking_for_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Booking>> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE item_id = $1 AND status NOT IN ('REJECTED', 'CANCELED') AND start_date > $2 \
             ORDER BY start_date ASC LIMIT 1"
        ))
        .bind(item_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(BookingRecord::to_domain).transpose()
    }

    async fn count_finished_bookings(
        &self,
        item_id: i64,
        booker_id: i64,
        now: DateTime<Utc>,
    ) -> PortResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE item_id = $1 AND booker_id = $2 AND end_date < $3",
        )
        .bind(item_id)
        .bind(booker_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn create_request(
        &self,
        user_id: i64,
        description: &str,
        created: DateTime<Utc>,
    ) -> PortResult<ItemRequest> {
        let record = sqlx::query_as::<_, RequestRecord>(
            "INSERT INTO requests (description, user_id, created) VALUES ($1, $2, $3) \
             RETURNING id, description, user_id, created",
        )
        .bind(description)
        .bind(user_id)
        .bind(created)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_request(&self, id: i64) -> PortResult<Option<ItemRequest>> {
        let record = sqlx::query_as::<_, RequestRecord>(
            "SELECT id, description, user_id, created FROM requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(RequestRecord::to_domain))
    }

    async fn list_requests_by_user(&self, user_id: i64) -> PortResult<Vec<ItemRequest>> {
        let records = sqlx::query_as::<_, RequestRecord>(
            "SELECT id, description, user_id, created FROM requests \
             WHERE user_id = $1 ORDER BY created DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(RequestRecord::to_domain).collect())
    }

    async fn list_requests_excluding_user(
        &self,
        user_id: i64,
        page: Page,
    ) -> PortResult<Vec<ItemRequest>> {
        let records = sqlx::query_as::<_, RequestRecord>(
            "SELECT id, description, user_id, created FROM requests \
             WHERE user_id <> $1 ORDER BY created DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.size)
        .bind(page.from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(RequestRecord::to_domain).collect())
    }

    async fn create_comment(
        &self,
        item_id: i64,
        author_id: i64,
        author_name: &str,
        text: &str,
        created: DateTime<Utc>,
    ) -> PortResult<Comment> {
        let record = sqlx::query_as::<_, CommentRecord>(
            "INSERT INTO comments (text, item_id, author_id, author_name, created) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, text, item_id, author_id, author_name, created",
        )
        .bind(text)
        .bind(item_id)
        .bind(author_id)
        .bind(author_name)
        .bind(created)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_comments_for_item(&self, item_id: i64) -> PortResult<Vec<Comment>> {
        let records = sqlx::query_as::<_, CommentRecord>(
            "SELECT id, text, item_id, author_id, author_name, created FROM comments \
             WHERE item_id = $1 ORDER BY created, id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(CommentRecord::to_domain).collect())
    }
}
