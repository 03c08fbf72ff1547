//! crates/lendhub_core/src/services/mod.rs
//!
//! The service layer: every business rule in the system lives here, expressed
//! against the `Storage` port so the rules can be exercised without a database.

pub mod bookings;
pub mod items;
pub mod requests;
pub mod users;

pub use bookings::BookingService;
pub use items::ItemService;
pub use requests::RequestService;
pub use users::UserService;

#[cfg(test)]
pub(crate) mod memory;

use crate::domain::{Item, ItemRequest, User};
use crate::ports::{PortError, PortResult, Storage};

pub(crate) async fn require_user(storage: &dyn Storage, id: i64) -> PortResult<User> {
    storage
        .find_user(id)
        .await?
        .ok_or_else(|| PortError::not_found("user", id))
}

pub(crate) async fn require_item(storage: &dyn Storage, id: i64) -> PortResult<Item> {
    storage
        .find_item(id)
        .await?
        .ok_or_else(|| PortError::not_found("item", id))
}

pub(crate) async fn require_request(storage: &dyn Storage, id: i64) -> PortResult<ItemRequest> {
    storage
        .find_request(id)
        .await?
        .ok_or_else(|| PortError::not_found("request", id))
}
