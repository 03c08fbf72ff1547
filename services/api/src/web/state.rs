//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use lendhub_core::ports::Storage;
use lendhub_core::services::{BookingService, ItemService, RequestService, UserService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The services all talk to the same `Storage` implementation.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub items: ItemService,
    pub bookings: BookingService,
    pub requests: RequestService,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            users: UserService::new(storage.clone()),
            items: ItemService::new(storage.clone()),
            bookings: BookingService::new(storage.clone()),
            requests: RequestService::new(storage),
        }
    }
}
