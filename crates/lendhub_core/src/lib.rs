pub mod domain;
pub mod ports;
pub mod services;

pub use domain::{
    Booking, BookingState, BookingStatus, BookingView, Comment, Item, ItemRequest, ItemView, Page,
    RequestView, ShortBooking, User,
};
pub use ports::{PortError, PortResult, Storage};
pub use services::{BookingService, ItemService, RequestService, UserService};
