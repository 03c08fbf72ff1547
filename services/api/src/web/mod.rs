pub mod bookings;
pub mod extract;
pub mod items;
pub mod requests;
pub mod state;
pub mod users;

use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        users::create_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        items::create_item,
        items::list_items,
        items::get_item,
        items::update_item,
        items::delete_item,
        items::search_items,
        items::add_comment,
        bookings::create_booking,
        bookings::decide_booking,
        bookings::get_booking,
        bookings::list_by_booker,
        bookings::list_by_owner,
        requests::create_request,
        requests::get_own_requests,
        requests::get_other_requests,
        requests::get_request,
    ),
    components(
        schemas(
            users::UserResponse,
            users::CreateUserPayload,
            users::UpdateUserPayload,
            items::ItemResponse,
            items::ShortBookingResponse,
            items::CommentResponse,
            items::CreateItemPayload,
            items::UpdateItemPayload,
            items::CreateCommentPayload,
            bookings::BookingResponse,
            bookings::CreateBookingPayload,
            requests::RequestResponse,
            requests::CreateRequestPayload,
        )
    ),
    tags(
        (name = "users", description = "Account management."),
        (name = "items", description = "The shared item catalog, its search and its comments."),
        (name = "bookings", description = "Booking lifecycle from request to owner decision."),
        (name = "requests", description = "Wishes for items nobody has listed yet.")
    )
)]
pub struct ApiDoc;
