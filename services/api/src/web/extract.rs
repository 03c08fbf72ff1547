//! services/api/src/web/extract.rs
//!
//! Small request-parsing helpers shared by all handlers: the acting-user
//! header and the optional `from`/`size` pagination parameters.

use axum::http::HeaderMap;
use lendhub_core::domain::Page;
use lendhub_core::ports::{PortError, PortResult};

/// The header carrying the acting user's id on every call that needs one.
pub const USER_ID_HEADER: &str = "X-Sharer-User-Id";

/// Extracts and parses the acting user id. Missing or malformed values are
/// a validation failure (400), not an authentication concern.
pub fn sharer_user_id(headers: &HeaderMap) -> PortResult<i64> {
    let value = headers.get(USER_ID_HEADER).ok_or_else(|| {
        PortError::Validation(format!("{USER_ID_HEADER} header is required"))
    })?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            PortError::Validation(format!(
                "{USER_ID_HEADER} header must be a numeric user id"
            ))
        })
}

/// Validates the optional pagination parameters.
pub fn page(from: Option<i64>, size: Option<i64>) -> PortResult<Page> {
    Page::new(from, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            sharer_user_id(&headers),
            Err(PortError::Validation(_))
        ));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("17"));
        assert_eq!(sharer_user_id(&headers).unwrap(), 17);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("seventeen"));
        assert!(matches!(
            sharer_user_id(&headers),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn pagination_bounds() {
        assert!(page(None, None).is_ok());
        assert!(page(Some(0), Some(10)).is_ok());
        assert!(page(Some(-1), Some(10)).is_err());
        assert!(page(Some(0), Some(0)).is_err());
    }
}
