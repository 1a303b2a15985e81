pub mod auth;
pub mod error;
pub mod feed;
pub mod friends;
pub mod groups;
pub mod posts;
pub mod profile;
pub mod search;

pub use error::{ApiError, ApiResult};

use uuid::Uuid;

/// Parse an identifier taken from the request path
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", kind)))
}
