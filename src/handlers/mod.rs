pub mod api;
pub mod pages;

use uuid::Uuid;

use crate::error::ApiError;

/// Path ids that do not parse are reported like ids that do not exist.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}
