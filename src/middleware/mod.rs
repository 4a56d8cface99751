pub mod auth;
pub mod response;

pub use auth::{extract_token, require_user_middleware, session_middleware};
pub use response::{ApiResponse, ApiResult};
