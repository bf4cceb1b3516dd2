mod auth;
mod request_log;

pub use auth::{SESSION_HEADER, SessionToken, auth_middleware, extract_token};
pub use request_log::{REQUEST_ID_HEADER, request_log};
