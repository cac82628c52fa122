pub mod auth;

pub use auth::{require_session, resolve_session, SessionUser, API_KEY_USER};
