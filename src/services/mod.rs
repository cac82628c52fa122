pub mod account_service;
pub mod seed;

pub use account_service::{AccountError, AccountService, SignInRequest, SignUpRequest};
pub use seed::seed_admin_if_none_exists;
