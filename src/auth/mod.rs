pub mod gate;
pub mod password;
pub mod session;

pub use gate::registration_gate;
pub use password::{hash_password, verify_dummy_password, verify_password, PasswordError};
pub use session::{bearer_token, token_from_cookies, Claims, SessionError, SessionKeys, SESSION_COOKIE};
