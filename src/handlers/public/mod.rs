// Public handlers: session acquisition and the first-run check the sign-up
// page needs before anyone can log in.

pub mod auth;
pub mod users;
