// Route handlers, split by access tier:
// Public (no session) → Protected (session cookie or bearer token)

pub mod protected;
pub mod public;
