pub mod manager;
pub mod memory;
pub mod models;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryUserStore;
pub use models::{NewUser, User};
pub use store::{PgUserStore, UserStore};
