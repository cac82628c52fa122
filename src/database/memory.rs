use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{NewUser, User};
use super::store::UserStore;

/// Process-local store for development runs and tests
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn has_users(&self) -> Result<bool, DatabaseError> {
        Ok(!self.users.read().await.is_empty())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, DatabaseError> {
        let user = User::from_new(NewUser {
            email: new.email.to_lowercase(),
            ..new
        });

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DatabaseError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(self.users.read().await.iter().take(limit).cloned().collect())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
