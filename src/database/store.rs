use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{NewUser, User};

/// Persistence for dashboard accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether at least one account exists
    async fn has_users(&self) -> Result<bool, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Lookup by e-mail, which is stored lowercased
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Insert a new account. A taken e-mail yields `DatabaseError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Oldest accounts first
    async fn list(&self, limit: i64) -> Result<Vec<User>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    r#"id, name, email, email_verified, image, password_hash, created_at, updated_at"#;

#[async_trait]
impl UserStore for PgUserStore {
    async fn has_users(&self) -> Result<bool, DatabaseError> {
        let row: (bool,) = sqlx::query_as(r#"SELECT EXISTS (SELECT 1 FROM "user" LIMIT 1)"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!(r#"SELECT {} FROM "user" WHERE id = $1"#, USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!(r#"SELECT {} FROM "user" WHERE email = $1"#, USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, DatabaseError> {
        let user = User::from_new(NewUser {
            email: new.email.to_lowercase(),
            ..new
        });
        let query = format!(
            r#"INSERT INTO "user" ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}"#,
            USER_COLUMNS, USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.email_verified)
            .bind(&user.image)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DatabaseError::Conflict(format!("email {} is already registered", user.email))
                }
                other => DatabaseError::Sqlx(other),
            })
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DatabaseError> {
        let query = format!(
            r#"SELECT {} FROM "user" ORDER BY created_at ASC LIMIT $1"#,
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
