use crate::infrastructure::db::DbPool;
use crate::{
    domain::user::{User, UserRow},
    error::AppResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Read-only access to registered accounts
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>>;
}

pub struct UserRepository {
    pool: Arc<DbPool>,
}

impl UserRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLookup for UserRepository {
    /// Find user by ID
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, subscription_plan, subscription_status, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(User::from))
    }
}
