use crate::domain::user::User;
use anyhow::Context;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user row, in store order (ascending id).
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: sqlx::PgPool,
}

impl PgUserRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, username FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("select users failed")?;

        tracing::debug!(count = users.len(), "listed users");
        Ok(users)
    }
}
