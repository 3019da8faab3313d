use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use midnight_domain::{UserProfile, UserRepository};

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    timezone: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, timezone FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| UserProfile {
            id: r.id,
            email: r.email,
            timezone: r.timezone,
        }))
    }

    async fn has_active_subscription(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(matches!(row, Some((status,)) if status == "active"))
    }
}
