use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use midnight_domain::{CredentialRepository, TravelCredential};

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgCredentialRepository {
    pool: PgPool,
}

impl PgCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    user_id: Uuid,
    travel_site_username: Vec<u8>,
    travel_site_password: Vec<u8>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CredentialRow> for TravelCredential {
    fn from(row: CredentialRow) -> Self {
        TravelCredential {
            id: row.id,
            user_id: row.user_id,
            username: row.travel_site_username,
            password: row.travel_site_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TravelCredential>, RepoError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT id, user_id, travel_site_username, travel_site_password, \
             created_at, updated_at \
             FROM travel_credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn upsert(&self, credential: &TravelCredential) -> Result<(), RepoError> {
        // One credential row per user
        sqlx::query(
            r#"
            INSERT INTO travel_credentials
                (id, user_id, travel_site_username, travel_site_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET travel_site_username = EXCLUDED.travel_site_username,
                travel_site_password = EXCLUDED.travel_site_password,
                updated_at = NOW()
            "#,
        )
        .bind(credential.id)
        .bind(credential.user_id)
        .bind(&credential.username)
        .bind(&credential.password)
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM travel_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
