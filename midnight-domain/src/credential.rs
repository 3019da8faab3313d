use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored travel-site credentials, at most one per user. Both fields hold
/// vault ciphertext; nothing outside the executor ever sees the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelCredential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Vec<u8>,
    pub password: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TravelCredential {
    pub fn new(user_id: Uuid, username: Vec<u8>, password: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            username,
            password,
            created_at: now,
            updated_at: now,
        }
    }
}
