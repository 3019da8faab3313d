use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of the user record this system reads: notification address and
/// the timezone used to compute execution instants. Account management lives
/// elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub timezone: String,
}
