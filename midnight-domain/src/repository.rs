use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{BookingRequest, BookingStatus};
use crate::credential::TravelCredential;
use crate::user::UserProfile;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for booking request persistence.
///
/// `claim_for_processing` and `cancel` are conditional updates: the status
/// check and the write must be a single atomic unit so that racing callers
/// observe at most one winner. A read-then-write implementation is incorrect.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &BookingRequest) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<BookingRequest>, RepoError>;

    async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BookingRequest>, RepoError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingRequest>, RepoError>;

    /// Persist owner edits to a PENDING request (itinerary, preferences,
    /// recomputed scheduled_time)
    async fn update_details(&self, booking: &BookingRequest) -> Result<(), RepoError>;

    /// All PENDING requests with `window_start < scheduled_time <= window_end`
    async fn find_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BookingRequest>, RepoError>;

    /// Atomically transition PENDING -> PROCESSING, recording `message`.
    /// Returns false when the request was no longer PENDING (lost race or
    /// already handled); exactly one concurrent caller sees true.
    async fn claim_for_processing(&self, id: Uuid, message: &str) -> Result<bool, RepoError>;

    /// Terminal transition: sets status, result_message, executed_at and,
    /// on success, the site-issued booking reference
    async fn mark_completed(
        &self,
        id: Uuid,
        status: BookingStatus,
        message: &str,
        booking_reference: Option<&str>,
        executed_at: DateTime<Utc>,
    ) -> Result<(), RepoError>;

    /// Atomically cancel unless the request is SUCCESS or PROCESSING.
    /// Returns false when the guard rejected the transition.
    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;
}

/// Repository trait for stored travel-site credentials (read side of the
/// executor, write side of the HTTP surface)
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TravelCredential>, RepoError>;

    /// Insert or replace the single credential row for this user
    async fn upsert(&self, credential: &TravelCredential) -> Result<(), RepoError>;

    /// Returns false when the user had no stored credential
    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool, RepoError>;
}

/// Read-only access to the user directory
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError>;

    /// Booking creation requires an active subscription; the subscription
    /// lifecycle itself is managed elsewhere
    async fn has_active_subscription(&self, user_id: Uuid) -> Result<bool, RepoError>;
}
