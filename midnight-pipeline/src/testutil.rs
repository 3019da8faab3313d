//! In-memory fakes behind the domain traits, shared by the executor and
//! scheduler tests. The booking repo's mutex gives the same atomicity for
//! `claim_for_processing` that the SQL store gets from a conditional update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use midnight_domain::{
    BookingRepository, BookingRequest, BookingStatus, CredentialRepository, CredentialVault,
    NewBooking, Notifier, Outcome, SiteCredentials, SiteDriver, TravelCredential, VaultError,
};

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub fn booking_due_now(max_price: Option<f64>) -> BookingRequest {
    let mut booking = BookingRequest::new(
        Uuid::new_v4(),
        NewBooking {
            origin: "New York".to_string(),
            destination: "Los Angeles".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
            return_date: None,
            passengers: 1,
            primary_option: serde_json::json!({}),
            backup_option: serde_json::json!({}),
            max_price,
        },
        "UTC",
    )
    .unwrap();
    booking.scheduled_time = Utc::now();
    booking
}

pub fn booking_at(scheduled_time: DateTime<Utc>) -> BookingRequest {
    let mut booking = booking_due_now(None);
    booking.scheduled_time = scheduled_time;
    booking
}

#[derive(Default)]
pub struct MemoryBookingRepo {
    inner: Mutex<HashMap<Uuid, BookingRequest>>,
}

impl MemoryBookingRepo {
    pub fn insert(&self, booking: BookingRequest) {
        self.inner.lock().unwrap().insert(booking.id, booking);
    }

    pub fn get_sync(&self, id: Uuid) -> BookingRequest {
        self.inner.lock().unwrap().get(&id).cloned().expect("booking")
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepo {
    async fn create(&self, booking: &BookingRequest) -> Result<(), RepoError> {
        self.insert(booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<BookingRequest>, RepoError> {
        Ok(self.inner.lock().unwrap().get(&id).cloned())
    }

    async fn get_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BookingRequest>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingRequest>, RepoError> {
        let mut bookings: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse(b.created_at));
        Ok(bookings)
    }

    async fn update_details(&self, booking: &BookingRequest) -> Result<(), RepoError> {
        self.insert(booking.clone());
        Ok(())
    }

    async fn find_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BookingRequest>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                b.status == BookingStatus::Pending
                    && b.scheduled_time > window_start
                    && b.scheduled_time <= window_end
            })
            .cloned()
            .collect())
    }

    async fn claim_for_processing(&self, id: Uuid, message: &str) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Pending => {
                booking.status = BookingStatus::Processing;
                booking.result_message = Some(message.to_string());
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        status: BookingStatus,
        message: &str,
        booking_reference: Option<&str>,
        executed_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(booking) = inner.get_mut(&id) {
            booking.status = status;
            booking.result_message = Some(message.to_string());
            booking.booking_reference = booking_reference.map(str::to_string);
            booking.executed_at = Some(executed_at);
            booking.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.get_mut(&id) {
            Some(booking) if booking.user_id == user_id && booking.can_cancel() => {
                booking.status = BookingStatus::Canceled;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryCredentialRepo {
    inner: Mutex<HashMap<Uuid, TravelCredential>>,
}

impl MemoryCredentialRepo {
    pub fn store_plaintext(
        &self,
        vault: &dyn CredentialVault,
        user_id: Uuid,
        username: &str,
        password: &str,
    ) {
        let credential = TravelCredential::new(
            user_id,
            vault.encrypt(username.as_bytes()).unwrap(),
            vault.encrypt(password.as_bytes()).unwrap(),
        );
        self.inner.lock().unwrap().insert(user_id, credential);
    }

    /// Ciphertext that no vault will accept
    pub fn store_garbage(&self, user_id: Uuid) {
        let credential = TravelCredential::new(user_id, vec![0xde, 0xad], vec![0xbe, 0xef]);
        self.inner.lock().unwrap().insert(user_id, credential);
    }
}

#[async_trait]
impl CredentialRepository for MemoryCredentialRepo {
    async fn find_for_user(&self, user_id: Uuid) -> Result<Option<TravelCredential>, RepoError> {
        Ok(self.inner.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, credential: &TravelCredential) -> Result<(), RepoError> {
        self.inner
            .lock()
            .unwrap()
            .insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.inner.lock().unwrap().remove(&user_id).is_some())
    }
}

/// Reversible "cipher" with a recognizable prefix so corrupt ciphertext is
/// detected, mirroring the real vault's tag check
#[derive(Default)]
pub struct FakeVault;

impl CredentialVault for FakeVault {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let mut out = b"v1:".to_vec();
        out.extend_from_slice(plaintext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
        ciphertext
            .strip_prefix(b"v1:")
            .map(<[u8]>::to_vec)
            .ok_or_else(|| VaultError::Decryption("bad ciphertext".to_string()))
    }
}

pub struct FakeDriver {
    outcome: Outcome,
    delay_ms: u64,
    panic_origin: Option<String>,
    pub invocations: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    in_flight: AtomicUsize,
    last_credentials: Mutex<Option<SiteCredentials>>,
}

impl FakeDriver {
    pub fn succeeding(reference: &str) -> Self {
        Self::with_outcome(Outcome::success(
            "Booking completed successfully",
            Some(reference.to_string()),
        ))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Outcome::failure(message))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay_ms: 0,
            panic_origin: None,
            invocations: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            last_credentials: Mutex::new(None),
        }
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn panicking_for_origin(mut self, origin: &str) -> Self {
        self.panic_origin = Some(origin.to_string());
        self
    }

    pub fn last_credentials(&self) -> Option<SiteCredentials> {
        self.last_credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl SiteDriver for FakeDriver {
    async fn run(&self, credentials: &SiteCredentials, booking: &BookingRequest) -> Outcome {
        if self.panic_origin.as_deref() == Some(booking.origin.as_str()) {
            panic!("injected driver panic");
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.invocations.fetch_add(1, Ordering::SeqCst);
        *self.last_credentials.lock().unwrap() = Some(credentials.clone());

        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Uuid, bool)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<(Uuid, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_result(
        &self,
        booking: &BookingRequest,
        success: bool,
    ) -> Result<(), RepoError> {
        self.calls.lock().unwrap().push((booking.id, success));
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err("smtp unreachable".into());
        }
        Ok(())
    }
}
