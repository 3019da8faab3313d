use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use midnight_domain::{
    BookingRepository, BookingRequest, BookingStatus, CredentialRepository, CredentialVault,
    Notifier, Outcome, SiteCredentials, SiteDriver,
};

/// Turns one due PENDING request into exactly one terminal state.
///
/// The atomic PENDING -> PROCESSING claim in the repository is the only
/// mutual-exclusion mechanism: whichever scanner tick or process instance
/// wins the conditional update runs the driver; everyone else backs off.
/// A failed attempt is terminal; there is no retry for a midnight deadline.
pub struct BookingExecutor {
    bookings: Arc<dyn BookingRepository>,
    credentials: Arc<dyn CredentialRepository>,
    vault: Arc<dyn CredentialVault>,
    driver: Arc<dyn SiteDriver>,
    notifier: Arc<dyn Notifier>,
}

impl BookingExecutor {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        credentials: Arc<dyn CredentialRepository>,
        vault: Arc<dyn CredentialVault>,
        driver: Arc<dyn SiteDriver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bookings,
            credentials,
            vault,
            driver,
            notifier,
        }
    }

    /// Execute one booking request end to end. Never returns an error: every
    /// fault is folded into the request's terminal FAILED state or logged, so
    /// a scan tick can fire-and-forget each request independently.
    pub async fn execute(&self, booking: BookingRequest) {
        match self
            .bookings
            .claim_for_processing(booking.id, "Starting booking automation")
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(booking_id = %booking.id, "booking no longer pending, skipping");
                return;
            }
            Err(e) => {
                error!(booking_id = %booking.id, error = %e, "failed to claim booking");
                return;
            }
        }

        info!(
            booking_id = %booking.id,
            origin = %booking.origin,
            destination = %booking.destination,
            "executing booking"
        );

        let outcome = match self.attempt(&booking).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failure(format!("Execution error: {}", e)),
        };

        let status = if outcome.success {
            BookingStatus::Success
        } else {
            BookingStatus::Failed
        };

        if let Err(e) = self
            .bookings
            .mark_completed(
                booking.id,
                status,
                &outcome.message,
                outcome.booking_reference.as_deref(),
                Utc::now(),
            )
            .await
        {
            // Terminal state was not recorded; do not notify an unknown state
            error!(booking_id = %booking.id, error = %e, "failed to record terminal state");
            return;
        }

        info!(booking_id = %booking.id, status = %status, message = %outcome.message, "booking finished");

        // Best effort: notification failures never touch booking state
        let finished = match self.bookings.get(booking.id).await {
            Ok(Some(fresh)) => fresh,
            _ => booking,
        };
        if let Err(e) = self.notifier.booking_result(&finished, outcome.success).await {
            warn!(booking_id = %finished.id, error = %e, "result notification failed");
        }
    }

    /// Credentials + driver run. Errors here become "Execution error: ..."
    /// terminal failures in the caller.
    async fn attempt(
        &self,
        booking: &BookingRequest,
    ) -> Result<Outcome, Box<dyn std::error::Error + Send + Sync>> {
        let Some(credential) = self.credentials.find_for_user(booking.user_id).await? else {
            return Ok(Outcome::failure("No travel site credentials found"));
        };

        let username = String::from_utf8(self.vault.decrypt(&credential.username)?)?;
        let password = String::from_utf8(self.vault.decrypt(&credential.password)?)?;
        let credentials = SiteCredentials { username, password };

        Ok(self.driver.run(&credentials, booking).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        booking_due_now, FakeDriver, FakeVault, MemoryBookingRepo, MemoryCredentialRepo,
        RecordingNotifier,
    };
    use std::sync::atomic::Ordering;

    struct Harness {
        bookings: Arc<MemoryBookingRepo>,
        credentials: Arc<MemoryCredentialRepo>,
        vault: Arc<FakeVault>,
        driver: Arc<FakeDriver>,
        notifier: Arc<RecordingNotifier>,
        executor: BookingExecutor,
    }

    fn harness(driver: FakeDriver) -> Harness {
        let bookings = Arc::new(MemoryBookingRepo::default());
        let credentials = Arc::new(MemoryCredentialRepo::default());
        let vault = Arc::new(FakeVault::default());
        let driver = Arc::new(driver);
        let notifier = Arc::new(RecordingNotifier::default());
        let executor = BookingExecutor::new(
            bookings.clone(),
            credentials.clone(),
            vault.clone(),
            driver.clone(),
            notifier.clone(),
        );
        Harness {
            bookings,
            credentials,
            vault,
            driver,
            notifier,
            executor,
        }
    }

    #[tokio::test]
    async fn test_successful_execution_records_terminal_success() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        let booking = booking_due_now(Some(500.0));
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "traveler", "hunter2");

        h.executor.execute(booking.clone()).await;

        let stored = h.bookings.get_sync(booking.id);
        assert_eq!(stored.status, BookingStatus::Success);
        assert_eq!(stored.booking_reference.as_deref(), Some("AB123456"));
        assert_eq!(
            stored.result_message.as_deref(),
            Some("Booking completed successfully")
        );
        assert!(stored.executed_at.is_some());
        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.calls(), vec![(booking.id, true)]);
    }

    #[tokio::test]
    async fn test_driver_receives_decrypted_credentials() {
        let h = harness(FakeDriver::succeeding("REF1"));
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "alice@site", "s3cret");

        h.executor.execute(booking).await;

        let seen = h.driver.last_credentials();
        assert_eq!(seen.as_ref().map(|c| c.username.as_str()), Some("alice@site"));
        assert_eq!(seen.as_ref().map(|c| c.password.as_str()), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuits_without_driver() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        let booking = booking_due_now(Some(500.0));
        h.bookings.insert(booking.clone());
        // no credential stored

        h.executor.execute(booking.clone()).await;

        let stored = h.bookings.get_sync(booking.id);
        assert_eq!(stored.status, BookingStatus::Failed);
        assert_eq!(
            stored.result_message.as_deref(),
            Some("No travel site credentials found")
        );
        assert!(stored.executed_at.is_some());
        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.calls(), vec![(booking.id, false)]);
    }

    #[tokio::test]
    async fn test_driver_failure_outcome_is_terminal_failed() {
        let h = harness(FakeDriver::failing("No booking options available"));
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "u", "p");

        h.executor.execute(booking.clone()).await;

        let stored = h.bookings.get_sync(booking.id);
        assert_eq!(stored.status, BookingStatus::Failed);
        assert_eq!(
            stored.result_message.as_deref(),
            Some("No booking options available")
        );
        assert!(stored.booking_reference.is_none());
        assert!(stored.executed_at.is_some());
    }

    #[tokio::test]
    async fn test_vault_failure_becomes_execution_error() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials.store_garbage(booking.user_id);

        h.executor.execute(booking.clone()).await;

        let stored = h.bookings.get_sync(booking.id);
        assert_eq!(stored.status, BookingStatus::Failed);
        let message = stored.result_message.unwrap();
        assert!(message.starts_with("Execution error:"), "{}", message);
        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_touch_state() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        h.notifier.fail_next();
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "u", "p");

        h.executor.execute(booking.clone()).await;

        let stored = h.bookings.get_sync(booking.id);
        assert_eq!(stored.status, BookingStatus::Success);
        assert_eq!(stored.booking_reference.as_deref(), Some("AB123456"));
    }

    #[tokio::test]
    async fn test_concurrent_executes_invoke_driver_exactly_once() {
        let h = harness(FakeDriver::succeeding("AB123456").with_delay_ms(20));
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "u", "p");

        tokio::join!(
            h.executor.execute(booking.clone()),
            h.executor.execute(booking.clone())
        );

        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(h.bookings.get_sync(booking.id).status, BookingStatus::Success);
        assert_eq!(h.notifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_booking_is_never_re_executed() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        let booking = booking_due_now(None);
        h.bookings.insert(booking.clone());
        h.credentials
            .store_plaintext(&*h.vault, booking.user_id, "u", "p");

        h.executor.execute(booking.clone()).await;
        let first = h.bookings.get_sync(booking.id);

        h.executor.execute(booking.clone()).await;
        let second = h.bookings.get_sync(booking.id);

        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(first.status, second.status);
        assert_eq!(first.executed_at, second.executed_at);
        assert_eq!(first.result_message, second.result_message);
    }

    #[tokio::test]
    async fn test_processing_booking_cannot_be_claimed() {
        let h = harness(FakeDriver::succeeding("AB123456"));
        let mut booking = booking_due_now(None);
        booking.status = BookingStatus::Processing;
        h.bookings.insert(booking.clone());

        h.executor.execute(booking.clone()).await;

        assert_eq!(h.driver.invocations.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.bookings.get_sync(booking.id).status,
            BookingStatus::Processing
        );
        assert!(h.notifier.calls().is_empty());
    }
}
