use async_trait::async_trait;

use crate::booking::BookingRequest;

/// Best-effort result notification. The executor logs failures from this
/// trait and moves on; an error here never alters booking state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_result(
        &self,
        booking: &BookingRequest,
        success: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// No-op dispatcher for deployments without an outbound channel configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_result(
        &self,
        _booking: &BookingRequest,
        _success: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
