use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::booking::BookingRequest;

/// Decrypted travel-site login, handed to the driver for one run only
#[derive(Debug, Clone)]
pub struct SiteCredentials {
    pub username: String,
    pub password: String,
}

/// Structured result of one execution attempt. Produced by the driver,
/// folded into the booking request's terminal fields by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    pub booking_reference: Option<String>,
}

impl Outcome {
    pub fn success(message: impl Into<String>, booking_reference: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            booking_reference,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            booking_reference: None,
        }
    }
}

/// Capability interface for driving a third-party travel site. One run per
/// booking request; the driver never mutates persisted state and never lets
/// a raw fault escape to the caller.
#[async_trait]
pub trait SiteDriver: Send + Sync {
    async fn run(&self, credentials: &SiteCredentials, booking: &BookingRequest) -> Outcome;
}
