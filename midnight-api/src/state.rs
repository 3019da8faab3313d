use std::sync::Arc;

use midnight_domain::{BookingRepository, CredentialRepository, CredentialVault, UserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub users: Arc<dyn UserRepository>,
    pub vault: Arc<dyn CredentialVault>,
    pub auth: AuthConfig,
}
