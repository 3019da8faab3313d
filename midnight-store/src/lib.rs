pub mod app_config;
pub mod booking_repo;
pub mod credential_repo;
pub mod database;
pub mod user_repo;
pub mod vault;

pub use booking_repo::PgBookingRepository;
pub use credential_repo::PgCredentialRepository;
pub use database::DbClient;
pub use user_repo::PgUserRepository;
pub use vault::AeadVault;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown booking status in database: {0}")]
    InvalidStatus(String),
}
