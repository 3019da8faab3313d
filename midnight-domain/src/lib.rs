pub mod booking;
pub mod credential;
pub mod driver;
pub mod notify;
pub mod repository;
pub mod user;
pub mod vault;

pub use booking::{BookingError, BookingRequest, BookingStatus, NewBooking};
pub use credential::TravelCredential;
pub use driver::{Outcome, SiteCredentials, SiteDriver};
pub use notify::{Notifier, NoopNotifier};
pub use repository::{BookingRepository, CredentialRepository, UserRepository};
pub use user::UserProfile;
pub use vault::{CredentialVault, VaultError};
