/// Opaque encrypt/decrypt capability for stored travel-site credentials.
/// Key management and cipher choice belong to the implementation.
pub trait CredentialVault: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Invalid vault key: {0}")]
    InvalidKey(String),
}
