use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use midnight_domain::{CredentialVault, VaultError};

/// AES-256-GCM vault for stored travel-site credentials. Ciphertext layout:
/// 12-byte random nonce followed by the sealed payload and tag. A key
/// mismatch or corrupt ciphertext surfaces as `VaultError::Decryption`.
#[derive(Debug)]
pub struct AeadVault {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl AeadVault {
    pub fn from_hex_key(key_hex: &str) -> Result<Self, VaultError> {
        let key_bytes =
            hex::decode(key_hex).map_err(|e| VaultError::InvalidKey(e.to_string()))?;
        if key_bytes.len() != AES_256_GCM.key_len() {
            return Err(VaultError::InvalidKey(format!(
                "expected {} bytes, got {}",
                AES_256_GCM.key_len(),
                key_bytes.len()
            )));
        }

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| VaultError::InvalidKey("unusable key material".to_string()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }
}

impl CredentialVault for AeadVault {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| VaultError::Encryption("nonce generation failed".to_string()))?;

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        let mut sealed = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut sealed)
            .map_err(|_| VaultError::Encryption("seal failed".to_string()))?;

        let mut out = nonce_bytes.to_vec();
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
        if ciphertext.len() < NONCE_LEN {
            return Err(VaultError::Decryption("ciphertext too short".to_string()));
        }

        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| VaultError::Decryption("bad nonce".to_string()))?;

        let mut buffer = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| VaultError::Decryption("authentication failed".to_string()))?;

        Ok(plaintext.to_vec())
    }
}
