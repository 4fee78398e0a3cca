//! Reversible encryption for the one secret kept on disk: the database password.
//!
//! Ciphertext is `hex(nonce):hex(ciphertext+tag)` using AES-256-GCM with a
//! fresh 12-byte nonce per call. Both directions are total: any failure
//! yields an empty string and a warning, never a panic or an error value.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use tracing::warn;

use inventrack_core::ProvisionError;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_LEN],
}

impl SecretCipher {
    /// Derive a 256-bit key from a passphrase: its bytes truncated to 32,
    /// or right-padded with spaces when shorter.
    pub fn from_key_material(material: &str) -> Self {
        let mut key = [b' '; KEY_LEN];
        let bytes = material.as_bytes();
        let n = bytes.len().min(KEY_LEN);
        key[..n].copy_from_slice(&bytes[..n]);
        Self { key }
    }

    /// Encrypt `plaintext`. Empty input, or any cipher failure, returns "".
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }
        match self.try_encrypt(plaintext) {
            Ok(out) => out,
            Err(e) => {
                warn!("Password encryption failed: {}", e);
                String::new()
            }
        }
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt). Anything that
    /// is not exactly two `:`-separated hex parts, or fails authentication
    /// under this key, returns "".
    pub fn decrypt(&self, encoded: &str) -> String {
        if encoded.is_empty() {
            return String::new();
        }
        match self.try_decrypt(encoded) {
            Ok(out) => out,
            Err(e) => {
                warn!("Password decryption failed: {}", e);
                String::new()
            }
        }
    }

    fn cipher(&self) -> Result<Aes256Gcm, ProvisionError> {
        Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ProvisionError::Crypto(format!("Failed to create cipher: {}", e)))
    }

    fn try_encrypt(&self, plaintext: &str) -> Result<String, ProvisionError> {
        let cipher = self.cipher()?;

        let mut iv_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut iv_bytes);
        let nonce = Nonce::from_slice(&iv_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ProvisionError::Crypto(format!("Encryption failed: {}", e)))?;

        Ok(format!("{}:{}", hex::encode(iv_bytes), hex::encode(ciphertext)))
    }

    fn try_decrypt(&self, encoded: &str) -> Result<String, ProvisionError> {
        let parts: Vec<&str> = encoded.split(':').collect();
        if parts.len() != 2 {
            return Err(ProvisionError::Crypto(
                "Invalid encrypted value format (expected iv:ciphertext)".to_string(),
            ));
        }

        let iv_bytes = hex::decode(parts[0])
            .map_err(|e| ProvisionError::Crypto(format!("Invalid IV hex: {}", e)))?;
        let ct_bytes = hex::decode(parts[1])
            .map_err(|e| ProvisionError::Crypto(format!("Invalid ciphertext hex: {}", e)))?;

        if iv_bytes.len() != NONCE_LEN {
            return Err(ProvisionError::Crypto(format!(
                "Invalid IV length: expected {}, got {}",
                NONCE_LEN,
                iv_bytes.len()
            )));
        }

        let cipher = self.cipher()?;
        let nonce = Nonce::from_slice(&iv_bytes);
        let plaintext = cipher
            .decrypt(nonce, ct_bytes.as_ref())
            .map_err(|e| ProvisionError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| ProvisionError::Crypto(format!("Decrypted value is not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").field("key", &"********").finish()
    }
}
