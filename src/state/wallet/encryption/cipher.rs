//! AES-256-GCM authenticated encryption of key bytes.

use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use anyhow::anyhow;
use anyhow::Result;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use zeroize::Zeroizing;

use super::super::passphrase::PassphraseSecret;

/// An encrypted secret together with the nonce it was sealed under.
///
/// The authentication tag is appended to the ciphertext by the cipher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyCiphertext {
    nonce: [u8; 12],
    ciphertext: Vec<u8>,
}

#[cfg(test)]
impl KeyCiphertext {
    pub(crate) fn corrupt_first_byte(&mut self) {
        self.ciphertext[0] ^= 0xff;
    }
}

/// Handles AES-256-GCM encryption/decryption under the passphrase secret.
pub struct KeyCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCipher")
    }
}

impl KeyCipher {
    /// Create a cipher keyed by the leading 256 bits of the passphrase
    /// secret.
    pub fn new(secret: &PassphraseSecret) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(&secret.as_bytes()[..32])
            .map_err(|e| anyhow!("invalid AES key: {}", e))?;
        Ok(Self { cipher })
    }

    fn generate_nonce() -> [u8; 12] {
        let mut nonce = [0u8; 12];
        rand::rng().fill(&mut nonce);
        nonce
    }

    /// Encrypt key bytes under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<KeyCiphertext> {
        let nonce = Self::generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| anyhow!("encryption failed: {}", e))?;
        Ok(KeyCiphertext { nonce, ciphertext })
    }

    /// Decrypt with authentication verification.
    ///
    /// Fails if the secret does not match the one the ciphertext was
    /// sealed under, or if the ciphertext was tampered with.
    pub fn decrypt(&self, sealed: &KeyCiphertext) -> Result<Zeroizing<Vec<u8>>> {
        self.cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map(Zeroizing::new)
            .map_err(|e| anyhow!("decryption failed (wrong passphrase or corrupted data): {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher_for(passphrase: &str) -> KeyCipher {
        KeyCipher::new(&PassphraseSecret::from_passphrase(passphrase)).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = cipher_for("some wallet passphrase");

        let plaintext = b"secret key bytes";
        let sealed = cipher.encrypt(plaintext).unwrap();
        let decrypted = cipher.decrypt(&sealed).unwrap();

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn wrong_secret_fails() {
        let cipher1 = cipher_for("first passphrase");
        let cipher2 = cipher_for("second passphrase");

        let sealed = cipher1.encrypt(b"secret").unwrap();

        assert!(cipher2.decrypt(&sealed).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = cipher_for("some wallet passphrase");

        let mut sealed = cipher.encrypt(b"secret").unwrap();
        sealed.corrupt_first_byte();

        assert!(cipher.decrypt(&sealed).is_err());
    }

    #[test]
    fn nonces_are_fresh() {
        let cipher = cipher_for("some wallet passphrase");

        let a = cipher.encrypt(b"secret").unwrap();
        let b = cipher.encrypt(b"secret").unwrap();

        assert_ne!(a, b);
    }
}
