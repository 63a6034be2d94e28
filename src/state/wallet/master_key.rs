//! The wallet's single password-protected root secret.

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha512;
use zeroize::Zeroizing;

use super::encryption::KeyCipher;
use super::encryption::KeyCiphertext;
use super::error::WalletError;
use super::extended_key::ExtendedPrivateKey;
use super::passphrase::PassphraseSecret;

/// Number of extra hash applications when expanding a brainkey.
///
/// Brainkeys are human-chosen and low-entropy; iterating the hash makes
/// offline dictionary attacks proportionally more expensive.
pub const BRAINKEY_STRETCH_ROUNDS: u32 = 100_000;

/// Ciphertext of the root extended private key, encrypted under the
/// passphrase secret.
///
/// Exactly zero or one record exists per wallet; it is written once at
/// wallet creation and re-encrypted only by a passphrase change. Nothing
/// in it is stored unencrypted at rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasterKeyRecord {
    encrypted_root_key: KeyCiphertext,
}

impl MasterKeyRecord {
    /// Encrypt a root key into a record.
    pub(crate) fn encrypt_key(
        secret: &PassphraseSecret,
        root: &ExtendedPrivateKey,
    ) -> Result<Self, WalletError> {
        let cipher = KeyCipher::new(secret)?;
        let encrypted_root_key = cipher.encrypt(root.to_bytes().as_slice())?;
        Ok(Self { encrypted_root_key })
    }

    /// Create a record whose root key is derived deterministically from a
    /// brainkey phrase.
    pub fn from_brainkey(secret: &PassphraseSecret, brainkey: &str) -> Result<Self, WalletError> {
        let seed = stretch_brainkey(brainkey);
        Self::encrypt_key(secret, &ExtendedPrivateKey::from_seed(seed.as_slice()))
    }

    /// Create a record around a freshly generated random root key.
    pub fn generate(secret: &PassphraseSecret) -> Result<Self, WalletError> {
        Self::encrypt_key(secret, &ExtendedPrivateKey::generate())
    }

    /// Check a passphrase secret against this record.
    ///
    /// Pure: no side effects, and no plaintext is exposed on mismatch —
    /// authenticated decryption fails before producing output.
    pub fn validate_passphrase(&self, secret: &PassphraseSecret) -> bool {
        self.decrypt_key(secret).is_ok()
    }

    /// Recover the root extended private key.
    pub(crate) fn decrypt_key(
        &self,
        secret: &PassphraseSecret,
    ) -> Result<ExtendedPrivateKey, WalletError> {
        let cipher = KeyCipher::new(secret)?;
        let plaintext = cipher
            .decrypt(&self.encrypted_root_key)
            .map_err(|_| WalletError::InvalidPassphrase)?;
        ExtendedPrivateKey::from_bytes(&plaintext).map_err(WalletError::Storage)
    }
}

/// Expand a brainkey phrase into root seed material: hash it, then apply
/// the hash to its own output [`BRAINKEY_STRETCH_ROUNDS`] times.
fn stretch_brainkey(brainkey: &str) -> Zeroizing<[u8; 64]> {
    let mut base = Zeroizing::new([0u8; 64]);
    base.copy_from_slice(&Sha512::digest(brainkey.as_bytes()));
    for _ in 0..BRAINKEY_STRETCH_ROUNDS {
        let digest = Sha512::digest(base.as_slice());
        base.copy_from_slice(&digest);
    }
    base
}
