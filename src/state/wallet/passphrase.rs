//! The in-memory passphrase-derived secret.

use sha2::Digest;
use sha2::Sha512;
use zeroize::Zeroize;

/// Transient 512-bit hash of the wallet passphrase.
///
/// This secret both validates the master key record and decrypts every
/// private-key ciphertext in the wallet. It equals the all-zero sentinel
/// if and only if the wallet is locked; locking overwrites the bytes via
/// `zeroize` (volatile writes), as does dropping the value.
pub struct PassphraseSecret([u8; 64]);

impl PassphraseSecret {
    /// Hash a passphrase into its session secret.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha512::digest(passphrase.as_bytes());
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// The well-known "locked" value.
    pub fn sentinel() -> Self {
        Self([0u8; 64])
    }

    /// True iff this secret is the locked sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Zeroize for PassphraseSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for PassphraseSecret {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Clone for PassphraseSecret {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl std::fmt::Debug for PassphraseSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print secret bytes
        if self.is_sentinel() {
            write!(f, "PassphraseSecret(<locked>)")
        } else {
            write!(f, "PassphraseSecret(<set>)")
        }
    }
}
