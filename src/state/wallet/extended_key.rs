//! The root extended private key and deterministic child derivation.

use anyhow::ensure;
use anyhow::Result;
use rand::Rng;
use secp256k1::PublicKey;
use secp256k1::Secp256k1;
use secp256k1::SecretKey;
use sha2::Digest;
use sha2::Sha512;
use zeroize::Zeroize;
use zeroize::Zeroizing;

/// A secp256k1 private key bundled with a chain code, enabling
/// deterministic child-key generation.
///
/// Seed expansion splits a SHA-512 digest: the left 32 bytes become the
/// secret scalar (re-hashed in the negligible case they fall outside the
/// curve order), the right 32 bytes become the chain code. Children are
/// derived by hashing `chain_code ‖ secret ‖ index` the same way, so the
/// whole key tree is a pure function of the root seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedPrivateKey {
    secret: SecretKey,
    chain_code: [u8; 32],
}

fn sha512_bytes(input: &[u8]) -> Zeroizing<[u8; 64]> {
    let digest = Sha512::digest(input);
    let mut bytes = Zeroizing::new([0u8; 64]);
    bytes.copy_from_slice(&digest);
    bytes
}

impl ExtendedPrivateKey {
    /// Expand a seed into an extended key.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut digest = sha512_bytes(seed);
        loop {
            if let Ok(secret) = SecretKey::from_slice(&digest[..32]) {
                let mut chain_code = [0u8; 32];
                chain_code.copy_from_slice(&digest[32..]);
                return Self { secret, chain_code };
            }
            digest = sha512_bytes(digest.as_slice());
        }
    }

    /// Generate a random extended key from OS entropy.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        loop {
            let candidate: [u8; 32] = rng.random();
            if let Ok(secret) = SecretKey::from_slice(&candidate) {
                return Self {
                    secret,
                    chain_code: rng.random(),
                };
            }
        }
    }

    /// Derive the child key at `index`. Deterministic.
    pub fn derive_child(&self, index: u64) -> Self {
        let mut material = Vec::with_capacity(32 + 32 + 8);
        material.extend_from_slice(&self.chain_code);
        material.extend_from_slice(&self.secret.secret_bytes());
        material.extend_from_slice(&index.to_le_bytes());

        let child = Self::from_seed(&material);
        material.zeroize();
        child
    }

    pub fn secret_key(&self) -> SecretKey {
        self.secret
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key(&Secp256k1::new())
    }

    /// Serialize as `secret ‖ chain_code` for encryption at rest.
    pub(crate) fn to_bytes(&self) -> Zeroizing<[u8; 64]> {
        let mut bytes = Zeroizing::new([0u8; 64]);
        bytes[..32].copy_from_slice(&self.secret.secret_bytes());
        bytes[32..].copy_from_slice(&self.chain_code);
        bytes
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == 64,
            "extended key must be 64 bytes, got {}",
            bytes.len()
        );
        let secret = SecretKey::from_slice(&bytes[..32])?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&bytes[32..]);
        Ok(Self { secret, chain_code })
    }
}
