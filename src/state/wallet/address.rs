//! Wallet addresses: a deterministic digest of the public key, rendered
//! base58 with a checksum.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use sha2::Digest;
use sha2::Sha256;

use super::error::WalletError;

/// Version prefix distinguishing wallet addresses from other base58 data.
pub const ADDRESS_VERSION_BYTE: u8 = 0x23;

const PAYLOAD_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;

/// A 160-bit address, a pure function of the owning public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; PAYLOAD_LEN]);

impl Address {
    /// Derive the address of a public key: the leading 20 bytes of
    /// SHA-256 over its compressed encoding.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.serialize());
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&digest[..PAYLOAD_LEN]);
        Self(payload)
    }
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(data);
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&digest[..CHECKSUM_LEN]);
    check
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(1 + PAYLOAD_LEN + CHECKSUM_LEN);
        raw.push(ADDRESS_VERSION_BYTE);
        raw.extend_from_slice(&self.0);
        let check = checksum(&raw);
        raw.extend_from_slice(&check);
        write!(f, "{}", bs58::encode(raw).into_string())
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| WalletError::MalformedEncoding {
                reason: format!("invalid base58 in address: {}", e),
            })?;
        if raw.len() != 1 + PAYLOAD_LEN + CHECKSUM_LEN {
            return Err(WalletError::MalformedEncoding {
                reason: format!("address must decode to 25 bytes, got {}", raw.len()),
            });
        }
        if raw[0] != ADDRESS_VERSION_BYTE {
            return Err(WalletError::MalformedEncoding {
                reason: format!("unknown address version byte 0x{:02x}", raw[0]),
            });
        }
        let (body, check) = raw.split_at(1 + PAYLOAD_LEN);
        if checksum(body) != check {
            return Err(WalletError::ChecksumMismatch);
        }
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&body[1..]);
        Ok(Self(payload))
    }
}

// serialized as the base58 string so records stay human-auditable in JSON
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
