//! Wallet Import Format: base58-with-checksum text encoding of a raw
//! private key.
//!
//! Layout: `version ‖ 32 secret bytes ‖ 4-byte checksum`, where the
//! checksum is the leading 4 bytes of SHA-256 over everything before it.

use secp256k1::SecretKey;
use sha2::Digest;
use sha2::Sha256;
use zeroize::Zeroize;

use super::error::WalletError;

/// Version prefix of WIF-encoded private keys.
pub const WIF_VERSION_BYTE: u8 = 0x80;

const SECRET_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
const WIF_LEN: usize = 1 + SECRET_LEN + CHECKSUM_LEN;

/// Encode a private key as WIF.
pub fn encode_wif(key: &SecretKey) -> String {
    let mut raw = Vec::with_capacity(WIF_LEN);
    raw.push(WIF_VERSION_BYTE);
    raw.extend_from_slice(&key.secret_bytes());
    let digest = Sha256::digest(&raw);
    raw.extend_from_slice(&digest[..CHECKSUM_LEN]);

    let encoded = bs58::encode(&raw).into_string();
    raw.zeroize();
    encoded
}

/// Decode a WIF string back into a private key.
///
/// The checksum is recomputed over the version prefix and payload and
/// compared against the trailing bytes; any discrepancy is rejected
/// before the key material is interpreted.
pub fn decode_wif(wif: &str) -> Result<SecretKey, WalletError> {
    let mut raw = bs58::decode(wif)
        .into_vec()
        .map_err(|e| WalletError::MalformedEncoding {
            reason: format!("invalid base58 in WIF key: {}", e),
        })?;
    if raw.len() != WIF_LEN {
        raw.zeroize();
        return Err(WalletError::MalformedEncoding {
            reason: format!("WIF key must decode to {} bytes, got {}", WIF_LEN, raw.len()),
        });
    }

    let digest = Sha256::digest(&raw[..WIF_LEN - CHECKSUM_LEN]);
    if digest[..CHECKSUM_LEN] != raw[WIF_LEN - CHECKSUM_LEN..] {
        raw.zeroize();
        return Err(WalletError::ChecksumMismatch);
    }

    let key = SecretKey::from_slice(&raw[1..1 + SECRET_LEN]).map_err(|e| {
        WalletError::MalformedEncoding {
            reason: format!("WIF payload is not a valid private key: {}", e),
        }
    });
    raw.zeroize();
    key
}
