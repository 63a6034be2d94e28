//! Error types for wallet custody operations.

use std::path::PathBuf;
use std::time::Duration;

use super::address::Address;

/// Enumerates the ways a custody operation can fail.
///
/// Every precondition violation is reported synchronously with enough
/// context (operand name or path) to diagnose it; none are silently
/// swallowed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    #[error("wallet file already exists: {}", path.display())]
    WalletExists { path: PathBuf },

    #[error("wallet file not found: {}", path.display())]
    WalletNotFound { path: PathBuf },

    #[error("no wallet is open")]
    NotOpen,

    #[error("wallet is locked")]
    Locked,

    #[error("wallet already holds a master key record")]
    MasterKeyExists,

    #[error("wallet holds no master key record")]
    MasterKeyNotFound,

    #[error("account '{name}' already exists")]
    AccountExists { name: String },

    #[error("account '{name}' not found")]
    AccountNotFound { name: String },

    #[error("key {address} holds no private key material")]
    NoPrivateKey { address: Address },

    #[error("account '{name}' is already bound to a different key")]
    AccountKeyMismatch { name: String },

    #[error("key {address} is already attached to a different account")]
    KeyAccountMismatch { address: Address },

    #[error("invalid passphrase")]
    InvalidPassphrase,

    #[error("passphrase must be longer than {minimum} characters")]
    WeakPassphrase { minimum: usize },

    #[error("unlock timeout must be at least {minimum:?}")]
    UnlockTimeoutTooShort { minimum: Duration },

    #[error("checksum mismatch in encoded key")]
    ChecksumMismatch,

    #[error("malformed encoding: {reason}")]
    MalformedEncoding { reason: String },

    // catch-all for storage and crypto plumbing failures
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
