//! Encryption-at-rest for key material.
//!
//! Every secret the wallet persists — the master key record and each
//! imported or derived private key — is stored as an AES-256-GCM
//! ciphertext under the session [`PassphraseSecret`]. The GCM
//! authentication tag doubles as passphrase validation: decryption with
//! the wrong secret fails authentication without exposing plaintext.
//!
//! ```text
//! Passphrase (UTF-8)
//!     ↓ SHA-512
//! PassphraseSecret (512 bits)
//!     ↓ leading 256 bits
//! AES-256-GCM (random 96-bit nonce, stored with the ciphertext)
//! KeyCiphertext
//! ```

pub use cipher::KeyCipher;
pub use cipher::KeyCiphertext;

mod cipher;
