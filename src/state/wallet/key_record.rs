//! Durable per-key and per-account records.

use secp256k1::PublicKey;
use secp256k1::SecretKey;
use serde::Deserialize;
use serde::Serialize;

use super::address::Address;
use super::encryption::KeyCipher;
use super::encryption::KeyCiphertext;
use super::error::WalletError;
use super::passphrase::PassphraseSecret;

/// One managed key.
///
/// The address is a pure function of the public key. The private-key
/// ciphertext is absent for contacts; when present it can only be
/// decrypted with the passphrase secret it was sealed under, i.e. while
/// the wallet is unlocked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyData {
    public_key: PublicKey,
    address: Address,
    encrypted_private_key: Option<KeyCiphertext>,
    /// Address of the owning account, if the key is filed under one.
    account_address: Option<Address>,
    /// Receive-only keys are excluded from the stealth-transfer protocol.
    receive_only: bool,
}

impl KeyData {
    /// Build a record holding `private_key` encrypted under `secret`.
    pub(crate) fn new_encrypted(
        secret: &PassphraseSecret,
        private_key: &SecretKey,
        account_address: Option<Address>,
        receive_only: bool,
    ) -> Result<Self, WalletError> {
        let public_key = private_key.public_key(&secp256k1::Secp256k1::new());
        let cipher = KeyCipher::new(secret)?;
        let encrypted_private_key = Some(cipher.encrypt(&private_key.secret_bytes())?);
        Ok(Self {
            public_key,
            address: Address::from_public_key(&public_key),
            encrypted_private_key,
            account_address,
            receive_only,
        })
    }

    /// Build a contact record: a known public key with no private
    /// material.
    pub(crate) fn new_contact(public_key: PublicKey, account_address: Option<Address>) -> Self {
        Self {
            public_key,
            address: Address::from_public_key(&public_key),
            encrypted_private_key: None,
            account_address,
            receive_only: false,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn account_address(&self) -> Option<Address> {
        self.account_address
    }

    pub fn is_receive_only(&self) -> bool {
        self.receive_only
    }

    pub fn has_private_key(&self) -> bool {
        self.encrypted_private_key.is_some()
    }

    /// Recover the plaintext private key.
    pub fn decrypt_private_key(&self, secret: &PassphraseSecret) -> Result<SecretKey, WalletError> {
        let sealed = self
            .encrypted_private_key
            .as_ref()
            .ok_or(WalletError::NoPrivateKey {
                address: self.address,
            })?;
        let cipher = KeyCipher::new(secret)?;
        let plaintext = cipher
            .decrypt(sealed)
            .map_err(|_| WalletError::InvalidPassphrase)?;
        SecretKey::from_slice(&plaintext).map_err(|e| {
            WalletError::Storage(anyhow::anyhow!("stored private key is invalid: {}", e))
        })
    }

    /// Re-seal the private-key ciphertext under a new secret. Contacts
    /// pass through unchanged.
    pub(crate) fn reencrypted(
        &self,
        old_secret: &PassphraseSecret,
        new_secret: &PassphraseSecret,
    ) -> Result<Self, WalletError> {
        if self.encrypted_private_key.is_none() {
            return Ok(self.clone());
        }
        let private_key = self.decrypt_private_key(old_secret)?;
        Self::new_encrypted(
            new_secret,
            &private_key,
            self.account_address,
            self.receive_only,
        )
    }
}

/// A name ↔ key binding. Names are unique within a wallet; an account
/// without a matching private [`KeyData`] is a contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    name: String,
    public_key: PublicKey,
    account_address: Address,
}

impl AccountRecord {
    pub(crate) fn new(name: &str, public_key: PublicKey) -> Self {
        Self {
            name: name.to_string(),
            public_key,
            account_address: Address::from_public_key(&public_key),
        }
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn account_address(&self) -> Address {
        self.account_address
    }
}
