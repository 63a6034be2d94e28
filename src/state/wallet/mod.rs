//! Key custody and lock lifecycle.
//!
//! A [`Wallet`] protects a hierarchy of private keys behind a single user
//! passphrase. The root secret is an extended private key, encrypted
//! under the passphrase hash and stored as the wallet's single
//! [`MasterKeyRecord`]; account keys are derived from it as deterministic
//! children, and foreign keys enter through WIF or raw import. Unlocking
//! installs the passphrase hash in memory for a bounded window enforced
//! by a background relocker task: secret material is accessible if and
//! only if the wallet is unlocked.

pub mod address;
pub mod encryption;
pub mod error;
pub mod extended_key;
pub mod key_record;
pub mod lock_schedule;
pub mod master_key;
pub mod passphrase;
pub mod wallet_db;
pub mod wif;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use secp256k1::PublicKey;
use secp256k1::Secp256k1;
use secp256k1::SecretKey;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

use self::address::Address;
use self::error::WalletError;
use self::key_record::AccountRecord;
use self::key_record::KeyData;
use self::lock_schedule::spawn_relocker;
use self::lock_schedule::LockState;
use self::lock_schedule::LockTime;
use self::lock_schedule::RELOCK_POLL_INTERVAL;
use self::master_key::MasterKeyRecord;
use self::passphrase::PassphraseSecret;
use self::wallet_db::WalletDb;
use crate::config_models::data_directory::DataDirectory;

/// Passphrases must be strictly longer than this.
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Shortest accepted unlock window.
pub const MIN_UNLOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// The custody engine: master-key protocol, lock state machine, key
/// import, and account directory, layered on one exclusively owned
/// [`WalletDb`] handle.
#[derive(Debug)]
pub struct Wallet {
    data_directory: PathBuf,
    db: Option<WalletDb>,
    lock_state: Arc<LockState>,
    relocker: Option<JoinHandle<()>>,
}

impl Wallet {
    pub fn new(data_directory: PathBuf) -> Self {
        Self {
            data_directory,
            db: None,
            lock_state: Arc::new(LockState::new()),
            relocker: None,
        }
    }

    pub fn set_data_directory(&mut self, data_directory: PathBuf) {
        self.data_directory = data_directory;
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    /// Create the named wallet under the data directory.
    pub async fn create(
        &mut self,
        wallet_name: &str,
        passphrase: &str,
        brainkey: Option<&str>,
    ) -> Result<(), WalletError> {
        let wallet_path = self.data_directory.join(wallet_name);
        self.create_file(&wallet_path, passphrase, brainkey).await
    }

    /// Create a wallet at an explicit path.
    ///
    /// Derives the root key deterministically when a brainkey is given,
    /// randomly otherwise, encrypts it under the passphrase hash, and
    /// persists it as the wallet's sole master key record. The wallet is
    /// left open and locked.
    pub async fn create_file(
        &mut self,
        wallet_path: &Path,
        passphrase: &str,
        brainkey: Option<&str>,
    ) -> Result<(), WalletError> {
        if wallet_path.exists() {
            return Err(WalletError::WalletExists {
                path: wallet_path.to_path_buf(),
            });
        }
        if passphrase.len() <= MIN_PASSPHRASE_LENGTH {
            return Err(WalletError::WeakPassphrase {
                minimum: MIN_PASSPHRASE_LENGTH,
            });
        }

        self.close().await;
        if let Some(parent) = wallet_path.parent() {
            DataDirectory::create_dir_if_not_exists(parent)?;
        }

        let mut db = WalletDb::open(wallet_path)?;
        if db.master_key().is_some() {
            return Err(WalletError::MasterKeyExists);
        }

        let secret = PassphraseSecret::from_passphrase(passphrase);
        let record = match brainkey {
            Some(brainkey) if !brainkey.is_empty() => {
                MasterKeyRecord::from_brainkey(&secret, brainkey)?
            }
            _ => MasterKeyRecord::generate(&secret)?,
        };
        db.store_master_key(record)?;

        // close and reopen so the master key is read back from disk
        drop(db);
        let db = WalletDb::open(wallet_path)?;
        if db.master_key().is_none() {
            return Err(WalletError::Storage(anyhow!(
                "master key record missing after reopening {}",
                wallet_path.display()
            )));
        }

        info!("created wallet at {}", wallet_path.display());
        self.db = Some(db);
        Ok(())
    }

    /// Open the named wallet under the data directory.
    pub async fn open(&mut self, wallet_name: &str) -> Result<(), WalletError> {
        let wallet_path = self.data_directory.join(wallet_name);
        self.open_file(&wallet_path).await
    }

    /// Open the wallet at an explicit path. Any previously open wallet is
    /// closed first; the fresh handle starts locked.
    pub async fn open_file(&mut self, wallet_path: &Path) -> Result<(), WalletError> {
        if !wallet_path.exists() {
            return Err(WalletError::WalletNotFound {
                path: wallet_path.to_path_buf(),
            });
        }

        self.close().await;
        self.db = Some(WalletDb::open(wallet_path)?);
        info!("opened wallet at {}", wallet_path.display());
        Ok(())
    }

    /// Lock, stop the relocker, and release the record store.
    ///
    /// Waits for a live relocker task to observe its cancellation; the
    /// wait is bounded by a few poll intervals so close never hangs on a
    /// stuck task.
    pub async fn close(&mut self) {
        if self.db.is_some() {
            info!("closing wallet");
        }
        self.lock();
        if let Some(handle) = self.relocker.take() {
            if !handle.is_finished() {
                let _ = tokio::time::timeout(RELOCK_POLL_INTERVAL * 4, handle).await;
            }
        }
        self.db = None;
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    pub fn get_wallet_name(&self) -> Option<String> {
        self.get_wallet_filename()
            .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
    }

    pub fn get_wallet_filename(&self) -> Option<PathBuf> {
        self.db.as_ref().map(|db| db.path().to_path_buf())
    }

    /// Validate the passphrase and open the signing window.
    ///
    /// On success the passphrase hash is held in memory until
    /// `now + timeout`, until forever for `Duration::MAX`, or until an
    /// explicit [`lock`](Self::lock). A failed validation locks the
    /// wallet before reporting, so an invalid attempt never leaves it
    /// unlocked. For finite windows, exactly one background relocker
    /// task enforces the expiry; an unlock while one is live only
    /// rewrites the schedule under it.
    pub fn unlock(&mut self, timeout: Duration, passphrase: &str) -> Result<(), WalletError> {
        self.require_open()?;
        if passphrase.len() <= MIN_PASSPHRASE_LENGTH {
            return Err(WalletError::WeakPassphrase {
                minimum: MIN_PASSPHRASE_LENGTH,
            });
        }
        if timeout < MIN_UNLOCK_TIMEOUT {
            return Err(WalletError::UnlockTimeoutTooShort {
                minimum: MIN_UNLOCK_TIMEOUT,
            });
        }
        let record = self
            .db()?
            .master_key()
            .cloned()
            .ok_or(WalletError::MasterKeyNotFound)?;

        let secret = PassphraseSecret::from_passphrase(passphrase);
        if !record.validate_passphrase(&secret) {
            self.lock();
            return Err(WalletError::InvalidPassphrase);
        }

        let until = if timeout == Duration::MAX {
            LockTime::Never
        } else {
            Instant::now()
                .checked_add(timeout)
                .map_or(LockTime::Never, LockTime::At)
        };
        self.lock_state.set_unlocked(secret, until);

        if matches!(until, LockTime::At(_)) {
            let relocker_live = self
                .relocker
                .as_ref()
                .is_some_and(|handle| !handle.is_finished());
            if !relocker_live {
                self.relocker = Some(spawn_relocker(Arc::clone(&self.lock_state)));
            }
        }

        info!("wallet unlocked, relock scheduled: {:?}", until);
        Ok(())
    }

    /// Wipe the in-memory secret and cancel any pending relock.
    /// Idempotent; valid in any state.
    pub fn lock(&self) {
        self.lock_state.lock();
        debug!("wallet locked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.lock_state.is_unlocked()
    }

    pub fn is_locked(&self) -> bool {
        !self.is_unlocked()
    }

    pub fn unlocked_until(&self) -> LockTime {
        self.lock_state.unlocked_until()
    }

    /// Re-encrypt the wallet under a new passphrase.
    ///
    /// The master key record and every private-key ciphertext are sealed
    /// under the passphrase-derived secret, so all of them are re-sealed
    /// and persisted in a single store write before the in-memory secret
    /// is swapped. The unlock schedule is left untouched.
    pub fn change_passphrase(&mut self, new_passphrase: &str) -> Result<(), WalletError> {
        self.require_open()?;
        if new_passphrase.len() <= MIN_PASSPHRASE_LENGTH {
            return Err(WalletError::WeakPassphrase {
                minimum: MIN_PASSPHRASE_LENGTH,
            });
        }
        let old_secret = self.require_unlocked()?;
        let new_secret = PassphraseSecret::from_passphrase(new_passphrase);

        let db = self.db_mut()?;
        let root = db
            .master_key()
            .ok_or(WalletError::MasterKeyNotFound)?
            .decrypt_key(&old_secret)?;
        let new_master = MasterKeyRecord::encrypt_key(&new_secret, &root)?;

        let mut resealed = Vec::new();
        for key in db.keys() {
            resealed.push(key.reencrypted(&old_secret, &new_secret)?);
        }
        db.store_reencrypted(new_master, resealed)?;

        self.lock_state.replace_secret(new_secret);
        info!("wallet passphrase changed");
        Ok(())
    }

    /// Create a named account around a fresh child of the master key.
    pub fn create_account(&mut self, account_name: &str) -> Result<PublicKey, WalletError> {
        self.require_open()?;
        let secret = self.require_unlocked()?;

        let db = self.db_mut()?;
        if db.lookup_account(account_name).is_some() {
            return Err(WalletError::AccountExists {
                name: account_name.to_string(),
            });
        }

        let root = db
            .master_key()
            .ok_or(WalletError::MasterKeyNotFound)?
            .decrypt_key(&secret)?;
        let index = db.allocate_child_index()?;
        let child = root.derive_child(index);

        let public_key = child.public_key();
        let address = Address::from_public_key(&public_key);
        let key = KeyData::new_encrypted(&secret, &child.secret_key(), Some(address), false)?;

        db.add_account(account_name, public_key)?;
        db.store_key(key)?;

        info!("created account '{}'", account_name);
        Ok(public_key)
    }

    /// Derive another key under an existing account, for receive-only
    /// use: the key is excluded from the stealth-transfer protocol but
    /// can receive payments directly.
    pub fn get_new_address(&mut self, account_name: &str) -> Result<Address, WalletError> {
        self.require_open()?;
        let secret = self.require_unlocked()?;

        let db = self.db_mut()?;
        let account = db
            .lookup_account(account_name)
            .cloned()
            .ok_or_else(|| WalletError::AccountNotFound {
                name: account_name.to_string(),
            })?;

        let root = db
            .master_key()
            .ok_or(WalletError::MasterKeyNotFound)?
            .decrypt_key(&secret)?;
        let index = db.allocate_child_index()?;
        let child = root.derive_child(index);

        let address = Address::from_public_key(&child.public_key());
        let key = KeyData::new_encrypted(
            &secret,
            &child.secret_key(),
            Some(account.account_address()),
            true,
        )?;
        db.store_key(key)?;

        Ok(address)
    }

    /// Record an account for which this wallet holds no private key.
    ///
    /// Does not require the wallet to be unlocked, since no secret
    /// material is created. Re-adding an existing name succeeds only if
    /// it is bound to the same key.
    pub fn add_contact(&mut self, account_name: &str, public_key: PublicKey) -> Result<(), WalletError> {
        let address = Address::from_public_key(&public_key);
        let db = self.db_mut()?;

        let bound_address = db
            .lookup_account(account_name)
            .map(AccountRecord::account_address);
        match bound_address {
            Some(bound) if bound != address => Err(WalletError::AccountKeyMismatch {
                name: account_name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                db.add_account(account_name, public_key)?;
                if db.lookup_key(&address).is_none() {
                    db.store_key(KeyData::new_contact(public_key, Some(address)))?;
                }
                info!("added contact '{}'", account_name);
                Ok(())
            }
        }
    }

    /// Rebind an account name. `old_name` must exist and `new_name` must
    /// be free.
    pub fn rename_account(&mut self, old_name: &str, new_name: &str) -> Result<(), WalletError> {
        let db = self.db_mut()?;
        if db.lookup_account(old_name).is_none() {
            return Err(WalletError::AccountNotFound {
                name: old_name.to_string(),
            });
        }
        if db.lookup_account(new_name).is_some() {
            return Err(WalletError::AccountExists {
                name: new_name.to_string(),
            });
        }
        db.rename_account(old_name, new_name)?;
        info!("renamed account '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// File a foreign private key in the wallet.
    ///
    /// A non-empty `account_name` must name an existing account. The
    /// import is idempotent: re-importing a key already filed under the
    /// same account returns its public key unchanged, while importing it
    /// under a different owner is rejected.
    pub fn import_private_key(
        &mut self,
        key: SecretKey,
        account_name: &str,
    ) -> Result<PublicKey, WalletError> {
        self.require_open()?;
        let secret = self.require_unlocked()?;

        let db = self.db_mut()?;
        let account = if account_name.is_empty() {
            None
        } else {
            Some(db.lookup_account(account_name).cloned().ok_or_else(|| {
                WalletError::AccountNotFound {
                    name: account_name.to_string(),
                }
            })?)
        };

        let public_key = key.public_key(&Secp256k1::new());
        let address = Address::from_public_key(&public_key);

        if let Some(existing) = db.lookup_key(&address) {
            let target = account.as_ref().map(AccountRecord::account_address);
            if existing.account_address() != target {
                return Err(WalletError::KeyAccountMismatch { address });
            }
            return Ok(existing.public_key());
        }

        let key_data = KeyData::new_encrypted(
            &secret,
            &key,
            account.as_ref().map(AccountRecord::account_address),
            false,
        )?;
        db.store_key(key_data)?;

        info!("imported private key for address {}", address);
        Ok(public_key)
    }

    /// Decode a WIF private key and file it, validating the trailing
    /// checksum first.
    pub fn import_wif_private_key(
        &mut self,
        wif_key: &str,
        account_name: &str,
    ) -> Result<PublicKey, WalletError> {
        self.require_open()?;
        self.require_unlocked()?;

        let key = wif::decode_wif(wif_key)?;
        self.import_private_key(key, account_name)
    }

    /// Create or extend an account from an existing foreign key.
    ///
    /// If the account already exists, the imported key must match its
    /// recorded address; otherwise the account is created around the key
    /// first.
    pub fn import_account(
        &mut self,
        account_name: &str,
        wif_key: &str,
    ) -> Result<PublicKey, WalletError> {
        self.require_open()?;
        self.require_unlocked()?;

        let key = wif::decode_wif(wif_key)?;
        let public_key = key.public_key(&Secp256k1::new());
        let address = Address::from_public_key(&public_key);

        let bound_address = self
            .db()?
            .lookup_account(account_name)
            .map(AccountRecord::account_address);
        match bound_address {
            Some(bound) if bound != address => {
                return Err(WalletError::AccountKeyMismatch {
                    name: account_name.to_string(),
                });
            }
            Some(_) => {}
            None => {
                self.db_mut()?.add_account(account_name, public_key)?;
            }
        }

        self.import_private_key(key, account_name)
    }

    pub fn lookup_account(&self, account_name: &str) -> Result<Option<&AccountRecord>, WalletError> {
        Ok(self.db()?.lookup_account(account_name))
    }

    pub fn lookup_key(&self, address: &Address) -> Result<Option<&KeyData>, WalletError> {
        Ok(self.db()?.lookup_key(address))
    }

    /// Dump all records, still encrypted, as pretty JSON.
    pub fn export_to_json(&self, export_path: &Path) -> Result<(), WalletError> {
        self.db()?.export_to_json(export_path)?;
        Ok(())
    }

    fn require_open(&self) -> Result<(), WalletError> {
        if self.db.is_some() {
            Ok(())
        } else {
            Err(WalletError::NotOpen)
        }
    }

    fn require_unlocked(&self) -> Result<PassphraseSecret, WalletError> {
        self.lock_state.passphrase_secret()
    }

    fn db(&self) -> Result<&WalletDb, WalletError> {
        self.db.as_ref().ok_or(WalletError::NotOpen)
    }

    fn db_mut(&mut self) -> Result<&mut WalletDb, WalletError> {
        self.db.as_mut().ok_or(WalletError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::extended_key::ExtendedPrivateKey;
    use super::*;
    use crate::tests::unit_test_data_directory;

    const PASSPHRASE: &str = "correcthorsebattery";

    fn test_wallet() -> Wallet {
        Wallet::new(unit_test_data_directory().root_dir_path())
    }

    async fn created_and_unlocked(timeout: Duration) -> Wallet {
        let mut wallet = test_wallet();
        wallet.create("default", PASSPHRASE, None).await.unwrap();
        wallet.unlock(timeout, PASSPHRASE).unwrap();
        wallet
    }

    fn some_wif() -> String {
        wif::encode_wif(&ExtendedPrivateKey::from_seed(b"imported key").secret_key())
    }

    #[tokio::test(start_paused = true)]
    async fn account_lifecycle_scenario() {
        let mut wallet = test_wallet();
        wallet.create("default", PASSPHRASE, None).await.unwrap();
        assert!(wallet.is_open());
        assert!(wallet.is_locked());
        assert_eq!(wallet.get_wallet_name().unwrap(), "default");

        wallet.unlock(Duration::from_secs(5), PASSPHRASE).unwrap();
        assert!(wallet.is_unlocked());

        let alice_key = wallet.create_account("alice").unwrap();
        let alice_address = Address::from_public_key(&alice_key);

        let receive_address = wallet.get_new_address("alice").unwrap();
        assert_ne!(receive_address, alice_address);

        let receive_key = wallet
            .lookup_key(&receive_address)
            .unwrap()
            .cloned()
            .unwrap();
        assert_eq!(receive_key.account_address(), Some(alice_address));
        assert!(receive_key.is_receive_only());

        wallet.rename_account("alice", "alicia").unwrap();
        assert!(wallet.lookup_account("alice").unwrap().is_none());
        assert_eq!(
            wallet
                .lookup_account("alicia")
                .unwrap()
                .unwrap()
                .account_address(),
            alice_address
        );
    }

    #[tokio::test]
    async fn create_rejects_existing_wallet_and_weak_passphrase() {
        let mut wallet = test_wallet();
        wallet.create("default", PASSPHRASE, None).await.unwrap();

        assert!(matches!(
            wallet.create("default", PASSPHRASE, None).await,
            Err(WalletError::WalletExists { .. })
        ));
        assert!(matches!(
            wallet.create("other", "too short", None).await,
            Err(WalletError::WeakPassphrase { .. })
        ));
    }

    #[tokio::test]
    async fn unlock_preconditions_are_reported() {
        let mut wallet = test_wallet();
        assert!(matches!(
            wallet.unlock(Duration::from_secs(5), PASSPHRASE),
            Err(WalletError::NotOpen)
        ));

        wallet.create("default", PASSPHRASE, None).await.unwrap();
        assert!(matches!(
            wallet.unlock(Duration::from_secs(5), "short"),
            Err(WalletError::WeakPassphrase { .. })
        ));
        assert!(matches!(
            wallet.unlock(Duration::from_millis(500), PASSPHRASE),
            Err(WalletError::UnlockTimeoutTooShort { .. })
        ));
        assert!(wallet.is_locked());
    }

    #[tokio::test]
    async fn failed_unlock_fails_closed() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;
        assert!(wallet.is_unlocked());

        // a bad attempt must drop an existing unlock window
        assert!(matches!(
            wallet.unlock(Duration::MAX, "wrong but long enough"),
            Err(WalletError::InvalidPassphrase)
        ));
        assert!(wallet.is_locked());
        assert!(matches!(
            wallet.create_account("alice"),
            Err(WalletError::Locked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn wallet_relocks_after_the_timeout() {
        let mut wallet = created_and_unlocked(Duration::from_secs(1)).await;
        assert!(wallet.is_unlocked());

        sleep(Duration::from_millis(1400)).await;

        assert!(wallet.is_locked());
        assert_eq!(wallet.unlocked_until(), LockTime::Now);
        assert!(matches!(
            wallet.create_account("alice"),
            Err(WalletError::Locked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn maximum_timeout_never_relocks() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;
        assert_eq!(wallet.unlocked_until(), LockTime::Never);

        sleep(Duration::from_secs(3600)).await;
        assert!(wallet.is_unlocked());

        wallet.lock();
        assert!(wallet.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn renewed_unlock_extends_the_window() {
        let mut wallet = created_and_unlocked(Duration::from_secs(1)).await;

        sleep(Duration::from_millis(500)).await;
        wallet.unlock(Duration::from_secs(10), PASSPHRASE).unwrap();

        sleep(Duration::from_millis(1000)).await;
        assert!(wallet.is_unlocked());

        sleep(Duration::from_secs(10)).await;
        assert!(wallet.is_locked());
    }

    #[tokio::test]
    async fn explicit_lock_is_immediate() {
        let mut wallet = created_and_unlocked(Duration::from_secs(60)).await;

        wallet.lock();

        assert!(wallet.is_locked());
        assert!(matches!(
            wallet.import_wif_private_key(&some_wif(), ""),
            Err(WalletError::Locked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_the_relocker_and_reopen_starts_locked() {
        let mut wallet = created_and_unlocked(Duration::from_secs(60)).await;
        let wallet_path = wallet.get_wallet_filename().unwrap();

        wallet.close().await;
        assert!(!wallet.is_open());
        assert!(wallet.is_locked());
        assert!(wallet.relocker.is_none());

        wallet.open_file(&wallet_path).await.unwrap();
        assert!(wallet.is_open());
        assert!(wallet.is_locked());
        wallet.unlock(Duration::from_secs(5), PASSPHRASE).unwrap();
        assert!(wallet.is_unlocked());
    }

    #[tokio::test]
    async fn opening_a_missing_wallet_fails() {
        let mut wallet = test_wallet();
        assert!(matches!(
            wallet.open("no such wallet").await,
            Err(WalletError::WalletNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn import_is_idempotent_per_account_and_conflicts_across() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;
        wallet.create_account("alice").unwrap();
        wallet.create_account("bob").unwrap();

        let key = ExtendedPrivateKey::from_seed(b"imported key").secret_key();

        let first = wallet.import_private_key(key, "alice").unwrap();
        let second = wallet.import_private_key(key, "alice").unwrap();
        assert_eq!(first, second);

        assert!(matches!(
            wallet.import_private_key(key, "bob"),
            Err(WalletError::KeyAccountMismatch { .. })
        ));
        assert!(matches!(
            wallet.import_private_key(key, "nobody"),
            Err(WalletError::AccountNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn wif_import_matches_the_original_key() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;

        let key = ExtendedPrivateKey::from_seed(b"imported key").secret_key();
        let imported = wallet
            .import_wif_private_key(&wif::encode_wif(&key), "")
            .unwrap();

        assert_eq!(imported, key.public_key(&Secp256k1::new()));
    }

    #[tokio::test]
    async fn corrupted_wif_is_rejected() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;

        let mut raw = bs58::decode(some_wif()).into_vec().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let corrupted = bs58::encode(&raw).into_string();

        assert!(matches!(
            wallet.import_wif_private_key(&corrupted, ""),
            Err(WalletError::ChecksumMismatch)
        ));
        assert!(matches!(
            wallet.import_wif_private_key("definitely not wif!", ""),
            Err(WalletError::MalformedEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn import_account_creates_or_verifies_the_binding() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;

        let carol_wif = some_wif();
        let imported = wallet.import_account("carol", &carol_wif).unwrap();
        assert_eq!(
            wallet
                .lookup_account("carol")
                .unwrap()
                .unwrap()
                .public_key(),
            imported
        );

        // same key again: fine
        wallet.import_account("carol", &carol_wif).unwrap();

        // a different key may not attach to the existing name
        let other_wif =
            wif::encode_wif(&ExtendedPrivateKey::from_seed(b"another key").secret_key());
        assert!(matches!(
            wallet.import_account("carol", &other_wif),
            Err(WalletError::AccountKeyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn contacts_work_while_locked() {
        let mut wallet = test_wallet();
        wallet.create("default", PASSPHRASE, None).await.unwrap();
        assert!(wallet.is_locked());

        let public_key = ExtendedPrivateKey::from_seed(b"contact").public_key();
        wallet.add_contact("dave", public_key).unwrap();
        wallet.add_contact("dave", public_key).unwrap();

        let address = Address::from_public_key(&public_key);
        let record = wallet.lookup_key(&address).unwrap().cloned().unwrap();
        assert!(!record.has_private_key());

        let other = ExtendedPrivateKey::from_seed(b"other contact").public_key();
        assert!(matches!(
            wallet.add_contact("dave", other),
            Err(WalletError::AccountKeyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn brainkey_wallets_derive_identical_accounts() {
        let brainkey = "nine mute ponies carry the chest";

        let mut first = test_wallet();
        first.create("one", PASSPHRASE, Some(brainkey)).await.unwrap();
        first.unlock(Duration::MAX, PASSPHRASE).unwrap();

        let mut second = test_wallet();
        second.create("two", PASSPHRASE, Some(brainkey)).await.unwrap();
        second.unlock(Duration::MAX, PASSPHRASE).unwrap();

        assert_eq!(
            first.create_account("alice").unwrap(),
            second.create_account("alice").unwrap()
        );
    }

    #[tokio::test]
    async fn changed_passphrase_replaces_the_old_one() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;

        let key = ExtendedPrivateKey::from_seed(b"imported key").secret_key();
        let imported = wallet.import_private_key(key, "").unwrap();
        let address = Address::from_public_key(&imported);

        wallet.change_passphrase("an even better passphrase").unwrap();
        assert!(wallet.is_unlocked());

        wallet.lock();
        assert!(matches!(
            wallet.unlock(Duration::MAX, PASSPHRASE),
            Err(WalletError::InvalidPassphrase)
        ));
        wallet
            .unlock(Duration::MAX, "an even better passphrase")
            .unwrap();

        // previously imported material must still decrypt
        let secret = wallet.require_unlocked().unwrap();
        let record = wallet.lookup_key(&address).unwrap().cloned().unwrap();
        assert_eq!(record.decrypt_private_key(&secret).unwrap(), key);

        wallet.create_account("alice").unwrap();
    }

    #[tokio::test]
    async fn records_survive_close_and_reopen() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;
        let wallet_path = wallet.get_wallet_filename().unwrap();
        let alice_key = wallet.create_account("alice").unwrap();

        wallet.close().await;
        wallet.open_file(&wallet_path).await.unwrap();
        wallet.unlock(Duration::MAX, PASSPHRASE).unwrap();

        assert_eq!(
            wallet
                .lookup_account("alice")
                .unwrap()
                .unwrap()
                .public_key(),
            alice_key
        );
        assert_ne!(wallet.create_account("bob").unwrap(), alice_key);
    }

    #[tokio::test]
    async fn export_writes_a_json_dump() {
        let mut wallet = created_and_unlocked(Duration::MAX).await;
        wallet.create_account("alice").unwrap();

        let export_path = wallet
            .get_wallet_filename()
            .unwrap()
            .with_extension("export.json");
        wallet.export_to_json(&export_path).unwrap();

        let dump: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
        assert!(dump.get("master_key").unwrap().is_object());
        assert_eq!(dump.get("accounts").unwrap().as_object().unwrap().len(), 1);
    }
}
