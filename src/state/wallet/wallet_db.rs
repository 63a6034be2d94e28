//! The durable record store backing a wallet.
//!
//! One JSON file per wallet, holding the master-key slot, the address →
//! key map, the name → account map, and the child-derivation counter.
//! Every mutation persists before returning. The handle is exclusively
//! owned by its wallet instance; no two instances may hold the same
//! underlying file open at once.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use super::address::Address;
use super::key_record::AccountRecord;
use super::key_record::KeyData;
use super::master_key::MasterKeyRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct WalletRecords {
    master_key: Option<MasterKeyRecord>,
    keys: BTreeMap<Address, KeyData>,
    accounts: BTreeMap<String, AccountRecord>,
    next_child_index: u64,
}

/// Handle on one wallet's record file.
#[derive(Debug)]
pub struct WalletDb {
    path: PathBuf,
    records: WalletRecords,
}

impl WalletDb {
    /// Open the record file at `path`, creating an empty record set if
    /// the file does not exist yet (nothing is written until the first
    /// mutation).
    pub fn open(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read wallet records from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to decode wallet records from {}", path.display()))?
        } else {
            WalletRecords::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn master_key(&self) -> Option<&MasterKeyRecord> {
        self.records.master_key.as_ref()
    }

    /// Fill the wallet's single master-key slot.
    pub fn store_master_key(&mut self, record: MasterKeyRecord) -> Result<()> {
        if self.records.master_key.is_some() {
            bail!("wallet at {} already holds a master key", self.path.display());
        }
        self.records.master_key = Some(record);
        self.persist()
    }

    pub fn lookup_key(&self, address: &Address) -> Option<&KeyData> {
        self.records.keys.get(address)
    }

    pub fn store_key(&mut self, key: KeyData) -> Result<()> {
        self.records.keys.insert(key.address(), key);
        self.persist()
    }

    pub fn lookup_account(&self, name: &str) -> Option<&AccountRecord> {
        self.records.accounts.get(name)
    }

    pub fn add_account(&mut self, name: &str, public_key: secp256k1::PublicKey) -> Result<()> {
        if self.records.accounts.contains_key(name) {
            bail!("account '{}' already exists", name);
        }
        self.records
            .accounts
            .insert(name.to_string(), AccountRecord::new(name, public_key));
        self.persist()
    }

    /// Rebind an account name. The rename is atomic: the in-memory maps
    /// are updated before the single persist.
    pub fn rename_account(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if self.records.accounts.contains_key(new_name) {
            bail!("account '{}' already exists", new_name);
        }
        let Some(mut record) = self.records.accounts.remove(old_name) else {
            bail!("account '{}' not found", old_name);
        };
        record.set_name(new_name);
        self.records.accounts.insert(new_name.to_string(), record);
        self.persist()
    }

    /// Hand out the next child-derivation index.
    pub fn allocate_child_index(&mut self) -> Result<u64> {
        let index = self.records.next_child_index;
        self.records.next_child_index += 1;
        self.persist()?;
        Ok(index)
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyData> {
        self.records.keys.values()
    }

    /// Swap in a re-encrypted master key and key set in one write
    /// (passphrase change). Either everything lands or nothing does.
    pub fn store_reencrypted(
        &mut self,
        master_key: MasterKeyRecord,
        keys: Vec<KeyData>,
    ) -> Result<()> {
        self.records.master_key = Some(master_key);
        self.records.keys = keys.into_iter().map(|key| (key.address(), key)).collect();
        self.persist()
    }

    /// Write a human-readable dump of all records to `path`.
    ///
    /// Private-key material stays encrypted in the dump.
    pub fn export_to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .context("failed to serialize wallet records for export")?;
        fs::write(path, json)
            .with_context(|| format!("failed to export wallet records to {}", path.display()))?;
        info!("exported wallet records to {}", path.display());
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.records)
            .context("failed to serialize wallet records")?;
        write_restricted(&self.path, &json)
    }
}

#[cfg(unix)]
/// Create the record file with permissions that keep other users on the
/// same machine away from the secrets.
fn write_restricted(path: &Path, contents: &str) -> Result<()> {
    use std::os::unix::prelude::OpenOptionsExt;
    fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create wallet file {}", path.display()))?;
    fs::write(path, contents).context("failed to write wallet file to disk")
}

#[cfg(not(unix))]
/// Create the record file, without Unix permission bits.
fn write_restricted(path: &Path, contents: &str) -> Result<()> {
    fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("failed to create wallet file {}", path.display()))?;
    fs::write(path, contents).context("failed to write wallet file to disk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::wallet::extended_key::ExtendedPrivateKey;
    use crate::state::wallet::passphrase::PassphraseSecret;
    use crate::tests::unit_test_wallet_path;

    fn db() -> WalletDb {
        WalletDb::open(&unit_test_wallet_path()).unwrap()
    }

    #[test]
    fn master_key_slot_holds_exactly_one_record() {
        let secret = PassphraseSecret::from_passphrase("correcthorsebattery");
        let mut db = db();

        assert!(db.master_key().is_none());
        db.store_master_key(MasterKeyRecord::generate(&secret).unwrap())
            .unwrap();
        assert!(db.master_key().is_some());
        assert!(db
            .store_master_key(MasterKeyRecord::generate(&secret).unwrap())
            .is_err());
    }

    #[test]
    fn records_survive_reopen() {
        let secret = PassphraseSecret::from_passphrase("correcthorsebattery");
        let path = unit_test_wallet_path();

        let address = {
            let mut db = WalletDb::open(&path).unwrap();
            db.store_master_key(MasterKeyRecord::generate(&secret).unwrap())
                .unwrap();

            let child = ExtendedPrivateKey::from_seed(b"persisted key");
            let key =
                KeyData::new_encrypted(&secret, &child.secret_key(), None, false).unwrap();
            let address = key.address();
            db.store_key(key).unwrap();
            db.add_account("alice", child.public_key()).unwrap();
            address
        };

        let db = WalletDb::open(&path).unwrap();
        assert!(db.master_key().unwrap().validate_passphrase(&secret));
        assert!(db.lookup_key(&address).is_some());
        assert_eq!(db.lookup_account("alice").unwrap().name(), "alice");
    }

    #[test]
    fn rename_moves_the_binding() {
        let mut db = db();
        let public_key = ExtendedPrivateKey::from_seed(b"rename").public_key();
        db.add_account("alice", public_key).unwrap();

        db.rename_account("alice", "alicia").unwrap();
        assert!(db.lookup_account("alice").is_none());
        let renamed = db.lookup_account("alicia").unwrap();
        assert_eq!(renamed.name(), "alicia");
        assert_eq!(renamed.public_key(), public_key);

        assert!(db.rename_account("alice", "bob").is_err());
        db.add_account("bob", ExtendedPrivateKey::from_seed(b"bob").public_key())
            .unwrap();
        assert!(db.rename_account("alicia", "bob").is_err());
    }

    #[test]
    fn child_indices_increase_and_persist() {
        let path = unit_test_wallet_path();
        {
            let mut db = WalletDb::open(&path).unwrap();
            assert_eq!(db.allocate_child_index().unwrap(), 0);
            assert_eq!(db.allocate_child_index().unwrap(), 1);
        }
        let mut db = WalletDb::open(&path).unwrap();
        assert_eq!(db.allocate_child_index().unwrap(), 2);
    }

    #[test]
    fn export_writes_readable_json() {
        let secret = PassphraseSecret::from_passphrase("correcthorsebattery");
        let mut db = db();
        db.store_master_key(MasterKeyRecord::generate(&secret).unwrap())
            .unwrap();

        let export_path = unit_test_wallet_path();
        db.export_to_json(&export_path).unwrap();

        let dump: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
        assert!(dump.get("master_key").is_some());
    }
}
