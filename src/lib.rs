//! Key custody core for the Aegis wallet.
//!
//! This crate protects a hierarchy of private keys behind a single user
//! passphrase: it creates and validates the password-encrypted master
//! key, derives and imports account keys (brainkey, WIF, raw), and
//! enforces a time-bounded unlock window with a background auto-relock
//! task. Transaction construction, signing, balances, and networking are
//! consumers of the unlocked key material and live elsewhere.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use aegis_wallet::config_models::data_directory::DataDirectory;
//! use aegis_wallet::state::wallet::Wallet;
//!
//! # async fn demo() -> Result<(), aegis_wallet::state::wallet::error::WalletError> {
//! let data_dir = DataDirectory::get(None)?;
//! let mut wallet = Wallet::new(data_dir.root_dir_path());
//!
//! wallet.create("default", "correcthorsebattery", None).await?;
//! wallet.unlock(Duration::from_secs(300), "correcthorsebattery")?;
//! let alice = wallet.create_account("alice")?;
//! println!("alice pays to {alice}");
//! wallet.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config_models;
pub mod state;

pub use state::wallet::address::Address;
pub use state::wallet::error::WalletError;
pub use state::wallet::lock_schedule::LockTime;
pub use state::wallet::Wallet;
