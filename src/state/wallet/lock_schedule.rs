//! Shared lock-lifecycle state and the auto-relock background task.
//!
//! The scheduled expiry, the cancellation flag, and the passphrase secret
//! are shared between the foreground caller (writer on unlock/lock) and
//! the relocker task (reader, and writer when the window expires). All
//! access goes through this module's synchronized state; the task and the
//! mutators never touch each other through raw references.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use zeroize::Zeroize;

use super::error::WalletError;
use super::passphrase::PassphraseSecret;

/// How often the relocker task checks the schedule.
pub const RELOCK_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The instant at which the wallet relocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTime {
    /// Locked (or about to be).
    Now,
    /// Unlocked until the given instant.
    At(Instant),
    /// Unlocked until an explicit lock.
    Never,
}

/// Lock state shared between the wallet and its relocker task.
#[derive(Debug)]
pub(crate) struct LockState {
    passphrase_secret: Mutex<PassphraseSecret>,
    schedule: Mutex<LockTime>,
    relock_cancelled: AtomicBool,
}

impl LockState {
    pub(crate) fn new() -> Self {
        Self {
            passphrase_secret: Mutex::new(PassphraseSecret::sentinel()),
            schedule: Mutex::new(LockTime::Now),
            relock_cancelled: AtomicBool::new(true),
        }
    }

    /// Wipe the secret, reset the schedule, and signal the relocker to
    /// stop. Idempotent; callable from any state.
    pub(crate) fn lock(&self) {
        self.passphrase_secret
            .lock()
            .expect("poisoned lock on passphrase secret")
            .zeroize();
        *self.schedule.lock().expect("poisoned lock on schedule") = LockTime::Now;
        self.relock_cancelled.store(true, Ordering::SeqCst);
    }

    /// Install a validated secret and its relock schedule.
    ///
    /// Concurrent unlocks race benignly: the last writer determines both
    /// the secret and the expiry.
    pub(crate) fn set_unlocked(&self, secret: PassphraseSecret, until: LockTime) {
        *self
            .passphrase_secret
            .lock()
            .expect("poisoned lock on passphrase secret") = secret;
        *self.schedule.lock().expect("poisoned lock on schedule") = until;
        self.relock_cancelled.store(false, Ordering::SeqCst);
    }

    /// Swap the secret without touching the schedule (passphrase change).
    pub(crate) fn replace_secret(&self, secret: PassphraseSecret) {
        *self
            .passphrase_secret
            .lock()
            .expect("poisoned lock on passphrase secret") = secret;
    }

    pub(crate) fn is_unlocked(&self) -> bool {
        !self
            .passphrase_secret
            .lock()
            .expect("poisoned lock on passphrase secret")
            .is_sentinel()
    }

    pub(crate) fn unlocked_until(&self) -> LockTime {
        *self.schedule.lock().expect("poisoned lock on schedule")
    }

    /// The current secret as an opaque decryption capability.
    ///
    /// Fails with [`WalletError::Locked`] when the wallet is locked, so
    /// secret material is reachable if and only if the wallet is
    /// unlocked.
    pub(crate) fn passphrase_secret(&self) -> Result<PassphraseSecret, WalletError> {
        let secret = self
            .passphrase_secret
            .lock()
            .expect("poisoned lock on passphrase secret");
        if secret.is_sentinel() {
            return Err(WalletError::Locked);
        }
        Ok(secret.clone())
    }

    fn relock_cancelled(&self) -> bool {
        self.relock_cancelled.load(Ordering::SeqCst)
    }

    fn relock_due(&self, now: Instant) -> bool {
        match self.unlocked_until() {
            LockTime::Now => true,
            LockTime::At(expiry) => now > expiry,
            LockTime::Never => false,
        }
    }
}

/// Spawn the background task enforcing the scheduled auto-lock.
///
/// At most one relocker runs per wallet; the caller only spawns when no
/// live task exists. The task terminates exactly when it observes expiry
/// (after performing the lock) or cancellation, re-reading the schedule
/// every poll so a later `unlock` can extend the window under it.
pub(crate) fn spawn_relocker(state: Arc<LockState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("relocker task started");
        loop {
            if state.relock_cancelled() {
                debug!("relocker task cancelled");
                return;
            }
            if state.relock_due(Instant::now()) {
                info!("unlock window expired, relocking wallet");
                state.lock();
                return;
            }
            sleep(RELOCK_POLL_INTERVAL).await;
        }
    })
}
