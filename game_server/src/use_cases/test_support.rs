use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::Account;
use crate::domain::ports::{AccountStore, SignatureVerifier, VerifyError};

pub(crate) type AccountTable = Arc<Mutex<HashMap<String, Account>>>;

const SIGNATURE_PREFIX: &str = "signed-by:";

/// Signature the fake verifier recovers to `address`.
pub(crate) fn signature_for(address: &str) -> String {
    format!("{SIGNATURE_PREFIX}{address}")
}

// Recovers the address embedded by `signature_for`; anything else is invalid.
#[derive(Clone, Copy, Default)]
pub(crate) struct FakeVerifier {
    pub unavailable: bool,
}

#[async_trait]
impl SignatureVerifier for FakeVerifier {
    async fn verify(&self, _message: &str, signature: &str) -> Result<String, VerifyError> {
        if self.unavailable {
            return Err(VerifyError::Unavailable);
        }
        signature
            .strip_prefix(SIGNATURE_PREFIX)
            .map(str::to_string)
            .ok_or(VerifyError::Invalid)
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub get: bool,
    pub save: bool,
    /// Number of saves reported as version conflicts before writes succeed.
    pub conflicts: usize,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    accounts: AccountTable,
    failures: FailureFlags,
    conflicts_left: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
            conflicts_left: Arc::new(AtomicUsize::new(0)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.conflicts_left.store(failures.conflicts, Ordering::SeqCst);
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_account(&self, account: Account) {
        let mut guard = self.accounts.lock().expect("accounts mutex poisoned");
        guard.insert(account.address.clone(), account);
    }

    pub(crate) fn get_test_account(&self, address: &str) -> Option<Account> {
        let guard = self.accounts.lock().expect("accounts mutex poisoned");
        guard.get(address).cloned()
    }

    /// Successful writes so far.
    pub(crate) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for RecordingStore {
    async fn get(&self, address: &str) -> Result<Option<Account>, String> {
        if self.failures.get {
            return Err("get failed".to_string());
        }

        let guard = self.accounts.lock().expect("accounts mutex poisoned");
        Ok(guard.get(address).cloned())
    }

    async fn save(&self, account: &Account, expected_version: Option<u64>) -> Result<bool, String> {
        if self.failures.save {
            return Err("save failed".to_string());
        }
        let conflict = self
            .conflicts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if conflict {
            return Ok(false);
        }

        let mut guard = self.accounts.lock().expect("accounts mutex poisoned");
        let current = guard.get(&account.address).map(|stored| stored.version);
        if current != expected_version {
            return Ok(false);
        }
        guard.insert(account.address.clone(), account.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
