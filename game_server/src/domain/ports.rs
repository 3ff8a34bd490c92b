// Outbound ports for the session server. Adapters live in interface_adapters.

use crate::domain::state::Account;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The signature is malformed or does not recover to any address.
    Invalid,
    Unavailable,
}

#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Returns the address that produced `signature` over `message`.
    async fn verify(&self, message: &str, signature: &str) -> Result<String, VerifyError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, address: &str) -> Result<Option<Account>, String>;
    /// Writes `account` only if the stored version still equals `expected_version`
    /// (`None` means the account must not exist yet). Returns false on a conflict.
    async fn save(&self, account: &Account, expected_version: Option<u64>) -> Result<bool, String>;
}
