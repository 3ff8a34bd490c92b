use async_trait::async_trait;

use crate::domain::errors::{BackendError, LedgerError, SignError};
use crate::domain::resources::ResourceAmounts;
use crate::domain::state::LocalSnapshot;

// Port for the externally held wallet key.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, message: &str) -> Result<String, SignError>;
}

// Handle to a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: String,
}

// Port for the on-chain token ledger. Both writes need an explicit confirmation wait.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn approve_allowance(&self, amount: u64) -> Result<TxHandle, LedgerError>;
    async fn upgrade(&self, tier: u8) -> Result<TxHandle, LedgerError>;
    async fn wait_for_confirmation(&self, tx: &TxHandle) -> Result<(), LedgerError>;
}

// Signed-message credentials attached to every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub address: String,
    pub message: String,
    pub signature: String,
}

// Authoritative tier and balance for a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmarineRecord {
    pub tier: u8,
    pub balance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeReceipt {
    pub earned: u64,
    pub balance: u64,
}

// Port for the authoritative backend; the only writer of tier and balance.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_balance(&self, auth: &SignedMessage) -> Result<u64, BackendError>;
    async fn get_submarine(&self, auth: &SignedMessage) -> Result<SubmarineRecord, BackendError>;
    async fn upgrade_submarine(
        &self,
        auth: &SignedMessage,
        target_tier: u8,
        on_chain_tx: Option<&str>,
    ) -> Result<SubmarineRecord, BackendError>;
    async fn trade(
        &self,
        auth: &SignedMessage,
        resources: ResourceAmounts,
    ) -> Result<TradeReceipt, BackendError>;
}

// Port for the per-user resume record.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<LocalSnapshot>, String>;
    async fn save(&self, user_id: &str, snapshot: &LocalSnapshot) -> Result<(), String>;
}
