// Domain-level errors for client workflows.

use crate::domain::nodes::NodeId;
use crate::domain::state::GamePhase;
use thiserror::Error;

/// Why a mining action did not happen. Surfaced as transient signals only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("no resource node in range")]
    NoTarget,
    #[error("cannot mine while {}", .0.as_str())]
    Busy(GamePhase),
    #[error("storage full")]
    StorageFull,
    #[error("out of energy")]
    NoEnergy,
    #[error("node {0} is depleted")]
    NodeDepleted(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("no wallet connected")]
    NoWallet,
    #[error("nothing to trade")]
    NothingToTrade,
    #[error("cannot trade while {}", .0.as_str())]
    Busy(GamePhase),
    #[error("trade failed: {0}")]
    Backend(#[from] BackendError),
}

/// Terminal failures of the upgrade pipeline. Every variant reads as a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("you must upgrade sequentially (tier {current} can only move to tier {})", .current + 1)]
    NonSequential { current: u8, target: u8 },
    #[error("submarine is already at the maximum tier")]
    MaxTierReached,
    #[error("insufficient funds: balance {balance}, upgrade costs {cost}")]
    InsufficientFunds { balance: u64, cost: u64 },
    #[error("upgrade rejected in wallet")]
    Rejected,
    #[error("insufficient gas for the upgrade transaction")]
    InsufficientGas,
    #[error("no wallet connected")]
    NoWallet,
    #[error("cannot upgrade while {}", .0.as_str())]
    Busy(GamePhase),
    #[error("upgrade cancelled")]
    Cancelled,
    #[error("upgrade failed: {0}")]
    Failed(String),
}

/// Failures reported by the ledger capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("transaction rejected by user")]
    UserRejected,
    #[error("insufficient gas")]
    InsufficientGas,
    #[error("no revertible balance available on chain")]
    NoRevertibleBalance,
    #[error("call exception: {0}")]
    CallException(String),
    #[error("ledger call timed out")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Transport(String),
}

impl LedgerError {
    /// Fatal errors abort the upgrade; the rest fall back to signed authorization.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::UserRejected | LedgerError::InsufficientGas)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("signature request rejected")]
    Rejected,
    #[error("signing timed out")]
    Timeout,
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("signature not accepted")]
    Unauthorized,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("you must upgrade sequentially")]
    NonSequential,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("backend timed out")]
    Timeout,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Errors worth retrying against an idempotent endpoint.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Timeout | BackendError::Unavailable(_))
    }
}
