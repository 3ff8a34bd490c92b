use crate::domain::state::{NodeId, ResourceType};
use thiserror::Error;

/// Failures of the authoritative account operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("signature does not match the claimed address")]
    Unauthorized,
    #[error("tier {target} does not follow current tier {current}")]
    NonSequential { current: u8, target: u8 },
    #[error("balance {balance} is below upgrade cost {cost}")]
    InsufficientFunds { balance: u64, cost: u64 },
    #[error("tier {0} is outside the tier ladder")]
    InvalidTier(u8),
    #[error("nothing to trade")]
    NothingToTrade,
    #[error("account storage failed: {0}")]
    Storage(String),
    #[error("signature verification unavailable")]
    AuthUnavailable,
}

/// Why a session refused a mine request. Sent back to the requester only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MineRejection {
    #[error("player has not joined the session")]
    NotJoined,
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is depleted")]
    Depleted(NodeId),
    #[error("node {node_id} holds {actual}, not {claimed}")]
    WrongType {
        node_id: NodeId,
        claimed: ResourceType,
        actual: ResourceType,
    },
    #[error("node {0} is out of range")]
    OutOfRange(NodeId),
    #[error("storage full")]
    StorageFull,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("mining temporarily unavailable")]
    Unavailable,
}
