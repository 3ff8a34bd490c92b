// Domain layer: session world, accounts and economy rules.

pub mod errors;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use state::{
    Account, NodeId, NodeSnapshot, PlayerSnapshot, ResourceAmounts, ResourceType, SessionNode,
    SessionPlayer,
};
