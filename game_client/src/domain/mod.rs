// Domain layer: vessel, world and economy rules for the mining client.

pub mod energy;
pub mod errors;
pub mod movement;
pub mod nodes;
pub mod ports;
pub mod progression;
pub mod resources;
pub mod state;
pub mod trade;
pub mod tuning;

pub use movement::{MovementIntent, PlayerPosition};
pub use nodes::{NodeId, ResourceNode};
pub use resources::{ResourceAmounts, ResourceType};
pub use state::{ConnectionStatus, GamePhase, LocalSnapshot, PlayerStats};
