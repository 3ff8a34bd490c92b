// Use cases layer: client workflows around the engine actor.

pub mod engine;
pub mod mining;
pub mod reconcile;
pub mod trade;
pub mod types;
pub mod upgrade;
pub mod world;

pub use engine::{EngineChannels, EngineDeps, EngineSettings, SessionIdentity, engine_task};
pub use types::{Action, EngineCommand, EngineView, Key, OutboundMessage, ServerEvent};
pub use world::ClientWorld;
