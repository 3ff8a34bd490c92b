// Interface adapters: wire protocol, outbound clients, persistence and input sources.

pub mod autopilot;
pub mod clients;
pub mod input;
pub mod persistence;
pub mod protocol;
