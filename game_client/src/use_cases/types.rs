// Use-case level inputs/outputs for the engine actor.

use crate::domain::energy::EnergyState;
use crate::domain::errors::{TradeError, UpgradeError};
use crate::domain::ports::TradeReceipt;
use crate::domain::{
    ConnectionStatus, GamePhase, NodeId, PlayerPosition, PlayerStats, ResourceAmounts,
    ResourceNode, ResourceType,
};
use crate::use_cases::upgrade::UpgradeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
}

/// Single-shot player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mine,
    /// `None` asks for the next tier.
    Upgrade { target_tier: Option<u8> },
    Trade,
    ToggleSidebar,
    CancelUpgrade,
    Disconnect,
}

/// Everything that can change engine state arrives as one of these.
#[derive(Debug)]
pub enum EngineCommand {
    Key { key: Key, pressed: bool },
    Action(Action),
    Server(ServerEvent),
    Connection(ConnectionStatus),
    UpgradeFinished {
        attempt: u64,
        result: Result<UpgradeOutcome, UpgradeError>,
    },
    TradeFinished {
        attempt: u64,
        result: Result<TradeReceipt, TradeError>,
    },
}

/// Authoritative session events, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Snapshot(SessionSnapshot),
    ResourceMined(MinedEvent),
    Error {
        message: String,
        node_id: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub nodes: Vec<ResourceNode>,
    pub players: Vec<KnownPlayer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnownPlayer {
    pub address: String,
    pub position: PlayerPosition,
    pub tier: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinedEvent {
    pub node_id: NodeId,
    pub address: String,
    pub amount: u32,
    pub kind: ResourceType,
    pub remaining: u32,
}

/// Messages the engine pushes to the authoritative session.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    JoinSession {
        address: String,
        session_id: String,
        message: String,
        signature: String,
    },
    Move {
        position: PlayerPosition,
        address: String,
        session_id: String,
    },
    Mine {
        node_id: NodeId,
        session_id: String,
        address: String,
        amount: u32,
        kind: ResourceType,
    },
}

/// Read-only state published for UI collaborators after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineView {
    pub position: PlayerPosition,
    pub stats: PlayerStats,
    pub resources: ResourceAmounts,
    pub balance: u64,
    pub target: Option<ResourceNode>,
    pub nodes: Vec<ResourceNode>,
    pub known_players: Vec<KnownPlayer>,
    pub phase: GamePhase,
    pub connection: ConnectionStatus,
    pub storage_percent: u8,
    pub storage_alert: bool,
    pub storage_full: bool,
    pub energy_alert: bool,
    pub energy_state: EnergyState,
    /// Latest session rejection, shown until its alert period runs out.
    pub session_rejection: Option<String>,
    pub sidebar_open: bool,
    pub last_error: Option<String>,
    pub pending_mines: usize,
}
