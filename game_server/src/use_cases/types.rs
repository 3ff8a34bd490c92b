// Use-case level inputs/outputs for the session world task.

use crate::domain::{NodeId, NodeSnapshot, PlayerSnapshot, ResourceType};
use axum::extract::ws::Utf8Bytes;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Join {
        conn_id: u64,
        address: String,
        tier: u8,
    },
    Leave {
        conn_id: u64,
    },
    Move {
        conn_id: u64,
        x: f32,
        y: f32,
        rotation: f32,
    },
    Mine {
        conn_id: u64,
        node_id: NodeId,
        amount: u32,
        kind: ResourceType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub nodes: Vec<NodeSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinedEvent {
    pub node_id: NodeId,
    pub address: String,
    pub amount: u32,
    pub kind: ResourceType,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    Snapshot(SessionSnapshot),
    ResourceMined(MinedEvent),
    Error {
        message: String,
        node_id: Option<NodeId>,
    },
}

/// One message out of the world task. `recipient: None` goes to every connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub recipient: Option<u64>,
    pub message: SessionMessage,
}

/// A serialized update, shared by every connection of the session.
#[derive(Debug, Clone)]
pub struct SessionFrame {
    pub recipient: Option<u64>,
    pub bytes: Utf8Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeReceipt {
    pub earned: u64,
    pub balance: u64,
}
