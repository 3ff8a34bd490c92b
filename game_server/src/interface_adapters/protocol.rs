// Wire protocol DTOs and conversions for session WebSocket messages.
// HTTP backend DTOs live with their handlers in `net::backend`.

use crate::domain::{NodeId, NodeSnapshot, PlayerSnapshot, ResourceType};
use crate::use_cases::types::{MinedEvent, SessionSnapshot};
use crate::use_cases::SessionMessage;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    SessionSnapshot(SessionSnapshotDto),
    ResourceMined(ResourceMinedDto),
    Error(ErrorDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    // Must be the first message on a connection.
    JoinSession(JoinSessionDto),
    Move(MoveDto),
    Mine(MineDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTypeDto {
    Nickel,
    Cobalt,
    Copper,
    Manganese,
}

impl From<ResourceTypeDto> for ResourceType {
    fn from(kind: ResourceTypeDto) -> Self {
        match kind {
            ResourceTypeDto::Nickel => ResourceType::Nickel,
            ResourceTypeDto::Cobalt => ResourceType::Cobalt,
            ResourceTypeDto::Copper => ResourceType::Copper,
            ResourceTypeDto::Manganese => ResourceType::Manganese,
        }
    }
}

impl From<ResourceType> for ResourceTypeDto {
    fn from(kind: ResourceType) -> Self {
        match kind {
            ResourceType::Nickel => ResourceTypeDto::Nickel,
            ResourceType::Cobalt => ResourceTypeDto::Cobalt,
            ResourceType::Copper => ResourceTypeDto::Copper,
            ResourceType::Manganese => ResourceTypeDto::Manganese,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDto {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
    pub amount: u32,
    pub depleted: bool,
    pub radius: f32,
}

impl From<&NodeSnapshot> for NodeDto {
    fn from(node: &NodeSnapshot) -> Self {
        Self {
            id: node.id,
            x: node.x,
            y: node.y,
            kind: node.kind.into(),
            amount: node.amount,
            depleted: node.depleted,
            radius: node.radius,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub address: String,
    pub position: PositionDto,
    pub tier: u8,
}

impl From<&PlayerSnapshot> for PlayerDto {
    fn from(player: &PlayerSnapshot) -> Self {
        Self {
            address: player.address.clone(),
            position: PositionDto {
                x: player.x,
                y: player.y,
                rotation: player.rotation,
            },
            tier: player.tier,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotDto {
    pub session_id: String,
    pub nodes: Vec<NodeDto>,
    pub players: Vec<PlayerDto>,
}

impl From<&SessionSnapshot> for SessionSnapshotDto {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id.clone(),
            nodes: snapshot.nodes.iter().map(NodeDto::from).collect(),
            players: snapshot.players.iter().map(PlayerDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMinedDto {
    pub node_id: NodeId,
    pub address: String,
    pub amount: u32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
    pub remaining: u32,
}

impl From<&MinedEvent> for ResourceMinedDto {
    fn from(mined: &MinedEvent) -> Self {
        Self {
            node_id: mined.node_id,
            address: mined.address.clone(),
            amount: mined.amount,
            kind: mined.kind.into(),
            remaining: mined.remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
}

impl From<&SessionMessage> for ServerMessage {
    fn from(message: &SessionMessage) -> Self {
        match message {
            SessionMessage::Snapshot(snapshot) => ServerMessage::SessionSnapshot(snapshot.into()),
            SessionMessage::ResourceMined(mined) => ServerMessage::ResourceMined(mined.into()),
            SessionMessage::Error { message, node_id } => ServerMessage::Error(ErrorDto {
                message: message.clone(),
                node_id: *node_id,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionDto {
    pub address: String,
    pub session_id: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDto {
    pub position: PositionDto,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineDto {
    pub node_id: NodeId,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub amount: u32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mine_message_parses_from_client_shape() {
        let raw = json!({
            "type": "mine",
            "data": {
                "nodeId": 4,
                "sessionId": "s-1",
                "address": "0xabc",
                "amount": 5,
                "type": "cobalt"
            }
        });

        let parsed: ClientMessage = serde_json::from_value(raw).expect("parse");

        let ClientMessage::Mine(mine) = parsed else {
            panic!("expected mine");
        };
        assert_eq!(mine.node_id, 4);
        assert_eq!(mine.kind, ResourceTypeDto::Cobalt);
    }

    #[test]
    fn join_session_uses_kebab_tag() {
        let raw = json!({
            "type": "join-session",
            "data": {
                "address": "0xabc",
                "sessionId": "s-1",
                "message": "m",
                "signature": "sig"
            }
        });

        assert!(matches!(
            serde_json::from_value::<ClientMessage>(raw),
            Ok(ClientMessage::JoinSession(_))
        ));
    }

    #[test]
    fn resource_mined_serializes_with_type_field() {
        let message = ServerMessage::from(&SessionMessage::ResourceMined(MinedEvent {
            node_id: 2,
            address: "0xabc".into(),
            amount: 5,
            kind: ResourceType::Manganese,
            remaining: 10,
        }));

        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({
                "type": "resource-mined",
                "data": {
                    "nodeId": 2,
                    "address": "0xabc",
                    "amount": 5,
                    "type": "manganese",
                    "remaining": 10
                }
            })
        );
    }

    #[test]
    fn error_omits_missing_node_id() {
        let message = ServerMessage::from(&SessionMessage::Error {
            message: "nope".into(),
            node_id: None,
        });

        assert_eq!(
            serde_json::to_value(&message).expect("serialize"),
            json!({ "type": "error", "data": { "message": "nope" } })
        );
    }
}
