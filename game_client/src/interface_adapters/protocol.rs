// Wire protocol DTOs for the session WebSocket and conversions into engine types.
// Keep field names in sync with the session server's protocol module.

use crate::domain::{NodeId, PlayerPosition, ResourceNode, ResourceType};
use crate::use_cases::types::{KnownPlayer, MinedEvent, SessionSnapshot};
use crate::use_cases::{OutboundMessage, ServerEvent};
use serde::{Deserialize, Serialize};

/// Messages the session server sends to the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    SessionSnapshot(SessionSnapshotDto),
    ResourceMined(ResourceMinedDto),
    Error(ErrorDto),
}

/// Messages the client sends to the session server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
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

impl From<PositionDto> for PlayerPosition {
    fn from(position: PositionDto) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: position.rotation,
        }
    }
}

impl From<PlayerPosition> for PositionDto {
    fn from(position: PlayerPosition) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: position.rotation,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDto {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
    pub amount: u32,
    #[serde(default)]
    pub depleted: bool,
    pub radius: f32,
}

impl From<NodeDto> for ResourceNode {
    fn from(node: NodeDto) -> Self {
        let mut converted =
            ResourceNode::new(node.id, node.x, node.y, node.kind.into(), node.amount, node.radius);
        // Depletion is terminal; trust the server flag even if an amount lingers.
        if node.depleted {
            converted.settle_remaining(0);
        }
        converted
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub address: String,
    pub position: PositionDto,
    #[serde(default = "default_tier")]
    pub tier: u8,
}

fn default_tier() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotDto {
    pub session_id: String,
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub players: Vec<PlayerDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMinedDto {
    pub node_id: NodeId,
    pub address: String,
    pub amount: u32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
    pub remaining: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub message: String,
    #[serde(default)]
    pub node_id: Option<NodeId>,
}

impl From<ServerMessage> for ServerEvent {
    fn from(message: ServerMessage) -> Self {
        match message {
            ServerMessage::SessionSnapshot(snapshot) => ServerEvent::Snapshot(SessionSnapshot {
                session_id: snapshot.session_id,
                nodes: snapshot.nodes.into_iter().map(ResourceNode::from).collect(),
                players: snapshot
                    .players
                    .into_iter()
                    .map(|player| KnownPlayer {
                        address: player.address,
                        position: player.position.into(),
                        tier: player.tier,
                    })
                    .collect(),
            }),
            ServerMessage::ResourceMined(mined) => ServerEvent::ResourceMined(MinedEvent {
                node_id: mined.node_id,
                address: mined.address,
                amount: mined.amount,
                kind: mined.kind.into(),
                remaining: mined.remaining,
            }),
            ServerMessage::Error(error) => ServerEvent::Error {
                message: error.message,
                node_id: error.node_id,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionDto {
    pub address: String,
    pub session_id: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDto {
    pub position: PositionDto,
    pub address: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MineDto {
    pub node_id: NodeId,
    pub session_id: String,
    pub address: String,
    pub amount: u32,
    #[serde(rename = "type")]
    pub kind: ResourceTypeDto,
}

impl From<OutboundMessage> for ClientMessage {
    fn from(message: OutboundMessage) -> Self {
        match message {
            OutboundMessage::JoinSession {
                address,
                session_id,
                message,
                signature,
            } => ClientMessage::JoinSession(JoinSessionDto {
                address,
                session_id,
                message,
                signature,
            }),
            OutboundMessage::Move {
                position,
                address,
                session_id,
            } => ClientMessage::Move(MoveDto {
                position: position.into(),
                address,
                session_id,
            }),
            OutboundMessage::Mine {
                node_id,
                session_id,
                address,
                amount,
                kind,
            } => ClientMessage::Mine(MineDto {
                node_id,
                session_id,
                address,
                amount,
                kind: kind.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mine_serializes_with_kebab_tag_and_type_field() {
        let message = ClientMessage::from(OutboundMessage::Mine {
            node_id: 4,
            session_id: "s-1".into(),
            address: "0xabc".into(),
            amount: 5,
            kind: ResourceType::Manganese,
        });

        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(
            value,
            json!({
                "type": "mine",
                "data": {
                    "nodeId": 4,
                    "sessionId": "s-1",
                    "address": "0xabc",
                    "amount": 5,
                    "type": "manganese"
                }
            })
        );
    }

    #[test]
    fn join_session_uses_camel_case_fields() {
        let message = ClientMessage::from(OutboundMessage::JoinSession {
            address: "0xabc".into(),
            session_id: "s-1".into(),
            message: "hello".into(),
            signature: "sig".into(),
        });

        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(value["type"], "join-session");
        assert_eq!(value["data"]["sessionId"], "s-1");
    }

    #[test]
    fn snapshot_decodes_into_engine_event() {
        let raw = json!({
            "type": "session-snapshot",
            "data": {
                "sessionId": "s-1",
                "nodes": [
                    {"id": 1, "x": 100.0, "y": 200.0, "type": "cobalt", "amount": 0, "depleted": true, "radius": 20.0},
                    {"id": 2, "x": 300.0, "y": 400.0, "type": "copper", "amount": 30, "depleted": false, "radius": 25.0}
                ],
                "players": [
                    {"address": "0xdef", "position": {"x": 60.0, "y": 70.0, "rotation": 1.5}, "tier": 3}
                ]
            }
        })
        .to_string();

        let message: ServerMessage = serde_json::from_str(&raw).expect("decode");
        let ServerEvent::Snapshot(snapshot) = ServerEvent::from(message) else {
            panic!("expected snapshot");
        };

        assert_eq!(snapshot.session_id, "s-1");
        assert!(snapshot.nodes[0].depleted);
        assert_eq!(snapshot.nodes[1].kind, ResourceType::Copper);
        assert_eq!(snapshot.nodes[1].amount, 30);
        assert_eq!(snapshot.players[0].tier, 3);
    }

    #[test]
    fn error_without_node_id_decodes() {
        let raw = r#"{"type":"error","data":{"message":"session not found"}}"#;

        let message: ServerMessage = serde_json::from_str(raw).expect("decode");

        assert_eq!(
            ServerEvent::from(message),
            ServerEvent::Error {
                message: "session not found".into(),
                node_id: None
            }
        );
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let raw = r#"{"type":"teleport","data":{}}"#;

        assert!(serde_json::from_str::<ServerMessage>(raw).is_err());
    }
}
