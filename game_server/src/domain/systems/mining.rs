// Session-side validation of mine requests.

use crate::domain::errors::MineRejection;
use crate::domain::state::{NodeId, ResourceType, SessionNode, SessionPlayer};
use crate::domain::tuning::world::WorldTuning;

/// A validated extraction against one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    pub node_id: NodeId,
    pub kind: ResourceType,
    /// Units the node can give up, before the account applies its own limits.
    pub available: u32,
}

pub fn validate(
    nodes: &[SessionNode],
    player: &SessionPlayer,
    node_id: NodeId,
    claimed: ResourceType,
    amount: u32,
    tuning: &WorldTuning,
) -> Result<Extraction, MineRejection> {
    if amount == 0 {
        return Err(MineRejection::InvalidAmount);
    }
    let node = nodes
        .iter()
        .find(|node| node.id == node_id)
        .ok_or(MineRejection::UnknownNode(node_id))?;
    if node.depleted || node.amount == 0 {
        return Err(MineRejection::Depleted(node_id));
    }
    if node.kind != claimed {
        return Err(MineRejection::WrongType {
            node_id,
            claimed,
            actual: node.kind,
        });
    }
    let reach = tuning.mining_radius + tuning.proximity_slack + node.radius;
    let (dx, dy) = (node.x - player.x, node.y - player.y);
    if dx * dx + dy * dy > reach * reach {
        return Err(MineRejection::OutOfRange(node_id));
    }
    Ok(Extraction {
        node_id,
        kind: node.kind,
        available: node.amount.min(amount),
    })
}

/// Removes `taken` units and returns what remains. The node depletes at zero.
pub fn apply(node: &mut SessionNode, taken: u32) -> u32 {
    node.amount = node.amount.saturating_sub(taken);
    if node.amount == 0 {
        node.depleted = true;
    }
    node.amount
}
