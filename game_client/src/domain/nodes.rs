// Resource nodes: spawning, extraction and target selection.

use crate::domain::movement::PlayerPosition;
use crate::domain::resources::ResourceType;
use crate::domain::tuning::world::NodePoolTuning;
use rand::Rng;

pub type NodeId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub kind: ResourceType,
    pub amount: u32,
    pub depleted: bool,
    pub radius: f32,
}

impl ResourceNode {
    pub fn new(id: NodeId, x: f32, y: f32, kind: ResourceType, amount: u32, radius: f32) -> Self {
        Self {
            id,
            x,
            y,
            kind,
            amount,
            depleted: amount == 0,
            radius,
        }
    }

    pub fn is_mineable(&self) -> bool {
        !self.depleted && self.amount > 0
    }

    /// Removes up to `requested` units and returns how many were taken.
    /// The node flips to depleted exactly when its amount reaches zero.
    pub fn extract(&mut self, requested: u32) -> u32 {
        if self.depleted {
            return 0;
        }
        let taken = requested.min(self.amount);
        self.amount -= taken;
        self.depleted = self.amount == 0;
        taken
    }

    /// Lowers the amount to an authoritative remaining value. Never raises it.
    pub fn settle_remaining(&mut self, remaining: u32) {
        self.amount = self.amount.min(remaining);
        self.depleted = self.amount == 0;
    }

    pub fn distance_to(&self, position: &PlayerPosition) -> f32 {
        (self.x - position.x).hypot(self.y - position.y)
    }
}

/// Creates a fresh pool with sequential ids starting at 1.
pub fn spawn_pool<R: Rng>(
    rng: &mut R,
    tuning: &NodePoolTuning,
    min_coord: f32,
    max_coord: f32,
) -> Vec<ResourceNode> {
    (0..tuning.size)
        .map(|index| {
            let kind = ResourceType::ALL[rng.gen_range(0..ResourceType::ALL.len())];
            ResourceNode::new(
                index as NodeId + 1,
                rng.gen_range(min_coord..=max_coord),
                rng.gen_range(min_coord..=max_coord),
                kind,
                rng.gen_range(tuning.min_amount..=tuning.max_amount),
                rng.gen_range(tuning.min_radius..=tuning.max_radius),
            )
        })
        .collect()
}

/// Nearest mineable node within `radius`. Equal distances resolve to the lowest id.
pub fn find_target(
    nodes: &[ResourceNode],
    position: &PlayerPosition,
    radius: f32,
) -> Option<NodeId> {
    nodes
        .iter()
        .filter(|node| node.is_mineable())
        .map(|node| (node.distance_to(position), node.id))
        .filter(|(distance, _)| *distance <= radius)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}
