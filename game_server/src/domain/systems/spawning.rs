use crate::domain::state::{ResourceType, SessionNode};
use crate::domain::tuning::world::WorldTuning;
use rand::Rng;

/// Fills a fresh node pool with ids starting at 1.
pub fn spawn_pool<R: Rng + ?Sized>(rng: &mut R, tuning: &WorldTuning) -> Vec<SessionNode> {
    let pool = tuning.pool;
    (1..=pool.size as u32)
        .map(|id| SessionNode {
            id,
            x: rng.gen_range(tuning.min_coord..=tuning.max_coord),
            y: rng.gen_range(tuning.min_coord..=tuning.max_coord),
            kind: ResourceType::ALL[rng.gen_range(0..ResourceType::ALL.len())],
            amount: rng.gen_range(pool.min_amount..=pool.max_amount),
            depleted: false,
            radius: rng.gen_range(pool.min_radius..=pool.max_radius),
        })
        .collect()
}

pub fn all_depleted(nodes: &[SessionNode]) -> bool {
    nodes.iter().all(|node| node.depleted)
}
