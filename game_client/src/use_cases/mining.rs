// Mining transaction: validate against storage and energy, then mutate in one step.

use crate::domain::errors::MiningError;
use crate::domain::resources::free_capacity;
use crate::domain::{GamePhase, NodeId, PlayerStats, ResourceAmounts, ResourceNode, ResourceType};

/// A validated mining action. Applying it cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinePlan {
    pub node_id: NodeId,
    pub kind: ResourceType,
    pub amount: u32,
}

/// What `apply_mine` changed, for the outbound request and the ack queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineReceipt {
    pub node_id: NodeId,
    pub kind: ResourceType,
    pub amount: u32,
    pub node_depleted: bool,
    pub energy_emptied: bool,
}

pub fn plan_mine(
    phase: GamePhase,
    target: Option<NodeId>,
    nodes: &[ResourceNode],
    resources: &ResourceAmounts,
    stats: &PlayerStats,
) -> Result<MinePlan, MiningError> {
    if phase != GamePhase::Idle {
        return Err(MiningError::Busy(phase));
    }
    let node_id = target.ok_or(MiningError::NoTarget)?;
    let node = nodes
        .iter()
        .find(|node| node.id == node_id)
        .ok_or(MiningError::NoTarget)?;
    if !node.is_mineable() {
        return Err(MiningError::NodeDepleted(node_id));
    }

    let free = free_capacity(resources, &stats.capacity, node.kind);
    let amount = node.amount.min(stats.mining_rate).min(free);
    if amount == 0 {
        return Err(MiningError::StorageFull);
    }
    if stats.energy.is_empty() {
        return Err(MiningError::NoEnergy);
    }

    Ok(MinePlan {
        node_id,
        kind: node.kind,
        amount,
    })
}

/// Applies resources, node amount and energy together.
pub fn apply_mine(
    plan: MinePlan,
    nodes: &mut [ResourceNode],
    resources: &mut ResourceAmounts,
    stats: &mut PlayerStats,
    energy_cost: f64,
) -> MineReceipt {
    let mut amount = plan.amount;
    let mut node_depleted = false;
    if let Some(node) = nodes.iter_mut().find(|node| node.id == plan.node_id) {
        amount = node.extract(plan.amount);
        node_depleted = node.depleted;
    }

    let held = resources.get_mut(plan.kind);
    *held = held.saturating_add(amount);
    let energy_emptied = stats.energy.consume(energy_cost);

    MineReceipt {
        node_id: plan.node_id,
        kind: plan.kind,
        amount,
        node_depleted,
        energy_emptied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> PlayerStats {
        PlayerStats::for_tier(1).expect("tier 1 exists")
    }

    #[test]
    fn partial_node_is_mined_out_and_depleted() {
        let mut nodes = vec![ResourceNode::new(7, 0.0, 0.0, ResourceType::Cobalt, 3, 20.0)];
        // 10 units of free cobalt space against a rate of 5.
        let mut resources = ResourceAmounts {
            cobalt: 90,
            ..Default::default()
        };
        let mut stats = stats();

        let plan = plan_mine(GamePhase::Idle, Some(7), &nodes, &resources, &stats)
            .expect("plan should succeed");
        assert_eq!(plan.amount, 3);

        let receipt = apply_mine(plan, &mut nodes, &mut resources, &mut stats, 5.0);

        assert_eq!(receipt.amount, 3);
        assert!(receipt.node_depleted);
        assert!(nodes[0].depleted);
        assert_eq!(resources.cobalt, 93);
        assert_eq!(stats.energy.current(), 95.0);
    }

    #[test]
    fn amount_is_clamped_by_free_storage() {
        let nodes = vec![ResourceNode::new(1, 0.0, 0.0, ResourceType::Nickel, 50, 20.0)];
        let resources = ResourceAmounts {
            nickel: 98,
            ..Default::default()
        };

        let plan = plan_mine(GamePhase::Idle, Some(1), &nodes, &resources, &stats())
            .expect("plan should succeed");

        assert_eq!(plan.amount, 2);
    }

    #[test]
    fn full_storage_fails_without_touching_energy() {
        let nodes = vec![ResourceNode::new(1, 0.0, 0.0, ResourceType::Nickel, 50, 20.0)];
        let resources = ResourceAmounts {
            nickel: 100,
            ..Default::default()
        };
        let stats = stats();

        let result = plan_mine(GamePhase::Idle, Some(1), &nodes, &resources, &stats);

        assert_eq!(result, Err(MiningError::StorageFull));
        assert_eq!(stats.energy.current(), 100.0);
    }

    #[test]
    fn mining_needs_idle_target_and_energy() {
        let nodes = vec![ResourceNode::new(1, 0.0, 0.0, ResourceType::Copper, 50, 20.0)];
        let resources = ResourceAmounts::default();
        let mut drained = stats();
        drained.energy.consume(1_000.0);

        assert_eq!(
            plan_mine(GamePhase::Mining, Some(1), &nodes, &resources, &stats()),
            Err(MiningError::Busy(GamePhase::Mining))
        );
        assert_eq!(
            plan_mine(GamePhase::Idle, None, &nodes, &resources, &stats()),
            Err(MiningError::NoTarget)
        );
        assert_eq!(
            plan_mine(GamePhase::Idle, Some(1), &nodes, &resources, &drained),
            Err(MiningError::NoEnergy)
        );
    }

    #[test]
    fn resources_never_exceed_capacity_over_many_actions() {
        let mut nodes = vec![ResourceNode::new(1, 0.0, 0.0, ResourceType::Manganese, 10_000, 20.0)];
        let mut resources = ResourceAmounts::default();
        let mut stats = stats();

        for _ in 0..40 {
            if let Ok(plan) = plan_mine(GamePhase::Idle, Some(1), &nodes, &resources, &stats) {
                apply_mine(plan, &mut nodes, &mut resources, &mut stats, 0.0);
            }
            assert!(resources.total() <= stats.capacity.total());
            assert!(resources.manganese <= stats.capacity.manganese);
        }
        assert_eq!(resources.manganese, 100);
    }
}
