// Headless input source: reads the published view and presses keys like a player would.

use crate::domain::tuning::tiers::{MAX_TIER, upgrade_cost};
use crate::domain::{GamePhase, ResourceNode};
use crate::interface_adapters::input::{KeyTransition, command_for};
use crate::use_cases::{Action, EngineCommand, EngineView};
use std::f32::consts::PI;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Storage percentage at which the autopilot sells its cargo.
const TRADE_AT_PERCENT: u8 = 90;
/// Heading error (radians) tolerated before turning.
const HEADING_TOLERANCE: f32 = 0.1;
/// Heading error (radians) under which thrust is applied.
const THRUST_CONE: f32 = 0.6;
const ACTION_COOLDOWN: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub keys: HeldKeys,
    pub action: Option<Action>,
}

/// Chooses what to hold and what to trigger for one view.
pub fn decide(view: &EngineView) -> Decision {
    let idle = Decision {
        keys: HeldKeys::default(),
        action: None,
    };
    if view.phase != GamePhase::Idle {
        return idle;
    }

    let next_tier = view.stats.tier.saturating_add(1);
    if next_tier <= MAX_TIER && upgrade_cost(next_tier).is_some_and(|cost| view.balance >= cost) {
        return Decision {
            action: Some(Action::Upgrade {
                target_tier: Some(next_tier),
            }),
            ..idle
        };
    }
    if view.storage_percent >= TRADE_AT_PERCENT {
        return Decision {
            action: Some(Action::Trade),
            ..idle
        };
    }
    if view.stats.energy.is_empty() {
        return idle;
    }
    if view.target.is_some() {
        return Decision {
            action: Some(Action::Mine),
            ..idle
        };
    }

    let Some(node) = nearest_node(view) else {
        return idle;
    };
    Decision {
        keys: steer_towards(view, node),
        action: None,
    }
}

fn nearest_node(view: &EngineView) -> Option<&ResourceNode> {
    view.nodes
        .iter()
        .filter(|node| node.is_mineable())
        .min_by(|a, b| {
            a.distance_to(&view.position)
                .total_cmp(&b.distance_to(&view.position))
                .then(a.id.cmp(&b.id))
        })
}

fn steer_towards(view: &EngineView, node: &ResourceNode) -> HeldKeys {
    let heading = (node.y - view.position.y).atan2(node.x - view.position.x);
    let mut error = heading - view.position.rotation;
    while error > PI {
        error -= 2.0 * PI;
    }
    while error < -PI {
        error += 2.0 * PI;
    }
    HeldKeys {
        forward: error.abs() < THRUST_CONE,
        left: error < -HEADING_TOLERANCE,
        right: error > HEADING_TOLERANCE,
    }
}

fn transitions(held: HeldKeys, wanted: HeldKeys) -> Vec<(&'static str, KeyTransition)> {
    let mut out = Vec::new();
    for (name, was, now) in [
        ("w", held.forward, wanted.forward),
        ("a", held.left, wanted.left),
        ("d", held.right, wanted.right),
    ] {
        match (was, now) {
            (false, true) => out.push((name, KeyTransition::Down)),
            (true, false) => out.push((name, KeyTransition::Up)),
            _ => {}
        }
    }
    out
}

/// Drives the engine until it stops publishing or stops accepting commands.
pub async fn autopilot_task(
    mut view_rx: watch::Receiver<EngineView>,
    command_tx: mpsc::Sender<EngineCommand>,
    tick: Duration,
) {
    let mut interval = tokio::time::interval(tick);
    let mut held = HeldKeys::default();
    let mut last_action: Option<Instant> = None;

    loop {
        interval.tick().await;
        if view_rx.has_changed().is_err() {
            break;
        }
        let view = view_rx.borrow_and_update().clone();
        let decision = decide(&view);

        let mut commands: Vec<EngineCommand> = transitions(held, decision.keys)
            .into_iter()
            .filter_map(|(name, transition)| command_for(name, transition))
            .collect();
        held = decision.keys;

        if let Some(action) = decision.action {
            let ready = last_action.is_none_or(|at| at.elapsed() >= ACTION_COOLDOWN);
            if ready {
                debug!(action = ?action, "autopilot action");
                commands.push(EngineCommand::Action(action));
                last_action = Some(Instant::now());
            }
        }

        for command in commands {
            if command_tx.send(command).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::world::WorldTuning;
    use crate::domain::{PlayerPosition, PlayerStats, ResourceAmounts, ResourceType};
    use crate::use_cases::ClientWorld;

    fn world_with(nodes: Vec<ResourceNode>, balance: u64) -> ClientWorld {
        let mut world = ClientWorld::new(
            WorldTuning::default(),
            PlayerStats::for_tier(1).unwrap(),
            balance,
            Some("0xabc".into()),
        );
        world.set_position(PlayerPosition {
            x: 500.0,
            y: 500.0,
            rotation: 0.0,
        });
        world.set_nodes(nodes);
        world
    }

    #[test]
    fn mines_when_a_target_is_in_range() {
        let world = world_with(
            vec![ResourceNode::new(1, 520.0, 500.0, ResourceType::Nickel, 40, 20.0)],
            0,
        );

        assert_eq!(decide(&world.view()).action, Some(Action::Mine));
    }

    #[test]
    fn steers_towards_nearest_node() {
        let world = world_with(
            vec![
                ResourceNode::new(1, 900.0, 500.0, ResourceType::Nickel, 40, 20.0),
                ResourceNode::new(2, 500.0, 300.0, ResourceType::Cobalt, 40, 20.0),
            ],
            0,
        );

        let decision = decide(&world.view());

        // Node 2 lies straight "up" (negative y); heading -PI/2 from rotation 0 means turn left.
        assert_eq!(
            decision.keys,
            HeldKeys {
                forward: false,
                left: true,
                right: false
            }
        );
    }

    #[test]
    fn trades_when_storage_is_nearly_full() {
        let mut world = world_with(Vec::new(), 0);
        world.set_resources(ResourceAmounts::uniform(95));

        assert_eq!(decide(&world.view()).action, Some(Action::Trade));
    }

    #[test]
    fn upgrades_as_soon_as_affordable() {
        let world = world_with(Vec::new(), 50);

        assert_eq!(
            decide(&world.view()).action,
            Some(Action::Upgrade {
                target_tier: Some(2)
            })
        );
    }

    #[test]
    fn key_transitions_only_report_changes() {
        let held = HeldKeys {
            forward: true,
            left: false,
            right: true,
        };
        let wanted = HeldKeys {
            forward: true,
            left: true,
            right: false,
        };

        assert_eq!(
            transitions(held, wanted),
            vec![("a", KeyTransition::Down), ("d", KeyTransition::Up)]
        );
    }
}
