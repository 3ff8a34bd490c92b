// Client-side game world: every piece of mutable player and node state.
//
// Only the engine task holds a `ClientWorld`, so none of this needs locking.

use crate::domain::energy::{Energy, regen_rate_per_second};
use crate::domain::errors::{MiningError, TradeError, UpgradeError};
use crate::domain::movement::{self, MovementConfig};
use crate::domain::nodes::{find_target, spawn_pool};
use crate::domain::ports::TradeReceipt;
use crate::domain::progression::check_upgrade;
use crate::domain::resources::storage_percentage;
use crate::domain::state::TransientSignal;
use crate::domain::tuning::world::WorldTuning;
use crate::domain::{
    ConnectionStatus, GamePhase, LocalSnapshot, MovementIntent, NodeId, PlayerPosition,
    PlayerStats, ResourceAmounts, ResourceNode,
};
use crate::use_cases::mining::{MineReceipt, apply_mine, plan_mine};
use crate::use_cases::reconcile::{MinedOutcome, Reconciler};
use crate::use_cases::types::{EngineView, Key, KnownPlayer, MinedEvent, SessionSnapshot};
use crate::use_cases::upgrade::{UpgradeOutcome, UpgradePlan};
use rand::Rng;
use tracing::{debug, info, warn};

/// Message the session sends when the account hold cannot take more.
const STORAGE_FULL_REJECTION: &str = "storage full";

pub struct ClientWorld {
    tuning: WorldTuning,
    position: PlayerPosition,
    intent: MovementIntent,
    stats: PlayerStats,
    resources: ResourceAmounts,
    balance: u64,
    address: Option<String>,

    nodes: Vec<ResourceNode>,
    target: Option<NodeId>,
    known_players: Vec<KnownPlayer>,
    reconciler: Reconciler,

    phase: GamePhase,
    // Time left in a timed phase (mining, resourceGained, resourceTraded, upgraded).
    phase_remaining_ms: Option<f64>,
    connection: ConnectionStatus,

    storage_alert: TransientSignal,
    storage_alert_armed: bool,
    storage_full: TransientSignal,
    energy_alert: TransientSignal,
    session_rejection: TransientSignal,
    session_rejection_message: Option<String>,
    sidebar_open: bool,
    last_error: Option<String>,
}

impl ClientWorld {
    pub fn new(tuning: WorldTuning, stats: PlayerStats, balance: u64, address: Option<String>) -> Self {
        let center = (tuning.min_coord + tuning.max_coord) / 2.0;
        Self {
            tuning,
            position: PlayerPosition {
                x: center,
                y: center,
                rotation: 0.0,
            },
            intent: MovementIntent::default(),
            stats,
            resources: ResourceAmounts::default(),
            balance,
            address,
            nodes: Vec::new(),
            target: None,
            known_players: Vec::new(),
            reconciler: Reconciler::new(),
            phase: GamePhase::Idle,
            phase_remaining_ms: None,
            connection: ConnectionStatus::Disconnected,
            storage_alert: TransientSignal::default(),
            storage_alert_armed: true,
            storage_full: TransientSignal::default(),
            energy_alert: TransientSignal::default(),
            session_rejection: TransientSignal::default(),
            session_rejection_message: None,
            sidebar_open: false,
            last_error: None,
        }
    }

    /// Fills the node list with a locally generated pool (offline play).
    pub fn spawn_local_pool<R: Rng>(&mut self, rng: &mut R) {
        self.nodes = spawn_pool(
            rng,
            &self.tuning.node_pool,
            self.tuning.min_coord,
            self.tuning.max_coord,
        );
        self.refresh_target();
    }

    pub fn set_nodes(&mut self, nodes: Vec<ResourceNode>) {
        self.nodes = nodes;
        self.refresh_target();
    }

    pub fn set_position(&mut self, position: PlayerPosition) {
        self.position = PlayerPosition {
            x: position.x.clamp(self.tuning.min_coord, self.tuning.max_coord),
            y: position.y.clamp(self.tuning.min_coord, self.tuning.max_coord),
            rotation: position.rotation,
        };
        self.refresh_target();
    }

    pub fn set_resources(&mut self, resources: ResourceAmounts) {
        self.resources = resources;
    }

    /// Applies a saved resume record. Energy and hull are clamped to current stats.
    pub fn restore(&mut self, snapshot: &LocalSnapshot) {
        self.set_position(snapshot.position);
        self.stats.energy = Energy::restore(snapshot.energy, self.stats.energy.max());
        self.stats.hull = snapshot.hull.min(self.stats.max_hull);
    }

    pub fn local_snapshot(&self, session_id: &str) -> LocalSnapshot {
        LocalSnapshot {
            position: self.position,
            energy: self.stats.energy.current(),
            hull: self.stats.hull,
            session_id: session_id.to_string(),
        }
    }

    pub fn position(&self) -> PlayerPosition {
        self.position
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn resources(&self) -> ResourceAmounts {
        self.resources
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn pending_mines(&self) -> usize {
        self.reconciler.pending_len()
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Forward => self.intent.forward = pressed,
            Key::Backward => self.intent.backward = pressed,
            Key::Left => self.intent.left = pressed,
            Key::Right => self.intent.right = pressed,
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Surfaces a locally rejected action without changing the phase.
    pub fn report_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// One simulation frame: timers, movement, then target selection.
    /// Returns true if the submarine moved.
    pub fn step_frame(&mut self, dt_ms: f64) -> bool {
        self.advance_timers(dt_ms);

        let cfg = MovementConfig {
            speed: self.stats.speed,
            speed_scale: self.tuning.speed_scale,
            reference_frame_ms: self.tuning.reference_frame_ms,
            rotation_step: self.tuning.rotation_step,
            min_coord: self.tuning.min_coord,
            max_coord: self.tuning.max_coord,
        };
        let moved = movement::step(
            &mut self.position,
            &self.intent,
            self.stats.energy.is_empty(),
            dt_ms as f32,
            cfg,
        );
        self.refresh_target();
        moved
    }

    /// One regeneration tick of `elapsed_secs`.
    pub fn energy_tick(&mut self, elapsed_secs: f64) {
        let rate = regen_rate_per_second(self.stats.energy.max(), self.stats.tier);
        self.stats.energy.tick(rate, elapsed_secs);
    }

    /// Runs the mining transaction against the current target.
    pub fn mine(&mut self) -> Result<MineReceipt, MiningError> {
        let plan = match plan_mine(
            self.phase,
            self.target,
            &self.nodes,
            &self.resources,
            &self.stats,
        ) {
            Ok(plan) => plan,
            Err(err) => {
                match err {
                    MiningError::StorageFull => {
                        self.storage_full.raise(self.tuning.phase_duration_ms)
                    }
                    MiningError::NoEnergy => self.energy_alert.raise(self.tuning.alert_duration_ms),
                    _ => {}
                }
                return Err(err);
            }
        };

        let receipt = apply_mine(
            plan,
            &mut self.nodes,
            &mut self.resources,
            &mut self.stats,
            self.tuning.mining_energy_cost,
        );
        if receipt.energy_emptied {
            self.energy_alert.raise(self.tuning.alert_duration_ms);
        }
        self.reconciler.record(&receipt);
        self.enter_timed_phase(GamePhase::Mining);
        self.update_storage_alert();
        self.refresh_target();
        Ok(receipt)
    }

    /// Local gate for an upgrade. `None` targets the next tier. Moves to `Upgrading` on success.
    pub fn begin_upgrade(&mut self, target_tier: Option<u8>) -> Result<UpgradePlan, UpgradeError> {
        if self.phase != GamePhase::Idle {
            return Err(UpgradeError::Busy(self.phase));
        }
        let address = self.address.clone().ok_or(UpgradeError::NoWallet)?;
        let current_tier = self.stats.tier;
        let target_tier = target_tier.unwrap_or(current_tier.saturating_add(1));
        let cost = check_upgrade(current_tier, target_tier, self.balance)?;

        self.phase = GamePhase::Upgrading;
        self.phase_remaining_ms = None;
        self.last_error = None;
        Ok(UpgradePlan {
            address,
            current_tier,
            target_tier,
            cost,
        })
    }

    /// Applies a finished upgrade. Stats are replaced wholesale; resource counts survive.
    pub fn finish_upgrade(&mut self, result: Result<UpgradeOutcome, UpgradeError>) {
        if self.phase != GamePhase::Upgrading {
            debug!("upgrade result arrived outside the upgrading phase; ignored");
            return;
        }
        match result {
            Ok(outcome) => match PlayerStats::for_tier(outcome.record.tier) {
                Some(stats) => {
                    info!(
                        tier = outcome.record.tier,
                        balance = outcome.record.balance,
                        "submarine upgraded"
                    );
                    self.stats = stats;
                    self.balance = outcome.record.balance;
                    self.enter_timed_phase(GamePhase::Upgraded);
                    self.update_storage_alert();
                }
                None => {
                    self.fail_to_idle(format!(
                        "upgrade failed: backend returned unknown tier {}",
                        outcome.record.tier
                    ));
                }
            },
            Err(err) => self.fail_to_idle(err.to_string()),
        }
    }

    /// Local gate for a trade. Moves to `Trading` and returns the counters to submit.
    pub fn begin_trade(&mut self) -> Result<ResourceAmounts, TradeError> {
        if self.phase != GamePhase::Idle {
            return Err(TradeError::Busy(self.phase));
        }
        if self.address.is_none() {
            return Err(TradeError::NoWallet);
        }
        if self.resources.is_empty() {
            return Err(TradeError::NothingToTrade);
        }
        self.phase = GamePhase::Trading;
        self.phase_remaining_ms = None;
        self.last_error = None;
        Ok(self.resources)
    }

    pub fn finish_trade(&mut self, result: Result<TradeReceipt, TradeError>) {
        if self.phase != GamePhase::Trading {
            debug!("trade result arrived outside the trading phase; ignored");
            return;
        }
        match result {
            Ok(receipt) => {
                self.resources = ResourceAmounts::default();
                self.balance = receipt.balance;
                self.enter_timed_phase(GamePhase::ResourceTraded);
                self.update_storage_alert();
            }
            Err(err) => self.fail_to_idle(err.to_string()),
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.reconciler.apply_snapshot(&mut self.nodes, snapshot.nodes);
        let own = self.address.clone();
        self.known_players = snapshot
            .players
            .into_iter()
            .filter(|player| {
                !own
                    .as_deref()
                    .is_some_and(|address| address.eq_ignore_ascii_case(&player.address))
            })
            .collect();
        self.refresh_target();
    }

    pub fn apply_mined(&mut self, event: &MinedEvent) -> MinedOutcome {
        let outcome = self
            .reconciler
            .apply_mined(&mut self.nodes, event, self.address.as_deref());
        if let MinedOutcome::Acknowledged { seq, shortfall } = outcome {
            if shortfall > 0 {
                warn!(
                    seq,
                    node_id = event.node_id,
                    shortfall,
                    "session accepted less than mined locally"
                );
            }
        }
        self.refresh_target();
        outcome
    }

    /// Session rejections are transient: a full hold raises `storage_full`, anything else
    /// shows its message for one alert period.
    pub fn apply_server_error(&mut self, message: String, node_id: Option<NodeId>) {
        if let Some(dropped) = self.reconciler.reject(node_id) {
            warn!(seq = dropped.seq, node_id = dropped.node_id, "session rejected mine");
        }
        if message.eq_ignore_ascii_case(STORAGE_FULL_REJECTION) {
            self.storage_full.raise(self.tuning.phase_duration_ms);
        } else {
            self.session_rejection.raise(self.tuning.alert_duration_ms);
            self.session_rejection_message = Some(message);
        }
    }

    pub fn view(&self) -> EngineView {
        EngineView {
            position: self.position,
            stats: self.stats.clone(),
            resources: self.resources,
            balance: self.balance,
            target: self
                .target
                .and_then(|id| self.nodes.iter().find(|node| node.id == id).cloned()),
            nodes: self.nodes.clone(),
            known_players: self.known_players.clone(),
            phase: self.phase,
            connection: self.connection,
            storage_percent: storage_percentage(&self.resources, &self.stats.capacity),
            storage_alert: self.storage_alert.is_active(),
            storage_full: self.storage_full.is_active(),
            energy_alert: self.energy_alert.is_active(),
            energy_state: self.stats.energy.state(),
            session_rejection: self
                .session_rejection_message
                .clone()
                .filter(|_| self.session_rejection.is_active()),
            sidebar_open: self.sidebar_open,
            last_error: self.last_error.clone(),
            pending_mines: self.reconciler.pending_len(),
        }
    }

    fn advance_timers(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.storage_alert.advance(dt_ms);
        self.storage_full.advance(dt_ms);
        self.energy_alert.advance(dt_ms);
        self.session_rejection.advance(dt_ms);

        let Some(remaining) = self.phase_remaining_ms else {
            return;
        };
        // A long frame can run through more than one phase.
        let mut remaining = remaining - dt_ms;
        loop {
            if remaining > 0.0 {
                self.phase_remaining_ms = Some(remaining);
                return;
            }
            match self.phase {
                GamePhase::Mining => {
                    self.phase = GamePhase::ResourceGained;
                    remaining += self.tuning.phase_duration_ms;
                }
                _ => {
                    self.phase = GamePhase::Idle;
                    self.phase_remaining_ms = None;
                    return;
                }
            }
        }
    }

    fn enter_timed_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.phase_remaining_ms = Some(self.tuning.phase_duration_ms);
    }

    fn fail_to_idle(&mut self, message: String) {
        warn!(error = %message, phase = self.phase.as_str(), "action failed");
        self.phase = GamePhase::Idle;
        self.phase_remaining_ms = None;
        self.last_error = Some(message);
    }

    // One-shot: fires on entering [threshold, 100) and re-arms below the threshold.
    fn update_storage_alert(&mut self) {
        let percent = storage_percentage(&self.resources, &self.stats.capacity);
        if percent < self.tuning.storage_alert_percent {
            self.storage_alert_armed = true;
        } else if percent < 100 && self.storage_alert_armed {
            self.storage_alert.raise(self.tuning.alert_duration_ms);
            self.storage_alert_armed = false;
        }
    }

    fn refresh_target(&mut self) {
        self.target = find_target(&self.nodes, &self.position, self.tuning.mining_radius);
    }
}
