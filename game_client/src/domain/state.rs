// Player-facing state types shared by the engine and its adapters.

use crate::domain::energy::Energy;
use crate::domain::movement::PlayerPosition;
use crate::domain::resources::ResourceAmounts;
use crate::domain::tuning::tiers::{TierStats, stats_for_tier};

/// Tier-derived vessel attributes plus the live energy pool.
///
/// Replaced as a whole whenever the tier changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub tier: u8,
    pub energy: Energy,
    pub capacity: ResourceAmounts,
    pub speed: f32,
    pub mining_rate: u32,
    pub hull: u32,
    pub max_hull: u32,
}

impl PlayerStats {
    /// Fresh stats for `tier`: full energy, full hull.
    pub fn for_tier(tier: u8) -> Option<Self> {
        stats_for_tier(tier).map(Self::from)
    }
}

impl From<TierStats> for PlayerStats {
    fn from(stats: TierStats) -> Self {
        Self {
            tier: stats.tier,
            energy: Energy::full(stats.max_energy),
            capacity: ResourceAmounts::uniform(stats.capacity_per_type),
            speed: stats.speed,
            mining_rate: stats.mining_rate,
            hull: stats.hull,
            max_hull: stats.hull,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Mining,
    ResourceGained,
    Trading,
    ResourceTraded,
    Upgrading,
    Upgraded,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Mining => "mining",
            GamePhase::ResourceGained => "resourceGained",
            GamePhase::Trading => "trading",
            GamePhase::ResourceTraded => "resourceTraded",
            GamePhase::Upgrading => "upgrading",
            GamePhase::Upgraded => "upgraded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// A UI signal that switches itself off after a fixed time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransientSignal {
    remaining_ms: f64,
}

impl TransientSignal {
    pub fn raise(&mut self, duration_ms: f64) {
        self.remaining_ms = duration_ms.max(0.0);
    }

    pub fn advance(&mut self, elapsed_ms: f64) {
        self.remaining_ms = (self.remaining_ms - elapsed_ms).max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0.0
    }
}

/// Small resume record stored per user between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSnapshot {
    pub position: PlayerPosition,
    pub energy: f64,
    pub hull: u32,
    pub session_id: String,
}
