// Energy pool: drained by mining, refilled over a tier-dependent window once empty.

use crate::domain::tuning::tiers::{MAX_TIER, MIN_TIER};

/// Seconds for a tier 1 vessel to refill from empty.
pub const MIN_FILL_SECONDS: f64 = 1200.0;
/// Seconds for a max tier vessel to refill from empty.
pub const MAX_FILL_SECONDS: f64 = 2700.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyState {
    Full,
    Draining,
    Depleted,
    Regenerating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Energy {
    current: f64,
    max: f64,
    regenerating: bool,
}

impl Energy {
    pub fn full(max: f64) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            regenerating: false,
        }
    }

    /// Rebuilds a pool from a persisted value, clamped into `0..=max`.
    pub fn restore(current: f64, max: f64) -> Self {
        let max = max.max(0.0);
        let current = if current.is_finite() {
            current.clamp(0.0, max)
        } else {
            max
        };
        Self {
            current,
            max,
            regenerating: false,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    pub fn state(&self) -> EnergyState {
        if self.regenerating {
            EnergyState::Regenerating
        } else if self.is_empty() {
            EnergyState::Depleted
        } else if self.current >= self.max {
            EnergyState::Full
        } else {
            EnergyState::Draining
        }
    }

    /// Spends `cost`, never going below zero. Returns true when this call emptied the pool.
    pub fn consume(&mut self, cost: f64) -> bool {
        let was_empty = self.is_empty();
        self.current = (self.current - cost.max(0.0)).max(0.0);
        !was_empty && self.is_empty()
    }

    /// Applies `elapsed_secs` of regeneration at `rate_per_second`.
    ///
    /// Nothing happens until the pool has hit exactly zero; from then on it refills
    /// until `max` and stops there.
    pub fn tick(&mut self, rate_per_second: f64, elapsed_secs: f64) {
        if !self.regenerating {
            if !self.is_empty() {
                return;
            }
            self.regenerating = true;
        }

        self.current = (self.current + rate_per_second * elapsed_secs).min(self.max);
        if self.current >= self.max {
            self.regenerating = false;
        }
    }
}

/// Empty-to-full duration: linear between the tier 1 and max tier windows.
pub fn fill_time_seconds(tier: u8) -> f64 {
    let tier = tier.clamp(MIN_TIER, MAX_TIER);
    let progress = f64::from(tier - MIN_TIER) / f64::from(MAX_TIER - MIN_TIER);
    MIN_FILL_SECONDS + (MAX_FILL_SECONDS - MIN_FILL_SECONDS) * progress
}

pub fn regen_rate_per_second(max_energy: f64, tier: u8) -> f64 {
    max_energy / fill_time_seconds(tier)
}
