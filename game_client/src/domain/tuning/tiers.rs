//! Tier ladder for the submarine.
//!
//! The tier is the only input; every derived stat and the upgrade price come from here.
//! The server carries the same table, keep both in sync.

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStats {
    pub tier: u8,

    /// Energy pool when full.
    pub max_energy: f64,

    /// Storage ceiling applied to each of the four resource types.
    pub capacity_per_type: u32,

    /// Base speed fed into the frame integrator.
    pub speed: f32,

    /// Units extracted by a single mining action.
    pub mining_rate: u32,

    /// Hull integrity at full repair.
    pub hull: u32,
}

/// Returns the derived stats for `tier`, or `None` outside `MIN_TIER..=MAX_TIER`.
pub fn stats_for_tier(tier: u8) -> Option<TierStats> {
    if !(MIN_TIER..=MAX_TIER).contains(&tier) {
        return None;
    }
    let step = u32::from(tier - 1);
    Some(TierStats {
        tier,
        max_energy: 100.0 + 20.0 * f64::from(step),
        capacity_per_type: 100 + 50 * step,
        speed: 5.0 + 0.5 * step as f32,
        mining_rate: 5 + step,
        hull: 100 + 25 * step,
    })
}

/// Price in currency units to reach `target` from the tier below it.
pub fn upgrade_cost(target: u8) -> Option<u64> {
    if !(MIN_TIER..=MAX_TIER).contains(&target) {
        return None;
    }
    let step = u64::from(target - 1);
    Some(50 * step * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_one_matches_starting_vessel() {
        let stats = stats_for_tier(1).expect("tier 1 exists");
        assert_eq!(stats.max_energy, 100.0);
        assert_eq!(stats.capacity_per_type, 100);
        assert_eq!(stats.mining_rate, 5);
        assert_eq!(upgrade_cost(1), Some(0));
    }

    #[test]
    fn tiers_outside_the_ladder_have_no_stats() {
        assert!(stats_for_tier(0).is_none());
        assert!(stats_for_tier(16).is_none());
        assert!(upgrade_cost(16).is_none());
    }

    #[test]
    fn every_stat_grows_with_tier() {
        for tier in MIN_TIER..MAX_TIER {
            let low = stats_for_tier(tier).unwrap();
            let high = stats_for_tier(tier + 1).unwrap();
            assert!(high.max_energy > low.max_energy);
            assert!(high.capacity_per_type > low.capacity_per_type);
            assert!(high.mining_rate > low.mining_rate);
            assert!(upgrade_cost(tier + 1) > upgrade_cost(tier));
        }
    }
}
