//! Tier ladder shared with the client. Both sides must carry identical numbers.

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 15;

pub fn is_valid_tier(tier: u8) -> bool {
    (MIN_TIER..=MAX_TIER).contains(&tier)
}

/// Units a single mine action may extract.
pub fn mining_rate(tier: u8) -> u32 {
    5 + u32::from(tier.saturating_sub(1))
}

pub fn capacity_per_type(tier: u8) -> u32 {
    100 + 50 * u32::from(tier.saturating_sub(1))
}

/// Currency needed to reach `tier` from the one below. `None` outside the ladder.
pub fn upgrade_cost(tier: u8) -> Option<u64> {
    if !is_valid_tier(tier) {
        return None;
    }
    let steps = u64::from(tier - 1);
    Some(50 * steps * steps)
}
