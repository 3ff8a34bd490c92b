// Tier-upgrade rules and the per-attempt transaction record.

use crate::domain::errors::UpgradeError;
use crate::domain::tuning::tiers::{MAX_TIER, upgrade_cost};

/// Canonical message the wallet signs to authorize account actions.
pub fn upgrade_message(address: &str) -> String {
    format!("Sign this message to upgrade submarine with your account {address}")
}

/// Progress of one upgrade attempt. Never persisted; only its outcome is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeTransaction {
    pub target_tier: u8,
    pub cost_tokens: u64,
    pub on_chain_attempted: bool,
    pub on_chain_succeeded: bool,
    pub authorization_signed: bool,
    pub persisted: bool,
}

impl UpgradeTransaction {
    pub fn new(target_tier: u8, cost_tokens: u64) -> Self {
        Self {
            target_tier,
            cost_tokens,
            on_chain_attempted: false,
            on_chain_succeeded: false,
            authorization_signed: false,
            persisted: false,
        }
    }
}

/// Local gate before any external call: sequential target and an advisory funds check.
/// Returns the price of the target tier.
pub fn check_upgrade(current_tier: u8, target_tier: u8, balance: u64) -> Result<u64, UpgradeError> {
    if current_tier >= MAX_TIER {
        return Err(UpgradeError::MaxTierReached);
    }
    if target_tier != current_tier + 1 {
        return Err(UpgradeError::NonSequential {
            current: current_tier,
            target: target_tier,
        });
    }
    let cost = upgrade_cost(target_tier).ok_or(UpgradeError::MaxTierReached)?;
    if balance < cost {
        return Err(UpgradeError::InsufficientFunds { balance, cost });
    }
    Ok(cost)
}
