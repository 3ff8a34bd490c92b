// Authoritative per-wallet account workflows: authentication, upgrades, trades, mining credit.

use crate::domain::errors::AccountError;
use crate::domain::ports::{AccountStore, SignatureVerifier, VerifyError};
use crate::domain::tuning::tiers::{capacity_per_type, is_valid_tier, mining_rate, upgrade_cost};
use crate::domain::tuning::trade::convert;
use crate::domain::{Account, ResourceAmounts, ResourceType};
use crate::use_cases::types::TradeReceipt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Optimistic writes retried this many times before giving up.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Message every wallet signs to prove ownership to the session and the backend.
pub fn expected_message(address: &str) -> String {
    format!("Sign this message to upgrade submarine with your account {address}")
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

enum Write<T> {
    Skip(T),
    Commit(T),
}

pub struct AccountService {
    store: Arc<dyn AccountStore>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Checks that `signature` over the canonical message was produced by `address`.
    /// Returns the normalized address used as the account key.
    pub async fn authenticate(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, AccountError> {
        let address = normalize_address(address);
        if address.is_empty() || signature.trim().is_empty() {
            return Err(AccountError::Unauthorized);
        }
        if message.to_ascii_lowercase() != expected_message(&address).to_ascii_lowercase() {
            debug!(%address, "signed message does not match the expected text");
            return Err(AccountError::Unauthorized);
        }

        let recovered = match self.verifier.verify(message, signature).await {
            Ok(recovered) => recovered,
            Err(VerifyError::Invalid) => return Err(AccountError::Unauthorized),
            Err(VerifyError::Unavailable) => return Err(AccountError::AuthUnavailable),
        };
        if normalize_address(&recovered) != address {
            warn!(%address, %recovered, "signature recovered a different address");
            return Err(AccountError::Unauthorized);
        }
        Ok(address)
    }

    /// Unknown wallets start at tier 1 with nothing.
    pub async fn get_account(&self, address: &str) -> Result<Account, AccountError> {
        let address = normalize_address(address);
        let stored = self.store.get(&address).await.map_err(AccountError::Storage)?;
        Ok(stored.unwrap_or_else(|| Account::new(address)))
    }

    /// Moves the account to `target_tier`. Replaying an upgrade that already landed returns
    /// the current state without charging again.
    pub async fn upgrade(
        &self,
        address: &str,
        target_tier: u8,
        on_chain_tx: Option<&str>,
    ) -> Result<Account, AccountError> {
        if !is_valid_tier(target_tier) {
            return Err(AccountError::InvalidTier(target_tier));
        }

        let account = self
            .update(address, |account| {
                if target_tier <= account.tier {
                    return Ok(Write::Skip(account.clone()));
                }
                if target_tier != account.tier.saturating_add(1) {
                    return Err(AccountError::NonSequential {
                        current: account.tier,
                        target: target_tier,
                    });
                }
                let cost = upgrade_cost(target_tier).ok_or(AccountError::InvalidTier(target_tier))?;
                if account.balance < cost {
                    return Err(AccountError::InsufficientFunds {
                        balance: account.balance,
                        cost,
                    });
                }
                account.balance -= cost;
                account.tier = target_tier;
                Ok(Write::Commit(account.clone()))
            })
            .await?;

        info!(
            address = %account.address,
            tier = account.tier,
            balance = account.balance,
            on_chain_tx = ?on_chain_tx,
            "submarine upgrade applied"
        );
        Ok(account)
    }

    /// Converts the tracked resources the client claims to hold. Claims above what the
    /// sessions recorded are capped.
    pub async fn trade(
        &self,
        address: &str,
        claimed: ResourceAmounts,
    ) -> Result<TradeReceipt, AccountError> {
        let receipt = self
            .update(address, |account| {
                let effective = claimed.min_each(&account.resources);
                if effective.is_empty() {
                    return Err(AccountError::NothingToTrade);
                }
                let earned = convert(&effective);
                account.balance += earned;
                account.resources = ResourceAmounts::default();
                Ok(Write::Commit(TradeReceipt {
                    earned,
                    balance: account.balance,
                }))
            })
            .await?;

        info!(
            address = %normalize_address(address),
            earned = receipt.earned,
            balance = receipt.balance,
            "trade settled"
        );
        Ok(receipt)
    }

    /// Records `offered` units of `kind` mined in a session. Returns the units accepted after
    /// the tier's mining rate and free capacity.
    pub async fn credit_mined(
        &self,
        address: &str,
        kind: ResourceType,
        offered: u32,
    ) -> Result<u32, AccountError> {
        self.update(address, |account| {
            let held = account.resources.get(kind);
            let room = capacity_per_type(account.tier).saturating_sub(held);
            let accepted = offered.min(room).min(mining_rate(account.tier));
            if accepted == 0 {
                return Ok(Write::Skip(0));
            }
            *account.resources.get_mut(kind) = held + accepted;
            Ok(Write::Commit(accepted))
        })
        .await
    }

    /// Read-modify-write with optimistic concurrency on the account version.
    async fn update<T, F>(&self, address: &str, mut apply: F) -> Result<T, AccountError>
    where
        F: FnMut(&mut Account) -> Result<Write<T>, AccountError>,
    {
        let address = normalize_address(address);
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let stored = self.store.get(&address).await.map_err(AccountError::Storage)?;
            let expected_version = stored.as_ref().map(|account| account.version);
            let mut account = stored.unwrap_or_else(|| Account::new(address.clone()));

            let value = match apply(&mut account)? {
                Write::Skip(value) => return Ok(value),
                Write::Commit(value) => value,
            };
            account.version = expected_version.map_or(1, |version| version + 1);

            if self
                .store
                .save(&account, expected_version)
                .await
                .map_err(AccountError::Storage)?
            {
                return Ok(value);
            }
            debug!(%address, attempt, "account write conflict; retrying");
        }
        Err(AccountError::Storage(format!(
            "too many concurrent updates for {address}"
        )))
    }
}
