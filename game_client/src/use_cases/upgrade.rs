// Tier-upgrade pipeline: on-chain attempt, signed authorization, backend persistence.
//
// Runs outside the engine task and never touches world state; the engine applies the
// returned outcome in one step, so a half-finished upgrade is never observable.

use crate::domain::errors::{BackendError, LedgerError, SignError, UpgradeError};
use crate::domain::ports::{Backend, Ledger, SignedMessage, Signer, SubmarineRecord, TxHandle};
use crate::domain::progression::{UpgradeTransaction, upgrade_message};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};

/// Validated request produced by the world before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    pub address: String,
    pub current_tier: u8,
    pub target_tier: u8,
    pub cost: u64,
}

/// How the on-chain leg ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementPath {
    OnChainSucceeded { tx_hash: String },
    OnChainFailedFellBack { reason: LedgerError },
}

/// Result of the on-chain leg: settled, fell back, or aborted the whole upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    OnChainSucceeded { tx_hash: String },
    OnChainFailedFellBack { reason: LedgerError },
    Aborted(UpgradeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOutcome {
    pub record: SubmarineRecord,
    pub path: SettlementPath,
    pub transaction: UpgradeTransaction,
}

#[derive(Debug, Clone, Copy)]
pub struct UpgradeSettings {
    /// Bound on every individual external call.
    pub call_timeout: Duration,
    /// Extra attempts for the backend submission after a transient failure.
    pub submit_retries: u32,
    pub retry_delay: Duration,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(20),
            submit_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

pub struct UpgradePipeline {
    pub signer: Arc<dyn Signer>,
    pub ledger: Arc<dyn Ledger>,
    pub backend: Arc<dyn Backend>,
    pub settings: UpgradeSettings,
}

impl UpgradePipeline {
    pub async fn execute(&self, plan: UpgradePlan) -> Result<UpgradeOutcome, UpgradeError> {
        let span = info_span!(
            "upgrade",
            address = %plan.address,
            from = plan.current_tier,
            to = plan.target_tier
        );
        self.run(plan).instrument(span).await
    }

    async fn run(&self, plan: UpgradePlan) -> Result<UpgradeOutcome, UpgradeError> {
        let mut transaction = UpgradeTransaction::new(plan.target_tier, plan.cost);

        let (path, on_chain_tx) = match self.attempt_on_chain(&plan, &mut transaction).await {
            PipelineResult::Aborted(err) => {
                warn!(error = %err, "upgrade aborted on chain");
                return Err(err);
            }
            PipelineResult::OnChainSucceeded { tx_hash } => (
                SettlementPath::OnChainSucceeded {
                    tx_hash: tx_hash.clone(),
                },
                Some(tx_hash),
            ),
            PipelineResult::OnChainFailedFellBack { reason } => {
                info!(reason = %reason, "on-chain upgrade unavailable; using signed authorization");
                (SettlementPath::OnChainFailedFellBack { reason }, None)
            }
        };

        // A signature finalizes the upgrade whatever happened on chain.
        let message = upgrade_message(&plan.address);
        let signature = self.sign(&message).await?;
        transaction.authorization_signed = true;

        let auth = SignedMessage {
            address: plan.address.clone(),
            message,
            signature,
        };
        let record = self
            .submit(&auth, plan.target_tier, on_chain_tx.as_deref())
            .await?;
        if record.tier < plan.target_tier {
            return Err(UpgradeError::Failed(format!(
                "backend kept tier {} instead of {}",
                record.tier, plan.target_tier
            )));
        }
        transaction.persisted = true;

        info!(tier = record.tier, balance = record.balance, "upgrade persisted");
        Ok(UpgradeOutcome {
            record,
            path,
            transaction,
        })
    }

    /// Allowance approval then the upgrade call, each confirmed before moving on.
    pub async fn attempt_on_chain(
        &self,
        plan: &UpgradePlan,
        transaction: &mut UpgradeTransaction,
    ) -> PipelineResult {
        transaction.on_chain_attempted = true;
        let result = async {
            let approval = self
                .bounded_ledger(self.ledger.approve_allowance(plan.cost))
                .await?;
            self.confirm(&approval).await?;
            let upgrade = self
                .bounded_ledger(self.ledger.upgrade(plan.target_tier))
                .await?;
            self.confirm(&upgrade).await?;
            Ok::<TxHandle, LedgerError>(upgrade)
        }
        .await;

        match result {
            Ok(tx) => {
                transaction.on_chain_succeeded = true;
                PipelineResult::OnChainSucceeded { tx_hash: tx.hash }
            }
            Err(reason) if reason.is_fatal() => PipelineResult::Aborted(abort_reason(reason)),
            Err(reason) => PipelineResult::OnChainFailedFellBack { reason },
        }
    }

    async fn confirm(&self, tx: &TxHandle) -> Result<(), LedgerError> {
        self.bounded_ledger(self.ledger.wait_for_confirmation(tx))
            .await
    }

    async fn bounded_ledger<T>(
        &self,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        timeout(self.settings.call_timeout, call)
            .await
            .unwrap_or(Err(LedgerError::Timeout))
    }

    async fn sign(&self, message: &str) -> Result<String, UpgradeError> {
        let result = timeout(self.settings.call_timeout, self.signer.sign(message))
            .await
            .unwrap_or(Err(SignError::Timeout));
        result.map_err(|err| match err {
            SignError::Rejected => UpgradeError::Rejected,
            other => UpgradeError::Failed(other.to_string()),
        })
    }

    // The backend treats a repeated {address, tier} as a no-op, so resubmitting is safe.
    async fn submit(
        &self,
        auth: &SignedMessage,
        target_tier: u8,
        on_chain_tx: Option<&str>,
    ) -> Result<SubmarineRecord, UpgradeError> {
        let mut attempt = 0;
        loop {
            let result = timeout(
                self.settings.call_timeout,
                self.backend.upgrade_submarine(auth, target_tier, on_chain_tx),
            )
            .await
            .unwrap_or(Err(BackendError::Timeout));

            match result {
                Ok(record) => return Ok(record),
                Err(err) if err.is_transient() && attempt < self.settings.submit_retries => {
                    attempt += 1;
                    warn!(error = %err, attempt, "upgrade submission failed; retrying");
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                Err(err) => return Err(map_backend_error(err, auth, target_tier)),
            }
        }
    }
}

fn abort_reason(reason: LedgerError) -> UpgradeError {
    match reason {
        LedgerError::InsufficientGas => UpgradeError::InsufficientGas,
        _ => UpgradeError::Rejected,
    }
}

fn map_backend_error(err: BackendError, auth: &SignedMessage, target_tier: u8) -> UpgradeError {
    match err {
        BackendError::NonSequential => UpgradeError::NonSequential {
            current: target_tier.saturating_sub(1),
            target: target_tier,
        },
        BackendError::InsufficientFunds => {
            UpgradeError::Failed(format!("backend reports insufficient funds for {}", auth.address))
        }
        other => UpgradeError::Failed(other.to_string()),
    }
}
