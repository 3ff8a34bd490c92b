use super::{ApiErrorBody, base_url_with_slash};
use crate::domain::errors::LedgerError;
use crate::domain::ports::{Ledger, TxHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Serialize)]
struct AllowanceRequest {
    amount: u64,
}

#[derive(Debug, Serialize)]
struct UpgradeRequest {
    tier: u8,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct TxStatusResponse {
    status: TxStatus,
    #[serde(default)]
    error: Option<String>,
}

// Client for the chain gateway that submits token-contract calls on the player's behalf.
#[derive(Clone)]
pub struct HttpLedger {
    http: reqwest::Client,
    base_url: Url,
    poll_interval: Duration,
}

impl HttpLedger {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let base_url =
            base_url_with_slash(base_url).map_err(|e| LedgerError::Transport(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            poll_interval: Duration::from_secs(1),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Transport(e.to_string()))
    }

    async fn submit<B: Serialize>(&self, path: &str, body: &B) -> Result<TxHandle, LedgerError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(classify(ApiErrorBody::read(response).await));
        }
        let body = response
            .json::<TxResponse>()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(TxHandle { hash: body.hash })
    }
}

fn transport_error(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Transport(err.to_string())
    }
}

fn classify(body: ApiErrorBody) -> LedgerError {
    match body.code() {
        "user_rejected" => LedgerError::UserRejected,
        "insufficient_gas" => LedgerError::InsufficientGas,
        "insufficient_balance" | "no_revertible_balance" => LedgerError::NoRevertibleBalance,
        "call_exception" => LedgerError::CallException(body.message),
        _ => LedgerError::Transport(body.message),
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn approve_allowance(&self, amount: u64) -> Result<TxHandle, LedgerError> {
        self.submit("allowance", &AllowanceRequest { amount }).await
    }

    async fn upgrade(&self, tier: u8) -> Result<TxHandle, LedgerError> {
        self.submit("upgrade", &UpgradeRequest { tier }).await
    }

    // Polls until the gateway reports a final status; the caller bounds the total wait.
    async fn wait_for_confirmation(&self, tx: &TxHandle) -> Result<(), LedgerError> {
        let url = self.endpoint(&format!("tx/{}", tx.hash))?;
        loop {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(transport_error)?;
            if !response.status().is_success() {
                return Err(classify(ApiErrorBody::read(response).await));
            }
            let body = response
                .json::<TxStatusResponse>()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?;
            match body.status {
                TxStatus::Confirmed => return Ok(()),
                TxStatus::Failed => {
                    return Err(LedgerError::CallException(
                        body.error.unwrap_or_else(|| "transaction reverted".to_string()),
                    ));
                }
                TxStatus::Pending => {
                    debug!(hash = %tx.hash, "transaction pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

/// Stand-in when no chain gateway is configured: every call takes the off-chain path.
pub struct NoLedger;

#[async_trait]
impl Ledger for NoLedger {
    async fn approve_allowance(&self, _amount: u64) -> Result<TxHandle, LedgerError> {
        Err(LedgerError::NoRevertibleBalance)
    }

    async fn upgrade(&self, _tier: u8) -> Result<TxHandle, LedgerError> {
        Err(LedgerError::NoRevertibleBalance)
    }

    async fn wait_for_confirmation(&self, _tx: &TxHandle) -> Result<(), LedgerError> {
        Err(LedgerError::NoRevertibleBalance)
    }
}
