// Trade submission: local counters go to the backend, which recomputes and credits.

use crate::domain::errors::{BackendError, TradeError};
use crate::domain::ports::{Backend, SignedMessage, TradeReceipt};
use crate::domain::resources::ResourceAmounts;
use crate::domain::trade::convert;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

pub struct TradeUseCase {
    pub backend: Arc<dyn Backend>,
    pub call_timeout: Duration,
}

impl TradeUseCase {
    pub async fn execute(
        &self,
        auth: &SignedMessage,
        resources: ResourceAmounts,
    ) -> Result<TradeReceipt, TradeError> {
        if resources.is_empty() {
            return Err(TradeError::NothingToTrade);
        }
        let expected = convert(&resources);

        let receipt = timeout(self.call_timeout, self.backend.trade(auth, resources))
            .await
            .unwrap_or(Err(BackendError::Timeout))?;

        // The backend clamps claims to what it tracked, so it may pay out less.
        if receipt.earned != expected {
            warn!(
                expected,
                earned = receipt.earned,
                "backend trade payout differs from local conversion"
            );
        }
        info!(earned = receipt.earned, balance = receipt.balance, "resources traded");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SubmarineRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingBackend {
        trades: Mutex<Vec<ResourceAmounts>>,
        response: Result<TradeReceipt, BackendError>,
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        async fn get_balance(&self, _auth: &SignedMessage) -> Result<u64, BackendError> {
            Ok(0)
        }

        async fn get_submarine(&self, _auth: &SignedMessage) -> Result<SubmarineRecord, BackendError> {
            Ok(SubmarineRecord { tier: 1, balance: 0 })
        }

        async fn upgrade_submarine(
            &self,
            _auth: &SignedMessage,
            _target_tier: u8,
            _on_chain_tx: Option<&str>,
        ) -> Result<SubmarineRecord, BackendError> {
            Err(BackendError::Rejected("not used".into()))
        }

        async fn trade(
            &self,
            _auth: &SignedMessage,
            resources: ResourceAmounts,
        ) -> Result<TradeReceipt, BackendError> {
            self.trades.lock().unwrap().push(resources);
            self.response.clone()
        }
    }

    fn auth() -> SignedMessage {
        SignedMessage {
            address: "0xabc".into(),
            message: "m".into(),
            signature: "s".into(),
        }
    }

    #[tokio::test]
    async fn submits_counters_and_returns_backend_receipt() {
        let backend = Arc::new(RecordingBackend {
            trades: Mutex::new(Vec::new()),
            response: Ok(TradeReceipt {
                earned: 40,
                balance: 140,
            }),
        });
        let trade = TradeUseCase {
            backend: backend.clone(),
            call_timeout: Duration::from_secs(1),
        };
        let resources = ResourceAmounts {
            nickel: 100,
            cobalt: 20,
            copper: 10,
            manganese: 5,
        };

        let receipt = trade.execute(&auth(), resources).await.expect("trade");

        assert_eq!(receipt, TradeReceipt { earned: 40, balance: 140 });
        assert_eq!(backend.trades.lock().unwrap().as_slice(), [resources]);
    }

    #[tokio::test]
    async fn empty_basket_never_reaches_backend() {
        let backend = Arc::new(RecordingBackend {
            trades: Mutex::new(Vec::new()),
            response: Ok(TradeReceipt { earned: 0, balance: 0 }),
        });
        let trade = TradeUseCase {
            backend: backend.clone(),
            call_timeout: Duration::from_secs(1),
        };

        let result = trade.execute(&auth(), ResourceAmounts::default()).await;

        assert_eq!(result, Err(TradeError::NothingToTrade));
        assert!(backend.trades.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_trade_error() {
        let trade = TradeUseCase {
            backend: Arc::new(RecordingBackend {
                trades: Mutex::new(Vec::new()),
                response: Err(BackendError::Unauthorized),
            }),
            call_timeout: Duration::from_secs(1),
        };

        let result = trade.execute(&auth(), ResourceAmounts::uniform(10)).await;

        assert_eq!(result, Err(TradeError::Backend(BackendError::Unauthorized)));
    }
}
