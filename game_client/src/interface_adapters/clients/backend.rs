use super::{ApiErrorBody, base_url_with_slash};
use crate::domain::errors::BackendError;
use crate::domain::ports::{Backend, SignedMessage, SubmarineRecord, TradeReceipt};
use crate::domain::resources::ResourceAmounts;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct SubmarineResponse {
    tier: u8,
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct TradeResponse {
    earned: u64,
    balance: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeRequest<'a> {
    address: &'a str,
    message: &'a str,
    signature: &'a str,
    target_tier: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_chain_tx: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ResourcesBody {
    nickel: u32,
    cobalt: u32,
    copper: u32,
    manganese: u32,
}

#[derive(Debug, Serialize)]
struct TradeRequest<'a> {
    address: &'a str,
    message: &'a str,
    signature: &'a str,
    resources: ResourcesBody,
}

// Thin reqwest client for the authoritative backend endpoints.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url =
            base_url_with_slash(base_url).map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn signed_url(&self, path: &str, auth: &SignedMessage) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(&format!("{path}/{}", auth.address))
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("message", &auth.message)
            .append_pair("signature", &auth.signature);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    async fn read<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        if response.status().is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| BackendError::Decode(e.to_string()));
        }
        let status = response.status();
        let body = ApiErrorBody::read(response).await;
        Err(classify(status, &body))
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

fn classify(status: StatusCode, body: &ApiErrorBody) -> BackendError {
    match body.code() {
        "unauthorized" => return BackendError::Unauthorized,
        "insufficient_funds" => return BackendError::InsufficientFunds,
        "non_sequential" => return BackendError::NonSequential,
        _ => {}
    }
    if status == StatusCode::UNAUTHORIZED {
        BackendError::Unauthorized
    } else if status.is_server_error() {
        BackendError::Unavailable(format!("{status}: {}", body.message))
    } else {
        BackendError::Rejected(body.message.clone())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_balance(&self, auth: &SignedMessage) -> Result<u64, BackendError> {
        let url = self.signed_url("balance", auth)?;
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        Ok(Self::read::<BalanceResponse>(response).await?.balance)
    }

    async fn get_submarine(&self, auth: &SignedMessage) -> Result<SubmarineRecord, BackendError> {
        let url = self.signed_url("submarine", auth)?;
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let body = Self::read::<SubmarineResponse>(response).await?;
        Ok(SubmarineRecord {
            tier: body.tier,
            balance: body.balance,
        })
    }

    async fn upgrade_submarine(
        &self,
        auth: &SignedMessage,
        target_tier: u8,
        on_chain_tx: Option<&str>,
    ) -> Result<SubmarineRecord, BackendError> {
        let url = self.endpoint("submarine/upgrade")?;
        let response = self
            .http
            .post(url)
            .json(&UpgradeRequest {
                address: &auth.address,
                message: &auth.message,
                signature: &auth.signature,
                target_tier,
                on_chain_tx,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read::<SubmarineResponse>(response).await?;
        Ok(SubmarineRecord {
            tier: body.tier,
            balance: body.balance,
        })
    }

    async fn trade(
        &self,
        auth: &SignedMessage,
        resources: ResourceAmounts,
    ) -> Result<TradeReceipt, BackendError> {
        let url = self.endpoint("submarine/trade")?;
        let response = self
            .http
            .post(url)
            .json(&TradeRequest {
                address: &auth.address,
                message: &auth.message,
                signature: &auth.signature,
                resources: ResourcesBody {
                    nickel: resources.nickel,
                    cobalt: resources.cobalt,
                    copper: resources.copper,
                    manganese: resources.manganese,
                },
            })
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read::<TradeResponse>(response).await?;
        Ok(TradeReceipt {
            earned: body.earned,
            balance: body.balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str, message: &str) -> ApiErrorBody {
        ApiErrorBody {
            message: message.to_string(),
            code: Some(code.to_string()),
        }
    }

    #[test]
    fn error_codes_take_precedence_over_status() {
        assert_eq!(
            classify(StatusCode::CONFLICT, &body("non_sequential", "x")),
            BackendError::NonSequential
        );
        assert_eq!(
            classify(StatusCode::PAYMENT_REQUIRED, &body("insufficient_funds", "x")),
            BackendError::InsufficientFunds
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify(StatusCode::BAD_GATEWAY, &body("storage_error", "db down"));

        assert!(err.is_transient());
    }

    #[test]
    fn other_client_errors_are_rejections() {
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, &body("invalid_tier", "tier out of range")),
            BackendError::Rejected("tier out of range".into())
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, &ApiErrorBody::default()),
            BackendError::Unauthorized
        );
    }

    #[test]
    fn signed_url_carries_credentials_as_query() {
        let backend =
            HttpBackend::new("http://127.0.0.1:3001/", Duration::from_secs(1)).expect("client");
        let auth = SignedMessage {
            address: "0xabc".into(),
            message: "Sign this message".into(),
            signature: "0xsig".into(),
        };

        let url = backend.signed_url("submarine", &auth).expect("url");

        assert_eq!(url.path(), "/submarine/0xabc");
        assert_eq!(
            url.query(),
            Some("message=Sign+this+message&signature=0xsig")
        );
    }
}
