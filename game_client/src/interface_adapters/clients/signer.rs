use super::{ApiErrorBody, base_url_with_slash};
use crate::domain::errors::SignError;
use crate::domain::ports::Signer;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signature: String,
}

// Signing capability exposed by the wallet bridge over HTTP. The key never leaves the bridge.
#[derive(Clone)]
pub struct HttpSigner {
    http: reqwest::Client,
    sign_url: Url,
}

impl HttpSigner {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SignError> {
        let sign_url = base_url_with_slash(base_url)
            .and_then(|base| base.join("sign"))
            .map_err(|e| SignError::Unavailable(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignError::Unavailable(e.to_string()))?;
        Ok(Self { http, sign_url })
    }
}

#[async_trait]
impl Signer for HttpSigner {
    async fn sign(&self, message: &str) -> Result<String, SignError> {
        let response = self
            .http
            .post(self.sign_url.clone())
            .json(&SignRequest { message })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SignError::Timeout
                } else {
                    SignError::Unavailable(e.to_string())
                }
            })?;

        if response.status().is_success() {
            return response
                .json::<SignResponse>()
                .await
                .map(|body| body.signature)
                .map_err(|e| SignError::Unavailable(e.to_string()));
        }

        let status = response.status();
        let body = ApiErrorBody::read(response).await;
        if status == StatusCode::FORBIDDEN || body.code() == "user_rejected" {
            return Err(SignError::Rejected);
        }
        Err(SignError::Unavailable(format!("{status}: {}", body.message)))
    }
}
