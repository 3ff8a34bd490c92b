use crate::domain::ports::{SignatureVerifier, VerifyError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Serialize)]
struct VerifySignatureRequest<'a> {
    message: &'a str,
    signature: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifySignatureResponse {
    address: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
}

// Thin reqwest client for the external signature recovery service.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

fn classify(status: StatusCode, code: Option<&str>) -> VerifyError {
    match (status, code) {
        (_, Some("invalid_signature")) => VerifyError::Invalid,
        (StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED, _) => VerifyError::Invalid,
        _ => VerifyError::Unavailable,
    }
}

#[async_trait]
impl SignatureVerifier for AuthClient {
    async fn verify(&self, message: &str, signature: &str) -> Result<String, VerifyError> {
        let url = format!("{}/auth/verify-signature", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&VerifySignatureRequest { message, signature })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "signature verification request failed");
                VerifyError::Unavailable
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<VerifySignatureResponse>()
                .await
                .map(|body| body.address)
                .map_err(|_| VerifyError::Unavailable);
        }

        let body = response.json::<ErrorResponse>().await.unwrap_or_default();
        Err(classify(status, body.code.as_deref()))
    }
}
