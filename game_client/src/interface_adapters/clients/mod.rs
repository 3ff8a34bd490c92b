// Outbound clients for the session server, backend, ledger gateway and signer.

pub mod backend;
pub mod ledger;
pub mod session;
pub mod signer;

use serde::Deserialize;
use url::Url;

// Error body shared by every HTTP collaborator: `{ "message": ..., "code": ... }`.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl ApiErrorBody {
    async fn read(response: reqwest::Response) -> Self {
        response.json::<ApiErrorBody>().await.unwrap_or_default()
    }

    fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }
}

// `Url::join` drops the last path segment unless the base ends with a slash.
pub(crate) fn base_url_with_slash(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}
