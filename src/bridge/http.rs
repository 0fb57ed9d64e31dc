//! Shared HTTP plumbing for the reqwest-backed bridges

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A base URL plus a client with a bounded request timeout
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("{}{}", self.base_url, path)
    }
}

/// Error detail carried in a non-2xx body: `{"error": {"code", "message"}}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

/// Extract the service's error detail, falling back to the status line
pub fn parse_error_body(status: reqwest::StatusCode, body: &str) -> ErrorDetail {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error,
        Err(e) => {
            debug!("Unstructured error body ({}): {}", status, e);
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            ErrorDetail {
                code: format!("Http{}", status.as_u16()),
                message: if body.trim().is_empty() {
                    reason.to_string()
                } else {
                    format!("{}: {}", reason, body.trim())
                },
            }
        }
    }
}

/// Drain a failed response into its error detail
pub async fn read_error(response: reqwest::Response) -> (u16, ErrorDetail) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status.as_u16(), parse_error_body(status, &body))
}
