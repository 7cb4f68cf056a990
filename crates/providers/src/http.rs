//! The one outbound round trip every provider variant shares.
//!
//! Failure classification happens here, at the source: a timeout, a missing
//! response, a non-success status and an unparseable body each map to their
//! own [`ProviderError`] variant.

use docrelay_core::error::ProviderError;
use std::time::Duration;
use tracing::{debug, warn};

/// Build the HTTP client a provider reuses for all its calls.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

/// A single JSON POST with bearer authentication.
pub(crate) struct JsonPost<'a> {
    pub provider: &'a str,
    pub url: &'a str,
    pub api_key: &'a str,
    pub headers: &'a [(String, String)],
    pub body: &'a serde_json::Value,
    pub timeout_secs: u64,
}

impl JsonPost<'_> {
    /// Send once. No retries: a paid generation call is never repeated here.
    pub(crate) async fn send(
        &self,
        client: &reqwest::Client,
    ) -> Result<serde_json::Value, ProviderError> {
        let mut request = client
            .post(self.url)
            .bearer_auth(self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(self.body);

        for (name, value) in self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(provider = %self.provider, url = %self.url, "Sending provider request");

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.map_err(|e| self.classify(e))?;
            warn!(
                provider = %self.provider,
                status = status.as_u16(),
                body = %body,
                "Provider returned error"
            );
            return Err(ProviderError::ApiError {
                provider: self.provider.to_string(),
                status_code: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
            provider: self.provider.to_string(),
            reason: format!("response body is not JSON: {e}"),
        })
    }

    fn classify(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            warn!(
                provider = %self.provider,
                timeout_secs = self.timeout_secs,
                "Provider request timed out"
            );
            ProviderError::Timeout {
                provider: self.provider.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            warn!(provider = %self.provider, error = %error, "Provider unreachable");
            ProviderError::Network {
                provider: self.provider.to_string(),
                message: error.to_string(),
            }
        }
    }
}
