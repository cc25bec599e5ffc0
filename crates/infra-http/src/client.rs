// HTTP client construction and request helpers

use jobmatch_core::domain::ConnectionParams;
use jobmatch_core::port::{AdapterBuildError, FetchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = concat!("jobmatch/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client plus the timeout it was built with (reported on timeouts)
#[derive(Clone)]
pub struct SourceClient {
    client: Client,
    timeout_ms: u64,
}

impl SourceClient {
    /// One client per adapter instance, configured from the source's connection params
    pub fn from_params(params: &ConnectionParams) -> Result<Self, AdapterBuildError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &params.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AdapterBuildError::InvalidConfig(format!("header '{name}': {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                AdapterBuildError::InvalidConfig(format!("header '{name}' value: {e}"))
            })?;
            headers.insert(name, value);
        }

        let timeout_secs = params.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = Client::builder()
            .user_agent(params.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| AdapterBuildError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: timeout_secs * 1000,
        })
    }

    /// GET `url` with `query` and return the body as text.
    ///
    /// Failures are classified so the retry policy can tell transient from permanent.
    pub async fn get_text(&self, url: &Url, query: &[(String, String)]) -> Result<String, FetchError> {
        debug!(url = %url, params = query.len(), "GET");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string();
            return Err(FetchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_ms)
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            FetchError::Parse(err.to_string())
        } else if err.is_builder() {
            FetchError::Permanent(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Parse and check a configured URL
pub fn parse_url(raw: &str) -> Result<Url, AdapterBuildError> {
    let url = Url::parse(raw)
        .map_err(|e| AdapterBuildError::InvalidConfig(format!("url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AdapterBuildError::InvalidConfig(format!(
            "unsupported url scheme '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_build_client_with_headers() {
        let params = ConnectionParams {
            headers: BTreeMap::from([("X-Api-Key".to_string(), "secret".to_string())]),
            ..Default::default()
        };
        assert!(SourceClient::from_params(&params).is_ok());
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let params = ConnectionParams {
            headers: BTreeMap::from([("bad header".to_string(), "x".to_string())]),
            ..Default::default()
        };
        assert!(matches!(
            SourceClient::from_params(&params),
            Err(AdapterBuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(parse_url("https://example.com/jobs").is_ok());
        assert!(parse_url("ftp://example.com").is_err());
        assert!(parse_url("not a url").is_err());
    }
}
