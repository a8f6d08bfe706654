//! HTTP helpers for model APIs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{AgentError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Default headers for a Bearer-token API.
pub(crate) fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a failed HTTP status to an API error, preferring the provider's own message.
pub(crate) fn status_to_error(status: u16, body: &str) -> AgentError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());
    AgentError::api(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_provider_error_message() {
        let err = status_to_error(401, r#"{"error":{"message":"Incorrect API key provided"}}"#);
        assert_eq!(err.to_string(), "API error (status 401): Incorrect API key provided");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let err = status_to_error(502, "bad gateway");
        assert_eq!(err.to_string(), "API error (status 502): bad gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn bearer_headers_carry_token() {
        let headers = bearer_headers("sk-test");
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
    }
}
