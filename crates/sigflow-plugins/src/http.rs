//! Shared HTTP plumbing for extractors and loaders.
//!
//! Every failure is mapped onto an [`ErrorCategory`] so that the run report
//! can tell authentication problems, missing resources, rate limits and
//! timeouts apart.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use sigflow_sdk::prelude::*;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest response excerpt carried in an error message.
const BODY_EXCERPT_LEN: usize = 200;

pub(crate) fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub(crate) fn build_client(component: &str, timeout_secs: u64) -> Result<reqwest::Client, ComponentError> {
    if timeout_secs == 0 {
        return Err(ComponentError::config(
            "INVALID_TIMEOUT",
            format!("{component}: timeout_secs must be > 0"),
        ));
    }
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("sigflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ComponentError::internal("HTTP_CLIENT", format!("{component}: failed to build client: {e}"))
        })
}

/// Send a request and decode a JSON body, classifying every failure.
pub(crate) async fn send_json(
    component: &str,
    request: RequestBuilder,
) -> Result<serde_json::Value, ComponentError> {
    let response = request
        .send()
        .await
        .map_err(|e| classify_transport(component, &e))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(component, status, retry_after, &body));
    }

    response.json::<serde_json::Value>().await.map_err(|e| {
        ComponentError::data("INVALID_JSON", format!("{component}: response is not valid JSON: {e}"))
    })
}

pub(crate) fn classify_transport(component: &str, err: &reqwest::Error) -> ComponentError {
    if err.is_timeout() {
        ComponentError::timeout("REQUEST_TIMEOUT", format!("{component}: request timed out: {err}"))
    } else if err.is_connect() {
        ComponentError::network("CONNECT_FAILED", format!("{component}: connection failed: {err}"))
    } else {
        ComponentError::network("REQUEST_FAILED", format!("{component}: request failed: {err}"))
    }
}

pub(crate) fn classify_status(
    component: &str,
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> ComponentError {
    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    let message = format!("{component}: HTTP {status}: {excerpt}");
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ComponentError::auth("HTTP_UNAUTHORIZED", message)
        }
        StatusCode::NOT_FOUND => ComponentError::not_found("HTTP_NOT_FOUND", message),
        StatusCode::TOO_MANY_REQUESTS => {
            ComponentError::rate_limit("HTTP_RATE_LIMITED", message, retry_after)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ComponentError::timeout("HTTP_TIMEOUT", message)
        }
        s if s.is_server_error() => ComponentError::network("HTTP_SERVER_ERROR", message),
        _ => ComponentError::data("HTTP_REJECTED", message),
    };
    err.with_details(serde_json::json!({ "status": status.as_u16() }))
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Strip a trailing slash so that `{base}/{path}` joins cleanly.
pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
