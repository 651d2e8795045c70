use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::ServiceError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY: usize = 2_048;

/// Build the shared HTTP client. No retries are layered on top: each call
/// performs exactly one request.
pub(crate) fn build_client(service: &'static str) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(concat!("listkit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ServiceError::Http {
            service,
            message: e.to_string(),
        })
}

/// Validate a configured base URL and strip any trailing slash so paths can
/// be appended with `format!`.
pub(crate) fn normalize_base_url(service: &'static str, raw: &str) -> Result<String, ServiceError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ServiceError::Config(format!("{service} base url '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ServiceError::Config(format!(
            "{service} base url must be http(s), got '{}'",
            parsed.scheme()
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

pub(crate) fn require_secret(
    service: &'static str,
    name: &str,
    value: &str,
) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Config(format!("{service} {name} is not set")));
    }
    Ok(())
}

/// Send a request and decode the JSON body, turning non-2xx answers into
/// `ServiceError::Status` with the (truncated) error body attached.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, ServiceError> {
    let resp = send(service, request).await?;
    resp.json::<T>().await.map_err(|e| ServiceError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Send a request whose success body is irrelevant.
pub(crate) async fn send_empty(
    service: &'static str,
    request: RequestBuilder,
) -> Result<(), ServiceError> {
    send(service, request).await.map(|_| ())
}

async fn send(
    service: &'static str,
    request: RequestBuilder,
) -> Result<reqwest::Response, ServiceError> {
    let resp = request.send().await.map_err(|e| {
        tracing::warn!(service, "request failed: {e}");
        ServiceError::Http {
            service,
            message: e.to_string(),
        }
    })?;

    let status = resp.status();
    tracing::debug!(service, url = %resp.url(), status = status.as_u16(), "response");
    if status.is_success() {
        return Ok(resp);
    }

    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    tracing::warn!(service, status = status.as_u16(), "remote error: {body}");
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}
