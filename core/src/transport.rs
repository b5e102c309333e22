//! Request execution and response normalization shared by every accessor.
//!
//! # Design
//! `build_request` turns an endpoint plus `RequestOptions` into a plain
//! `HttpRequest`, `Transport::execute` performs the round-trip, and `decode`
//! maps the `HttpResponse` to either a typed payload or an `ApiError`. Only
//! `execute` does I/O; the other two are deterministic.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Header attached to every request unless the caller overrides it.
pub const CONTENT_TYPE: (&str, &str) = ("Content-Type", "application/json");

/// Per-request options. `method` defaults to `GET`; `body` is sent verbatim.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Build the request for `endpoint` relative to the configured base URL.
///
/// Caller headers are merged over the default `Content-Type`; a caller header
/// with the same name (case-insensitive) replaces the default.
pub fn build_request(config: &ClientConfig, endpoint: &str, options: RequestOptions) -> HttpRequest {
    let mut headers = vec![(CONTENT_TYPE.0.to_string(), CONTENT_TYPE.1.to_string())];
    for (name, value) in options.headers {
        match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some(existing) => *existing = (name, value),
            None => headers.push((name, value)),
        }
    }
    HttpRequest {
        method: options.method,
        url: config.url(endpoint),
        headers,
        body: options.body,
    }
}

/// Executes one HTTP round-trip.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status; `Err` is reserved for `ApiError::Transport`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(timeout: Duration) -> Self {
        // Failing statuses come back as data so `decode` can read the body.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Execute `request`, logging the outbound call and the inbound status.
pub fn send<T: Transport + ?Sized>(transport: &T, request: &HttpRequest) -> Result<HttpResponse> {
    debug!(method = %request.method, url = %request.url, "api request");
    match transport.execute(request) {
        Ok(response) => {
            debug!(status = response.status, url = %request.url, "api response");
            Ok(response)
        }
        Err(err) => {
            warn!(method = %request.method, url = %request.url, error = %err, "api request failed");
            Err(err)
        }
    }
}

/// Normalize a response into a JSON value or an error.
pub fn decode_value(response: &HttpResponse) -> Result<Value> {
    if !response.is_success() {
        let err = status_error(response);
        warn!(status = response.status, detail = err.detail().unwrap_or_default(), "api error response");
        return Err(err);
    }
    let value: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    debug!(items = payload_items(&value), "api payload");
    Ok(value)
}

/// Normalize a response and decode it into `T`.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let value = decode_value(response)?;
    serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

fn payload_items(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        _ => 1,
    }
}

/// Map a non-2xx response to `NotFound` or `Http`.
pub fn status_error(response: &HttpResponse) -> ApiError {
    let detail = extract_detail(&response.body)
        .unwrap_or_else(|| format!("API Error: {}", response.status));
    if response.status == 404 {
        ApiError::NotFound { detail }
    } else {
        ApiError::Http {
            status: response.status,
            detail,
        }
    }
}

/// The `detail` field of a JSON error body, or the raw text when the body is
/// not JSON. Structured details (validation error lists) are rendered as
/// compact JSON.
fn extract_detail(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("detail")? {
            Value::Null => None,
            Value::String(detail) if detail.is_empty() => None,
            Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        },
        Err(_) if body.is_empty() => None,
        Err(_) => Some(body.to_string()),
    }
}
