//! HTTP transport shared by all gateways.
//!
//! One configured `reqwest` client with a fixed base URL. Every request reads
//! the token from the [`Session`] at send time and attaches it as a bearer
//! header; there is no token cached inside the transport.

use crate::session::Session;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Request timeout used when the configuration does not provide one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "PetMap/0.1.0";

/// Failure at the HTTP boundary: network error, timeout or non-2xx status
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    /// HTTP status, absent for network failures
    pub status: Option<u16>,
    /// Server-supplied message when there was one, a generic description otherwise
    pub message: String,
}

impl TransportError {
    fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "Network error: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Body of an outgoing request.
///
/// The transport does not decide the encoding; gateways pick one.
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    pub fn is_json(&self) -> bool {
        matches!(self, RequestBody::Json(_))
    }
}

/// Configured HTTP client bound to one service and one session
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    http: reqwest::Client,
    session: Session,
}

impl Transport {
    /// Build a transport for `base_url` with a per-request `timeout`
    pub fn new(
        base_url: impl Into<String>,
        session: Session,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::network(format!("Client build failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Absolute URL for a service path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, body: &RequestBody) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Multipart bodies get their boundary-bearing type from the encoder
        if body.is_json() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = self.session.current() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| TransportError::network("Session token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Send one request and return the decoded response body.
    ///
    /// No retry is attempted.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, TransportError> {
        let url = self.url(path);
        let headers = self.headers(&body)?;

        log::debug!("{} {}", method, path);

        let request = self.http.request(method.clone(), &url).headers(headers);
        let request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| {
            let err = if e.is_timeout() {
                TransportError::network("Request timed out")
            } else {
                TransportError::network(format!("Request failed: {}", e))
            };
            log::warn!("{} {} failed: {}", method, path, err);
            err
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {}", e)))?;

        if status.is_success() {
            Ok(decode_body(&bytes))
        } else {
            let err = TransportError {
                status: Some(status.as_u16()),
                message: error_message(status, &bytes),
            };
            log::warn!("{} {} rejected: {}", method, path, err);
            Err(err)
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.send(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post(&self, path: &str, body: RequestBody) -> Result<Value, TransportError> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: RequestBody) -> Result<Value, TransportError> {
        self.send(Method::PUT, path, body).await
    }
}

/// Empty body becomes null, JSON is parsed, anything else is kept as text
fn decode_body(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let server_message = serde_json::from_slice::<Value>(bytes).ok().and_then(|body| {
        ["message", "error"].iter().find_map(|key| {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|msg| !msg.is_empty())
                .map(str::to_string)
        })
    });

    server_message.unwrap_or_else(|| format!("Request failed with status {}", status))
}
