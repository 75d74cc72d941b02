// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry-aware HTTP execution engine.
//!
//! One call to [`HttpEngine::execute`] is one logical provider call: attempts
//! run strictly one at a time, attempt `k` waits `k * backoff_step` first, and
//! only network, timeout and 5xx outcomes are retried.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use tokio_util::sync::CancellationToken;
use tollgate_config::model::HttpConfig;
use tollgate_core::{TokenUsage, TollgateError};
use tracing::{debug, warn};

use crate::usage::parse_usage;

/// Retry-relevant failure category of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transport failure: DNS, refused connection, unreadable body, bad request.
    Network,
    /// Deadline exceeded, or the caller cancelled.
    Timeout,
    /// 400-499.
    ClientError,
    /// 500 and above.
    ServerError,
    /// Any other non-2xx status.
    Http(u16),
}

impl ErrorClass {
    /// Classify a completed response status. `None` for 2xx.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            200..=299 => None,
            500..=u16::MAX => Some(Self::ServerError),
            400..=499 => Some(Self::ClientError),
            other => Some(Self::Http(other)),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::ServerError)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network"),
            Self::Timeout => f.write_str("timeout"),
            Self::ClientError => f.write_str("4xx"),
            Self::ServerError => f.write_str("5xx"),
            Self::Http(code) => write!(f, "http_{code}"),
        }
    }
}

/// One logical outbound call. Unset fields fall back to engine defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub endpoint: String,
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub payload: Vec<u8>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Retries after the first attempt. `Some(0)` means a single attempt.
    pub retries: Option<u32>,
}

impl HttpRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Outcome of [`HttpEngine::execute`]. Always the last attempt's result.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub body: Vec<u8>,
    /// Parsed on success; heuristic zero otherwise. Carries the last attempt's latency.
    pub usage: TokenUsage,
    pub error_class: Option<ErrorClass>,
    /// Network attempts actually started.
    pub attempts: u32,
}

impl HttpResult {
    fn failed(class: ErrorClass, attempts: u32) -> Self {
        Self {
            success: false,
            status_code: None,
            body: Vec::new(),
            usage: TokenUsage::heuristic(),
            error_class: Some(class),
            attempts,
        }
    }

    /// Error class as a tag string, empty on success.
    pub fn error_tag(&self) -> String {
        self.error_class.map(|c| c.to_string()).unwrap_or_default()
    }
}

/// Validated, attempt-independent parts of a request.
struct Prepared {
    url: Url,
    method: Method,
    headers: HeaderMap,
    send_body: bool,
    timeout: Duration,
    retries: u32,
}

/// HTTP execution engine with bounded linear-backoff retries.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    default_timeout: Duration,
    default_retries: u32,
    default_method: String,
    backoff_step: Duration,
}

impl HttpEngine {
    /// Build an engine from the `[http]` configuration section.
    pub fn new(config: &HttpConfig) -> Result<Self, TollgateError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TollgateError::Execution {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            default_timeout: Duration::from_secs(config.timeout_secs),
            default_retries: config.max_retries,
            default_method: config.default_method.clone(),
            backoff_step: Duration::from_millis(config.backoff_step_ms),
        })
    }

    /// Override the backoff unit.
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn backoff_step(&self) -> Duration {
        self.backoff_step
    }

    /// Perform a call, retrying transient failures.
    ///
    /// Cancelling `cancel` during backoff or an in-flight attempt returns a
    /// `timeout` result immediately without another attempt.
    pub async fn execute(&self, request: &HttpRequest, cancel: &CancellationToken) -> HttpResult {
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(reason) => {
                warn!(endpoint = %request.endpoint, %reason, "request could not be built");
                return HttpResult::failed(ErrorClass::Network, 0);
            }
        };

        let max_attempts = prepared.retries.saturating_add(1);
        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                let backoff = self.backoff_step.saturating_mul(attempt);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(attempt, "cancelled during backoff");
                        return HttpResult::failed(ErrorClass::Timeout, attempt);
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
            } else if cancel.is_cancelled() {
                return HttpResult::failed(ErrorClass::Timeout, 0);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "cancelled during attempt");
                    return HttpResult::failed(ErrorClass::Timeout, attempt + 1);
                }
                result = self.attempt(&prepared, request, attempt + 1) => result,
            };
            attempt += 1;

            let Some(class) = result.error_class else {
                return result;
            };
            if !class.is_retryable() || attempt >= max_attempts {
                return result;
            }
            warn!(
                endpoint = %request.endpoint,
                attempt,
                error_class = %class,
                "transient failure, will retry"
            );
        }
    }

    fn prepare(&self, request: &HttpRequest) -> Result<Prepared, String> {
        let url = Url::parse(&request.endpoint).map_err(|e| format!("invalid endpoint: {e}"))?;

        let method_name = request
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_method)
            .to_ascii_uppercase();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|e| format!("invalid method {method_name}: {e}"))?;

        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name {name}: {e}"))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| format!("invalid header value: {e}"))?;
            headers.insert(name, value);
        }

        let send_body =
            !(request.payload.is_empty() && (method == Method::GET || method == Method::HEAD));

        Ok(Prepared {
            url,
            method,
            headers,
            send_body,
            timeout: request.timeout.unwrap_or(self.default_timeout),
            retries: request.retries.unwrap_or(self.default_retries),
        })
    }

    async fn attempt(&self, prepared: &Prepared, request: &HttpRequest, attempts: u32) -> HttpResult {
        let mut builder = self
            .client
            .request(prepared.method.clone(), prepared.url.clone())
            .headers(prepared.headers.clone())
            .timeout(prepared.timeout);
        if prepared.send_body {
            builder = builder.body(request.payload.clone());
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let class = classify_transport(&e);
                debug!(attempt = attempts, error_class = %class, error = %e, "attempt failed");
                let mut result = HttpResult::failed(class, attempts);
                result.usage.latency_ms = elapsed_ms(start);
                return result;
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                let class = classify_transport(&e);
                debug!(attempt = attempts, status, error = %e, "failed to read response body");
                let mut result = HttpResult::failed(class, attempts);
                result.status_code = Some(status);
                result.usage.latency_ms = elapsed_ms(start);
                return result;
            }
        };
        let latency_ms = elapsed_ms(start);
        let error_class = ErrorClass::from_status(status);
        debug!(attempt = attempts, status, latency_ms, "attempt completed");

        let mut usage = if error_class.is_none() {
            parse_usage(&body)
        } else {
            TokenUsage::heuristic()
        };
        usage.latency_ms = latency_ms;

        HttpResult {
            success: error_class.is_none(),
            status_code: Some(status),
            body,
            usage,
            error_class,
            attempts,
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Timeout when reqwest says so or any error in the chain mentions a deadline.
fn classify_transport(err: &reqwest::Error) -> ErrorClass {
    if err.is_timeout() {
        return ErrorClass::Timeout;
    }
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("timeout") || text.contains("timed out") || text.contains("deadline exceeded")
        {
            return ErrorClass::Timeout;
        }
        current = e.source();
    }
    ErrorClass::Network
}
