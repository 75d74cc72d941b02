// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The work a metered session wraps.
//!
//! A [`Delegate`] performs one logical call for a profile. Classified failures
//! (a 4xx, a non-zero exit) come back as an unsuccessful [`DelegateOutcome`];
//! `Err` means the call could not be made at all.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tollgate_config::model::ProfileConfig;
use tollgate_core::{TokenUsage, TollgateError};
use tollgate_http::{HttpEngine, HttpRequest};
use tracing::debug;

use crate::metrics;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Result of one delegated call.
#[derive(Debug, Clone, PartialEq)]
pub struct DelegateOutcome {
    pub success: bool,
    /// Response body, or tool stdout followed by stderr.
    pub output: Vec<u8>,
    pub usage: TokenUsage,
    pub status_code: Option<u16>,
    /// Short failure description recorded in the session notes.
    pub failure: Option<String>,
    pub attempts: u32,
}

impl DelegateOutcome {
    pub fn succeeded(output: Vec<u8>, usage: TokenUsage) -> Self {
        Self {
            success: true,
            output,
            usage,
            status_code: None,
            failure: None,
            attempts: 1,
        }
    }

    pub fn failed(failure: impl Into<String>, output: Vec<u8>, usage: TokenUsage) -> Self {
        Self {
            success: false,
            output,
            usage,
            status_code: None,
            failure: Some(failure.into()),
            attempts: 1,
        }
    }
}

#[async_trait]
pub trait Delegate: Send + Sync {
    async fn execute(
        &self,
        profile: &ProfileConfig,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DelegateOutcome, TollgateError>;
}

/// Provider call through the retrying [`HttpEngine`].
#[derive(Debug, Clone)]
pub struct HttpDelegate {
    engine: HttpEngine,
}

impl HttpDelegate {
    pub fn new(engine: HttpEngine) -> Self {
        Self { engine }
    }

    /// Assemble the request for `profile`. Header names are lowercased;
    /// explicit profile headers win over mapped credentials.
    pub fn build_request(
        profile: &ProfileConfig,
        payload: &[u8],
    ) -> Result<HttpRequest, TollgateError> {
        let endpoint = profile.endpoint.as_deref().ok_or_else(|| {
            TollgateError::Config(format!("profile '{}' has no endpoint", profile.key))
        })?;

        let mut headers = provider_headers(&profile.env);
        for (name, value) in &profile.headers {
            headers.insert(name.to_ascii_lowercase(), resolve_value(value));
        }

        let mut request = HttpRequest::new(endpoint).with_payload(payload.to_vec());
        request.headers = headers;
        Ok(request)
    }
}

#[async_trait]
impl Delegate for HttpDelegate {
    async fn execute(
        &self,
        profile: &ProfileConfig,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DelegateOutcome, TollgateError> {
        let request = Self::build_request(profile, payload)?;
        let result = self.engine.execute(&request, cancel).await;

        let tag = result.error_tag();
        metrics::record_http_call(&profile.key, &tag, result.attempts);
        debug!(
            profile = %profile.key,
            attempts = result.attempts,
            status = ?result.status_code,
            error_class = %tag,
            "http delegate finished"
        );

        Ok(DelegateOutcome {
            success: result.success,
            output: result.body,
            usage: result.usage,
            status_code: result.status_code,
            failure: (!result.success).then_some(tag),
            attempts: result.attempts,
        })
    }
}

/// Map provider credential variables onto request headers.
///
/// Always sets `content-type: application/json`.
pub fn provider_headers(env: &BTreeMap<String, String>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    for (key, value) in env {
        let value = resolve_value(value);
        match key.as_str() {
            "ANTHROPIC_API_KEY" => {
                headers.insert("x-api-key".to_string(), value);
                headers.insert(
                    "anthropic-version".to_string(),
                    ANTHROPIC_VERSION.to_string(),
                );
            }
            "OPENAI_API_KEY" | "OPENROUTER_API_KEY" => {
                headers.insert("authorization".to_string(), format!("Bearer {value}"));
            }
            _ => {}
        }
    }
    headers
}

/// `${NAME}` reads the process environment (empty when unset); anything else
/// is literal.
pub fn resolve_value(value: &str) -> String {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(name) => std::env::var(name).unwrap_or_default(),
        None => value.to_string(),
    }
}
