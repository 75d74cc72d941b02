// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic delegates and suggestion sources.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tollgate_agent::{Delegate, DelegateOutcome, Suggestion, SuggestionSource};
use tollgate_config::model::ProfileConfig;
use tollgate_core::{TokenUsage, TollgateError};

/// One recorded invocation of a [`StubDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCall {
    pub profile: String,
    pub payload: Vec<u8>,
}

/// A delegate that pops pre-configured outcomes from a FIFO queue.
///
/// When the queue is empty it succeeds with 100 input / 50 output tokens.
#[derive(Clone, Default)]
pub struct StubDelegate {
    outcomes: Arc<Mutex<VecDeque<Result<DelegateOutcome, TollgateError>>>>,
    calls: Arc<Mutex<Vec<StubCall>>>,
}

impl StubDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: Vec<DelegateOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into_iter().map(Ok).collect())),
            calls: Arc::default(),
        }
    }

    pub async fn push_outcome(&self, outcome: DelegateOutcome) {
        self.outcomes.lock().await.push_back(Ok(outcome));
    }

    /// Queue a hard failure (the delegate could not run at all).
    pub async fn push_error(&self, error: TollgateError) {
        self.outcomes.lock().await.push_back(Err(error));
    }

    pub async fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub fn default_outcome() -> DelegateOutcome {
        DelegateOutcome::succeeded(b"stub response".to_vec(), TokenUsage::exact(100, 50))
    }
}

#[async_trait]
impl Delegate for StubDelegate {
    async fn execute(
        &self,
        profile: &ProfileConfig,
        payload: &[u8],
        _cancel: &CancellationToken,
    ) -> Result<DelegateOutcome, TollgateError> {
        self.calls.lock().await.push(StubCall {
            profile: profile.key.clone(),
            payload: payload.to_vec(),
        });
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Self::default_outcome()))
    }
}

/// Returns the same suggestions on every call, truncated to the limit.
#[derive(Debug, Clone, Default)]
pub struct StubSuggestions {
    suggestions: Vec<Suggestion>,
}

impl StubSuggestions {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        Self { suggestions }
    }
}

#[async_trait]
impl SuggestionSource for StubSuggestions {
    async fn suggestions(&self, limit: usize) -> Result<Vec<Suggestion>, TollgateError> {
        Ok(self.suggestions.iter().take(limit).cloned().collect())
    }
}
