// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metered execution of runner profiles.
//!
//! Every run is one session: pre-flight budget check, begin, delegate,
//! record usage when tokens were reported, accrue spend, end. Once a session
//! has begun it is ended on every path, with the failure reason in its notes.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tollgate_config::model::{AdapterKind, ProfileConfig};
use tollgate_core::{Scope, SessionId, SessionMeta, TokenUsage, TollgateError};
use tollgate_cost::{BudgetTracker, SessionLedger};
use tollgate_http::HttpEngine;
use tracing::{error, info, warn};

use crate::delegate::{Delegate, DelegateOutcome, HttpDelegate};
use crate::metrics;
use crate::registry::RunnerRegistry;
use crate::tool::ToolDelegate;

/// One call to make against a registered profile.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub profile: String,
    pub payload: Vec<u8>,
    pub project: String,
    pub branch: String,
    pub task_type: String,
    /// Expected cost, added to current spend by the pre-flight check.
    pub planned_usd: f64,
}

impl RunRequest {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_planned_usd(mut self, planned_usd: f64) -> Self {
        self.planned_usd = planned_usd;
        self
    }
}

/// What a finished session produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub session_id: SessionId,
    pub success: bool,
    pub output: Vec<u8>,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub status_code: Option<u16>,
    pub attempts: u32,
    /// The notes written to the session row.
    pub notes: String,
    pub latency_ms: u64,
}

/// Runs profiles from a [`RunnerRegistry`] through the ledger and tracker.
pub struct Executor {
    registry: RunnerRegistry,
    ledger: SessionLedger,
    tracker: BudgetTracker,
    http: Arc<dyn Delegate>,
    tool: Arc<dyn Delegate>,
}

impl Executor {
    pub fn new(
        registry: RunnerRegistry,
        ledger: SessionLedger,
        tracker: BudgetTracker,
        engine: HttpEngine,
    ) -> Self {
        Self {
            registry,
            ledger,
            tracker,
            http: Arc::new(HttpDelegate::new(engine)),
            tool: Arc::new(ToolDelegate::new()),
        }
    }

    pub fn with_http_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.http = delegate;
        self
    }

    pub fn with_tool_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.tool = delegate;
        self
    }

    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }

    /// Run through whichever adapter the profile declares.
    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunResult, TollgateError> {
        let profile = self.registry.get(&request.profile)?;
        match profile.adapter {
            AdapterKind::Http => self.metered(profile, self.http.as_ref(), request, cancel).await,
            AdapterKind::Tool => self.metered(profile, self.tool.as_ref(), request, cancel).await,
        }
    }

    pub async fn run_http(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunResult, TollgateError> {
        let profile = self.profile_for(request, AdapterKind::Http)?;
        self.metered(profile, self.http.as_ref(), request, cancel)
            .await
    }

    pub async fn run_tool(
        &self,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunResult, TollgateError> {
        let profile = self.profile_for(request, AdapterKind::Tool)?;
        self.metered(profile, self.tool.as_ref(), request, cancel)
            .await
    }

    fn profile_for(
        &self,
        request: &RunRequest,
        adapter: AdapterKind,
    ) -> Result<&ProfileConfig, TollgateError> {
        let profile = self.registry.get(&request.profile)?;
        if profile.adapter != adapter {
            return Err(TollgateError::InvalidInput(format!(
                "profile '{}' uses the {} adapter, not {}",
                profile.key,
                profile.adapter.as_str(),
                adapter.as_str()
            )));
        }
        Ok(profile)
    }

    async fn metered(
        &self,
        profile: &ProfileConfig,
        delegate: &dyn Delegate,
        request: &RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunResult, TollgateError> {
        let meta = SessionMeta::new(&profile.key, profile.adapter.as_str())
            .with_project(&request.project)
            .with_branch(&request.branch)
            .with_task_type(&request.task_type);

        self.preflight(&meta, request.planned_usd).await?;

        let session_id = self.ledger.begin(&meta).await?;
        let started = Instant::now();

        let (outcome, hard_error) = match delegate.execute(profile, &request.payload, cancel).await
        {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "delegate could not run");
                let outcome = DelegateOutcome {
                    attempts: 0,
                    ..DelegateOutcome::failed(e.to_string(), Vec::new(), TokenUsage::heuristic())
                };
                (outcome, Some(e))
            }
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut notes = outcome.failure.clone().unwrap_or_default();
        let mut cost_usd = 0.0;

        if !outcome.usage.is_zero() {
            let model = if profile.model.is_empty() {
                profile.key.as_str()
            } else {
                profile.model.as_str()
            };
            match self
                .ledger
                .record_usage(&session_id, &outcome.usage, model, profile.adapter.as_str())
                .await
            {
                Ok(record) => {
                    cost_usd = record.total_cost();
                    metrics::record_tokens(
                        model,
                        outcome.usage.input_tokens,
                        outcome.usage.output_tokens,
                    );
                    if let Err(e) = self.tracker.accrue_spend(&meta, cost_usd).await {
                        warn!(session_id = %session_id, error = %e, "spend accrual failed");
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "usage record failed");
                    append_note(&mut notes, &format!("usage record failed: {e}"));
                }
            }
        }

        if let Err(e) = self
            .ledger
            .end(&session_id, outcome.success, latency_ms, &notes)
            .await
        {
            error!(session_id = %session_id, error = %e, "failed to end session");
            return Err(e);
        }
        metrics::record_session(&profile.key, outcome.success, latency_ms as f64 / 1000.0);

        if let Some(e) = hard_error {
            return Err(e);
        }

        info!(
            session_id = %session_id,
            profile = %profile.key,
            success = outcome.success,
            latency_ms,
            input_tokens = outcome.usage.input_tokens,
            output_tokens = outcome.usage.output_tokens,
            estimate = %outcome.usage.estimate,
            cost_usd,
            "session completed"
        );

        Ok(RunResult {
            session_id,
            success: outcome.success,
            output: outcome.output,
            usage: outcome.usage,
            cost_usd,
            status_code: outcome.status_code,
            attempts: outcome.attempts,
            notes,
            latency_ms,
        })
    }

    /// Check the global budget and any budget matching the session labels.
    ///
    /// A refusal is fatal only when `[budget] enforce` is set. Labelled scopes
    /// without a budget are skipped; the global check follows `on_missing`.
    async fn preflight(&self, meta: &SessionMeta, planned_usd: f64) -> Result<(), TollgateError> {
        let mut scopes = vec![(Scope::Global, "")];
        for (scope, target) in [
            (Scope::Project, meta.project.as_str()),
            (Scope::Profile, meta.profile.as_str()),
        ] {
            if target.is_empty() {
                continue;
            }
            match self.tracker.get_budget(scope, target).await {
                Ok(_) => scopes.push((scope, target)),
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(%scope, target, error = %e, "budget lookup failed"),
            }
        }

        for (scope, target) in scopes {
            let check = self.tracker.check_budget(scope, target, planned_usd).await;
            if check.allowed {
                continue;
            }
            if self.tracker.config().enforce {
                warn!(%scope, target, message = %check.message, "call refused by budget");
                return Err(TollgateError::BudgetExhausted {
                    message: check.message,
                });
            }
            warn!(%scope, target, message = %check.message, "budget pre-flight failed; continuing");
        }
        Ok(())
    }
}

fn append_note(notes: &mut String, note: &str) {
    if !notes.is_empty() {
        notes.push_str("; ");
    }
    notes.push_str(note);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_joined() {
        let mut notes = String::new();
        append_note(&mut notes, "5xx");
        append_note(&mut notes, "usage record failed: x");
        assert_eq!(notes, "5xx; usage record failed: x");
    }

    #[test]
    fn request_builder() {
        let request = RunRequest::new("work")
            .with_payload(b"{}".to_vec())
            .with_project("alpha")
            .with_branch("main")
            .with_task_type("review")
            .with_planned_usd(0.5);
        assert_eq!(request.profile, "work");
        assert_eq!(request.payload, b"{}");
        assert_eq!(request.project, "alpha");
        assert_eq!(request.planned_usd, 0.5);
    }
}
