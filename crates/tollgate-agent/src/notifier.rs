// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll-driven notifications from budget alerts and suggestions.
//!
//! Each condition is surfaced once: events are keyed by
//! `alert:<scope>:<target>:<title>` or `suggestion:<type>:<title>` and a key
//! seen in an earlier poll is skipped until [`Notifier::clear`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use tollgate_config::model::AlertConfig;
use tollgate_core::TollgateError;
use tollgate_cost::{Alert, AlertManager, BudgetTracker};
use tracing::{debug, warn};

use crate::metrics;

/// Suggestions below this priority are not surfaced.
pub const MIN_SUGGESTION_PRIORITY: u8 = 4;
/// Suggestions requested per poll.
pub const SUGGESTIONS_PER_POLL: usize = 3;

/// An optimisation hint from some analysis of past usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Category, e.g. `cost` or `profile`.
    pub kind: String,
    pub title: String,
    pub detail: String,
    /// 1 (low) to 5 (high).
    pub priority: u8,
}

impl Suggestion {
    pub fn format_suggestion(&self) -> String {
        format!("{}\n{}", self.title, self.detail)
    }
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggestions(&self, limit: usize) -> Result<Vec<Suggestion>, TollgateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    BudgetAlert,
    Suggestion,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub metadata: BTreeMap<String, String>,
}

pub struct Notifier {
    tracker: BudgetTracker,
    alerts: AlertManager,
    suggestions: Option<Arc<dyn SuggestionSource>>,
    seen: HashSet<String>,
}

impl Notifier {
    pub fn new(tracker: BudgetTracker, config: AlertConfig) -> Self {
        Self {
            alerts: AlertManager::new(tracker.clone(), config),
            tracker,
            suggestions: None,
            seen: HashSet::new(),
        }
    }

    pub fn with_suggestions(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.suggestions = Some(source);
        self
    }

    pub fn alert_manager(&self) -> &AlertManager {
        &self.alerts
    }

    /// Check every budget and the suggestion source; return events not seen before.
    pub async fn poll(&mut self) -> Result<Vec<NotificationEvent>, TollgateError> {
        let mut events = Vec::new();

        for budget in self.tracker.list_budgets().await? {
            let status = match self.tracker.get_status(budget.scope, &budget.target).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(budget_id = %budget.id, error = %e, "skipping budget in poll");
                    continue;
                }
            };
            if status.daily_limit > 0.0 {
                metrics::set_budget_remaining(
                    &budget.scope.to_string(),
                    &budget.target,
                    (status.daily_limit - status.today_spent).max(0.0),
                );
            }
            for alert in self.alerts.evaluate_status(&status) {
                let key = format!("alert:{}:{}:{}", alert.scope, alert.target, alert.title);
                if self.seen.insert(key) {
                    events.push(alert_event(&alert));
                }
            }
        }

        if let Some(source) = &self.suggestions {
            match source.suggestions(SUGGESTIONS_PER_POLL).await {
                Ok(suggestions) => {
                    for suggestion in suggestions {
                        if suggestion.priority < MIN_SUGGESTION_PRIORITY {
                            continue;
                        }
                        let key = format!("suggestion:{}:{}", suggestion.kind, suggestion.title);
                        if self.seen.insert(key) {
                            events.push(suggestion_event(&suggestion));
                        }
                    }
                }
                Err(e) => debug!(error = %e, "suggestion source unavailable"),
            }
        }

        Ok(events)
    }

    /// Forget every key seen so far, along with the alert history.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.alerts.clear_history();
    }
}

fn alert_event(alert: &Alert) -> NotificationEvent {
    let metadata = BTreeMap::from([
        ("scope".to_string(), alert.scope.to_string()),
        ("target".to_string(), alert.target.clone()),
        ("level".to_string(), alert.level.to_string()),
    ]);
    NotificationEvent {
        kind: EventKind::BudgetAlert,
        title: alert.title.clone(),
        message: alert.format_alert(),
        timestamp: alert.timestamp,
        metadata,
    }
}

fn suggestion_event(suggestion: &Suggestion) -> NotificationEvent {
    let metadata = BTreeMap::from([
        ("type".to_string(), suggestion.kind.clone()),
        ("priority".to_string(), suggestion.priority.to_string()),
    ]);
    NotificationEvent {
        kind: EventKind::Suggestion,
        title: suggestion.title.clone(),
        message: suggestion.format_suggestion(),
        timestamp: Local::now(),
        metadata,
    }
}
