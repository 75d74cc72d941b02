// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threshold alerts over budget status.
//!
//! Each evaluation yields at most one alert per limit (daily, cap). History is
//! kept in memory, capped at [`ALERT_HISTORY_LIMIT`] entries (oldest dropped).

use chrono::{DateTime, Local};
use serde::Serialize;
use tollgate_config::model::AlertConfig;
use tollgate_core::Scope;
use tracing::{debug, warn};

use crate::budget::{BudgetStatus, BudgetTracker};

/// Most alerts an [`AlertManager`] retains.
pub const ALERT_HISTORY_LIMIT: usize = 256;

/// Severity of an alert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertLevel {
    None,
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    fn badge(self) -> &'static str {
        match self {
            Self::Critical => "[CRITICAL]",
            Self::Warning => "[WARNING]",
            Self::Info => "[INFO]",
            Self::None => "[NOTICE]",
        }
    }
}

/// Which limit an alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LimitKind {
    Daily,
    Cap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub kind: LimitKind,
    pub scope: Scope,
    pub target: String,
    pub title: String,
    pub message: String,
    pub current_usd: f64,
    pub limit_usd: f64,
    pub percent: f64,
    pub timestamp: DateTime<Local>,
}

impl Alert {
    /// Whether the caller should stop spending.
    pub fn should_block(&self) -> bool {
        self.level == AlertLevel::Critical && self.percent >= 100.0
    }

    pub fn suggestion(&self) -> &'static str {
        match self.level {
            AlertLevel::Critical if self.percent >= 100.0 => {
                "Consider pausing usage or increasing your budget limit to continue."
            }
            AlertLevel::Critical => {
                "You've exceeded your budget. Review your spending and consider adjusting limits."
            }
            AlertLevel::Warning => {
                "You're approaching your budget limit. Monitor your usage closely."
            }
            _ => "Keep track of your spending to stay within budget.",
        }
    }

    /// Multi-line rendering for terminals and notifications.
    pub fn format_alert(&self) -> String {
        let scope_line = match self.scope {
            Scope::Profile => format!("Profile: {}", self.target),
            Scope::Project => format!("Project: {}", self.target),
            Scope::Global => "Global Budget".to_string(),
        };
        format!(
            "{} - {}\n{}\n{}\n{:.1}% of budget used (${:.2} / ${:.2})\nTime: {}",
            self.level.badge(),
            self.title,
            scope_line,
            self.message,
            self.percent,
            self.current_usd,
            self.limit_usd,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

/// Evaluates budget statuses against the configured thresholds.
pub struct AlertManager {
    tracker: BudgetTracker,
    config: AlertConfig,
    history: Vec<Alert>,
}

impl AlertManager {
    pub fn new(tracker: BudgetTracker, config: AlertConfig) -> Self {
        Self {
            tracker,
            config,
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Check one budget and record any alerts raised.
    ///
    /// A budget that cannot be read produces no alerts.
    pub async fn check_budget_alerts(&mut self, scope: Scope, target: &str) -> Vec<Alert> {
        let status = match self.tracker.get_status(scope, target).await {
            Ok(status) => status,
            Err(e) if e.is_not_found() => {
                debug!(%scope, target, "no budget to check for alerts");
                return Vec::new();
            }
            Err(e) => {
                warn!(%scope, target, error = %e, "budget status unavailable for alert check");
                return Vec::new();
            }
        };
        self.evaluate_status(&status)
    }

    /// Evaluate an already-computed status and record any alerts raised.
    pub fn evaluate_status(&mut self, status: &BudgetStatus) -> Vec<Alert> {
        let scope = status.budget.scope;
        let target = status.budget.target.as_str();
        let mut raised = Vec::new();

        if self.config.enable_daily {
            raised.extend(self.check_threshold(
                LimitKind::Daily,
                scope,
                target,
                status.today_spent,
                status.daily_limit,
            ));
        }
        if self.config.enable_cap {
            raised.extend(self.check_threshold(
                LimitKind::Cap,
                scope,
                target,
                status.period_spent,
                status.hard_cap,
            ));
        }

        for alert in &raised {
            warn!(
                level = %alert.level,
                kind = %alert.kind,
                %scope,
                target,
                percent = alert.percent,
                "{}",
                alert.title
            );
        }
        self.history.extend(raised.iter().cloned());
        if self.history.len() > ALERT_HISTORY_LIMIT {
            let excess = self.history.len() - ALERT_HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        raised
    }

    /// Build the alert for one limit, if any threshold is reached.
    ///
    /// Critical wins over warning; a non-positive limit never alerts.
    pub fn check_threshold(
        &self,
        kind: LimitKind,
        scope: Scope,
        target: &str,
        current: f64,
        limit: f64,
    ) -> Option<Alert> {
        if limit <= 0.0 {
            return None;
        }
        let percent = current / limit * 100.0;

        let (level, title, message) = if percent >= self.config.critical_percent {
            let (title, message) = match kind {
                LimitKind::Daily => (
                    "Daily Budget Exceeded",
                    format!(
                        "Daily spending (${current:.2}) has exceeded the limit (${limit:.2}) by {:.1}%",
                        percent - 100.0
                    ),
                ),
                LimitKind::Cap => (
                    "Budget Cap Exceeded",
                    format!(
                        "Total spending (${current:.2}) has exceeded the hard cap (${limit:.2})"
                    ),
                ),
            };
            (AlertLevel::Critical, title, message)
        } else if percent >= self.config.warning_percent {
            let (title, message) = match kind {
                LimitKind::Daily => (
                    "Approaching Daily Budget Limit",
                    format!(
                        "Daily spending is at {percent:.0}% of the limit (${current:.2} / ${limit:.2})"
                    ),
                ),
                LimitKind::Cap => (
                    "Approaching Budget Cap",
                    format!(
                        "Total spending is at {percent:.0}% of the hard cap (${current:.2} / ${limit:.2})"
                    ),
                ),
            };
            (AlertLevel::Warning, title, message)
        } else {
            return None;
        };

        Some(Alert {
            level,
            kind,
            scope,
            target: target.to_string(),
            title: title.to_string(),
            message,
            current_usd: current,
            limit_usd: limit,
            percent,
            timestamp: Local::now(),
        })
    }

    /// The last `count` alerts, oldest first.
    pub fn get_recent_alerts(&self, count: usize) -> &[Alert] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    pub fn get_alerts_by_level(&self, level: AlertLevel) -> Vec<&Alert> {
        self.history.iter().filter(|a| a.level == level).collect()
    }

    pub fn history(&self) -> &[Alert] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
