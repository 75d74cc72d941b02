// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types mapped from the storage tables.
//!
//! Timestamps are unix seconds.

use serde::{Deserialize, Serialize};
use tollgate_core::{EstimateLevel, Scope};

/// A row of the `sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub started_at: i64,
    /// Null until the session is ended; never modified afterwards.
    pub ended_at: Option<i64>,
    pub project: String,
    pub branch: String,
    pub profile: String,
    pub adapter: String,
    pub task_type: String,
    pub success: Option<bool>,
    pub latency_ms: Option<i64>,
    pub notes: Option<String>,
}

impl SessionRow {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// A row of the `usage_records` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub session_id: String,
    pub ts: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub tool: String,
    pub model: String,
    pub estimate_level: EstimateLevel,
}

impl UsageRecord {
    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost
    }
}

/// A row of the `budgets` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub scope: Scope,
    /// Empty for the global scope.
    pub target: String,
    pub daily_usd: f64,
    pub hard_cap: f64,
    pub period_start: i64,
    pub period_end: i64,
    pub spent_usd: f64,
}

/// Aggregate usage over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_tokens: i64,
    pub total_cost: f64,
    /// Distinct sessions that recorded usage in the window.
    pub sessions: i64,
}

/// One day from `v_daily_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub total_tokens: i64,
    pub total_cost: f64,
    pub sessions: i64,
}

/// A budget together with the spend aggregates read in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendSnapshot {
    pub budget: Budget,
    pub today_spent: f64,
    pub period_spent: f64,
}
