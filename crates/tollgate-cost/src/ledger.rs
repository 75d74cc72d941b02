// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent session ledger.
//!
//! A session is begun once, accumulates zero or more usage records, and is
//! ended exactly once. Store failures are returned to the caller: a lost
//! session write is a correctness problem, not something to swallow.

use chrono::{Local, Utc};
use tollgate_core::{SessionId, SessionMeta, TokenUsage, TollgateError};
use tollgate_storage::Database;
use tollgate_storage::models::{SessionRow, UsageRecord, UsageStats};
use tollgate_storage::queries::sessions::EndOutcome;
use tollgate_storage::queries::usage::InsertOutcome;
use tollgate_storage::queries::{sessions as session_queries, usage as usage_queries};
use tracing::{debug, info};

use crate::period::{SECONDS_PER_DAY, today_bounds};
use crate::pricing::{PricingTable, calculate_cost};

/// Session lifecycle recorder backed by SQLite.
#[derive(Clone)]
pub struct SessionLedger {
    db: Database,
    pricing: PricingTable,
}

impl SessionLedger {
    pub fn new(db: Database, pricing: PricingTable) -> Self {
        Self { db, pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Allocate a session id and persist the opening row.
    pub async fn begin(&self, meta: &SessionMeta) -> Result<SessionId, TollgateError> {
        let id = SessionId::generate();
        let row = SessionRow {
            id: id.to_string(),
            started_at: Utc::now().timestamp(),
            ended_at: None,
            project: meta.project.clone(),
            branch: meta.branch.clone(),
            profile: meta.profile.clone(),
            adapter: meta.adapter.clone(),
            task_type: meta.task_type.clone(),
            success: None,
            latency_ms: None,
            notes: None,
        };
        session_queries::insert_session(&self.db, &row).await?;
        info!(
            session_id = %id,
            profile = %meta.profile,
            project = %meta.project,
            "session started"
        );
        Ok(id)
    }

    /// Append usage priced through the pricing table.
    pub async fn record_usage(
        &self,
        id: &SessionId,
        usage: &TokenUsage,
        model: &str,
        tool: &str,
    ) -> Result<UsageRecord, TollgateError> {
        let (input_cost, output_cost) = calculate_cost(usage, &self.pricing.get(model));
        self.record_usage_with_cost(id, usage, model, tool, input_cost, output_cost)
            .await
    }

    /// Append usage with caller-supplied costs. Negative costs are rejected.
    pub async fn record_usage_with_cost(
        &self,
        id: &SessionId,
        usage: &TokenUsage,
        model: &str,
        tool: &str,
        input_cost: f64,
        output_cost: f64,
    ) -> Result<UsageRecord, TollgateError> {
        if !(input_cost >= 0.0 && output_cost >= 0.0) {
            return Err(TollgateError::InvalidInput(format!(
                "usage cost must be non-negative (input {input_cost}, output {output_cost})"
            )));
        }

        let record = UsageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: id.to_string(),
            ts: Utc::now().timestamp(),
            input_tokens: i64::from(usage.input_tokens),
            output_tokens: i64::from(usage.output_tokens),
            input_cost,
            output_cost,
            tool: tool.to_string(),
            model: model.to_string(),
            estimate_level: usage.estimate,
        };

        match usage_queries::insert_usage(&self.db, &record).await? {
            InsertOutcome::Inserted => {}
            InsertOutcome::MissingSession => {
                return Err(TollgateError::SessionNotFound { id: id.to_string() });
            }
        }

        info!(
            session_id = %id,
            model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost_usd = record.total_cost(),
            estimate = %usage.estimate,
            "usage recorded"
        );
        Ok(record)
    }

    /// Close a session. A session is ended at most once.
    pub async fn end(
        &self,
        id: &SessionId,
        success: bool,
        latency_ms: u64,
        notes: &str,
    ) -> Result<(), TollgateError> {
        let latency = i64::try_from(latency_ms).unwrap_or(i64::MAX);
        let outcome = session_queries::end_session(
            &self.db,
            id.as_str(),
            Utc::now().timestamp(),
            success,
            latency,
            notes,
        )
        .await?;

        match outcome {
            EndOutcome::Ended => {
                info!(session_id = %id, success, latency_ms, "session ended");
                Ok(())
            }
            EndOutcome::NotFound => Err(TollgateError::SessionNotFound { id: id.to_string() }),
            EndOutcome::AlreadyEnded => {
                Err(TollgateError::SessionAlreadyEnded { id: id.to_string() })
            }
        }
    }

    pub async fn get_session(&self, id: &SessionId) -> Result<SessionRow, TollgateError> {
        session_queries::get_session(&self.db, id.as_str())
            .await?
            .ok_or_else(|| TollgateError::SessionNotFound { id: id.to_string() })
    }

    pub async fn list_recent_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, TollgateError> {
        session_queries::list_recent_sessions(&self.db, limit).await
    }

    pub async fn usage_for_session(
        &self,
        id: &SessionId,
    ) -> Result<Vec<UsageRecord>, TollgateError> {
        usage_queries::usage_for_session(&self.db, id.as_str()).await
    }

    /// Totals since local midnight.
    pub async fn today_stats(&self) -> Result<UsageStats, TollgateError> {
        let (start, _) = today_bounds(Local::now());
        usage_queries::stats_since(&self.db, start).await
    }

    /// Totals for the last `days` days, counting today as one.
    pub async fn period_stats(&self, days: u32) -> Result<UsageStats, TollgateError> {
        let (today_start, _) = today_bounds(Local::now());
        let since = today_start - i64::from(days.saturating_sub(1)) * SECONDS_PER_DAY;
        debug!(days, since, "computing period stats");
        usage_queries::stats_since(&self.db, since).await
    }
}
