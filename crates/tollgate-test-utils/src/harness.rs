// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end metering tests.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! wires a ledger, budget tracker and alert manager onto it.

use std::sync::Arc;

use tollgate_agent::{Delegate, Executor, RunnerRegistry};
use tollgate_config::model::{AlertConfig, BudgetConfig, HttpConfig, ProfileConfig};
use tollgate_core::{SessionId, SessionMeta, TokenUsage, TollgateError};
use tollgate_cost::{AlertManager, BudgetTracker, PricingTable, SessionLedger};
use tollgate_http::HttpEngine;
use tollgate_storage::Database;
use tollgate_storage::models::SessionRow;
use tollgate_storage::queries::sessions as session_queries;

/// Builder for [`TestHarness`].
#[derive(Default)]
pub struct TestHarnessBuilder {
    budget: BudgetConfig,
    alerts: AlertConfig,
    http: HttpConfig,
    pricing: PricingTable,
    profiles: Vec<ProfileConfig>,
}

impl TestHarnessBuilder {
    pub fn with_budget_config(mut self, budget: BudgetConfig) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_alert_config(mut self, alerts: AlertConfig) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_profile(mut self, profile: ProfileConfig) -> Self {
        self.profiles.push(profile);
        self
    }

    pub async fn build(self) -> Result<TestHarness, TollgateError> {
        let temp_dir = tempfile::TempDir::new().map_err(TollgateError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let ledger = SessionLedger::new(db.clone(), self.pricing);
        let tracker = BudgetTracker::new(db.clone(), self.budget);
        let alerts = AlertManager::new(tracker.clone(), self.alerts.clone());

        Ok(TestHarness {
            db,
            ledger,
            tracker,
            alerts,
            alert_config: self.alerts,
            http: self.http,
            registry: RunnerRegistry::from_profiles(&self.profiles),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete metering stack on a throwaway database.
pub struct TestHarness {
    pub db: Database,
    pub ledger: SessionLedger,
    pub tracker: BudgetTracker,
    pub alerts: AlertManager,
    pub alert_config: AlertConfig,
    http: HttpConfig,
    registry: RunnerRegistry,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    pub async fn new() -> Result<Self, TollgateError> {
        Self::builder().build().await
    }

    /// An executor over the harness profiles using `delegate` for both adapters.
    pub fn executor(&self, delegate: Arc<dyn Delegate>) -> Result<Executor, TollgateError> {
        Ok(self
            .real_executor()?
            .with_http_delegate(delegate.clone())
            .with_tool_delegate(delegate))
    }

    /// An executor with the real HTTP and tool delegates.
    pub fn real_executor(&self) -> Result<Executor, TollgateError> {
        let engine = HttpEngine::new(&self.http)?;
        Ok(Executor::new(
            self.registry.clone(),
            self.ledger.clone(),
            self.tracker.clone(),
            engine,
        ))
    }

    /// Run one finished session costing `usd`.
    pub async fn spend(&self, meta: &SessionMeta, usd: f64) -> Result<SessionId, TollgateError> {
        let id = self.ledger.begin(meta).await?;
        self.ledger
            .record_usage_with_cost(&id, &TokenUsage::exact(1, 1), "test-model", "test", usd, 0.0)
            .await?;
        self.ledger.end(&id, true, 1, "").await?;
        Ok(id)
    }

    /// Sessions that were begun but never ended.
    pub async fn open_sessions(&self) -> Result<Vec<SessionRow>, TollgateError> {
        session_queries::list_open_sessions(&self.db).await
    }
}
