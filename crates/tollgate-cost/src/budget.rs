// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget tracking against daily limits and period hard caps.
//!
//! Spend is pulled from `usage_records` on every query (never cached). A
//! budget's scope decides which records count: all of them for global, those
//! whose session carries the matching project or profile label otherwise.
//!
//! Pre-flight checks fail open by default: a missing or unreadable budget
//! allows the spend. `[budget] on_missing = "deny"` flips that.

use std::fmt;

use chrono::Local;
use serde::Serialize;
use tollgate_config::model::{BudgetConfig, ExpiredPeriodPolicy, MissingBudgetPolicy};
use tollgate_core::{Scope, SessionMeta, TollgateError};
use tollgate_storage::Database;
use tollgate_storage::models::Budget;
use tollgate_storage::queries::budgets as budget_queries;
use tracing::{debug, info, warn};

use crate::period::{current_period, days_remaining, today_bounds};

/// Progress percentage above which a status reports a warning.
const WARNING_PROGRESS: f64 = 80.0;

/// Coarse severity of a [`BudgetStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WarningLevel {
    None,
    Warning,
    Critical,
}

/// Derived snapshot of one budget. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    /// Spend since local midnight.
    pub today_spent: f64,
    /// Spend within the budget period.
    pub period_spent: f64,
    pub daily_limit: f64,
    pub hard_cap: f64,
    /// `today_spent / daily_limit * 100`; `None` when the limit is not positive.
    pub daily_progress: Option<f64>,
    /// `period_spent / hard_cap * 100`; `None` when the cap is not positive.
    pub total_progress: Option<f64>,
    pub is_over_daily: bool,
    pub is_over_cap: bool,
    /// Whole days until the period ends, clamped at zero.
    pub days_remaining: i64,
    /// The period end has passed.
    pub expired: bool,
}

impl BudgetStatus {
    fn compute(budget: Budget, today_spent: f64, period_spent: f64, now: i64) -> Self {
        let daily_limit = budget.daily_usd;
        let hard_cap = budget.hard_cap;
        let daily_progress = progress(today_spent, daily_limit);
        let total_progress = progress(period_spent, hard_cap);
        Self {
            is_over_daily: daily_limit > 0.0 && today_spent > daily_limit,
            is_over_cap: hard_cap > 0.0 && period_spent > hard_cap,
            days_remaining: days_remaining(budget.period_end, now),
            expired: now > budget.period_end,
            budget,
            today_spent,
            period_spent,
            daily_limit,
            hard_cap,
            daily_progress,
            total_progress,
        }
    }

    pub fn warning_level(&self) -> WarningLevel {
        if self.is_over_cap || self.is_over_daily {
            return WarningLevel::Critical;
        }
        let above = |p: Option<f64>| p.is_some_and(|p| p > WARNING_PROGRESS);
        if above(self.daily_progress) || above(self.total_progress) {
            WarningLevel::Warning
        } else {
            WarningLevel::None
        }
    }

    /// One-line human summary.
    pub fn format_status(&self) -> String {
        let mut line = format!(
            "Daily: ${:.4} / ${:.2} ({:.1}%) | Total: ${:.4} / ${:.2} ({:.1}%) | {} days remaining",
            self.today_spent,
            self.daily_limit,
            self.daily_progress.unwrap_or(0.0),
            self.period_spent,
            self.hard_cap,
            self.total_progress.unwrap_or(0.0),
            self.days_remaining,
        );
        if self.expired {
            line.push_str(" (period ended)");
        }
        line
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_status())
    }
}

fn progress(spent: f64, limit: f64) -> Option<f64> {
    (limit > 0.0).then(|| spent / limit * 100.0)
}

/// Advisory answer of a pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetCheck {
    pub allowed: bool,
    /// Why the spend would not fit; empty when allowed.
    pub message: String,
}

impl BudgetCheck {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: String::new(),
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
        }
    }
}

/// Persistent budget tracker.
#[derive(Clone)]
pub struct BudgetTracker {
    db: Database,
    config: BudgetConfig,
}

impl BudgetTracker {
    pub fn new(db: Database, config: BudgetConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Create a budget for `[start of today, end of this month]` with zero spend.
    ///
    /// The global scope always uses an empty target.
    pub async fn create_budget(
        &self,
        scope: Scope,
        target: &str,
        daily_usd: f64,
        hard_cap: f64,
    ) -> Result<Budget, TollgateError> {
        validate_limits(daily_usd, hard_cap)?;
        let target = normalize_target(scope, target)?;
        let (period_start, period_end) = current_period(Local::now());
        let budget = Budget {
            id: format!("budget_{}", uuid::Uuid::new_v4().simple()),
            scope,
            target,
            daily_usd,
            hard_cap,
            period_start,
            period_end,
            spent_usd: 0.0,
        };
        budget_queries::insert_budget(&self.db, &budget).await?;
        info!(
            budget_id = %budget.id,
            %scope,
            target = %budget.target,
            daily_usd,
            hard_cap,
            "budget created"
        );
        Ok(budget)
    }

    pub async fn get_budget(&self, scope: Scope, target: &str) -> Result<Budget, TollgateError> {
        let target = lookup_target(scope, target);
        budget_queries::get_budget(&self.db, scope, target)
            .await?
            .ok_or_else(|| not_found(scope, target))
    }

    pub async fn get_global_budget(&self) -> Result<Budget, TollgateError> {
        self.get_budget(Scope::Global, "").await
    }

    pub async fn list_budgets(&self) -> Result<Vec<Budget>, TollgateError> {
        budget_queries::list_budgets(&self.db).await
    }

    /// Overwrite the daily limit and hard cap only.
    pub async fn update_limits(
        &self,
        budget_id: &str,
        daily_usd: f64,
        hard_cap: f64,
    ) -> Result<(), TollgateError> {
        validate_limits(daily_usd, hard_cap)?;
        let changed = budget_queries::update_limits(&self.db, budget_id, daily_usd, hard_cap).await?;
        if changed == 0 {
            return Err(not_found_id(budget_id));
        }
        info!(budget_id, daily_usd, hard_cap, "budget limits updated");
        Ok(())
    }

    /// Atomically add `amount` to one budget's cumulative spend.
    pub async fn update_spending(&self, budget_id: &str, amount: f64) -> Result<(), TollgateError> {
        validate_amount(amount)?;
        let changed = budget_queries::add_spent(&self.db, budget_id, amount).await?;
        if changed == 0 {
            return Err(not_found_id(budget_id));
        }
        Ok(())
    }

    /// Add `amount` to every budget the session counts against: global, its
    /// project and its profile. Returns how many budgets were touched.
    pub async fn accrue_spend(
        &self,
        meta: &SessionMeta,
        amount: f64,
    ) -> Result<usize, TollgateError> {
        validate_amount(amount)?;
        if amount == 0.0 {
            return Ok(0);
        }
        let changed =
            budget_queries::add_spent_matching(&self.db, &meta.project, &meta.profile, amount)
                .await?;
        debug!(amount, budgets = changed, "spend accrued");
        Ok(changed)
    }

    /// Current status of the budget for `scope`/`target`.
    pub async fn get_status(
        &self,
        scope: Scope,
        target: &str,
    ) -> Result<BudgetStatus, TollgateError> {
        let target = lookup_target(scope, target);
        let now = Local::now();
        let today = today_bounds(now);

        let snapshot = budget_queries::spend_snapshot(&self.db, scope, target, today)
            .await?
            .ok_or_else(|| not_found(scope, target))?;

        let now_ts = now.timestamp();
        let snapshot = if now_ts > snapshot.budget.period_end
            && self.config.on_expired == ExpiredPeriodPolicy::Rollover
        {
            let (start, end) = current_period(now);
            budget_queries::set_period(&self.db, &snapshot.budget.id, start, end).await?;
            info!(budget_id = %snapshot.budget.id, period_start = start, period_end = end, "budget period rolled over");
            budget_queries::spend_snapshot(&self.db, scope, target, today)
                .await?
                .ok_or_else(|| not_found(scope, target))?
        } else {
            snapshot
        };

        Ok(BudgetStatus::compute(
            snapshot.budget,
            snapshot.today_spent,
            snapshot.period_spent,
            now_ts,
        ))
    }

    /// Whether spending `planned_usd` more would stay within limits.
    ///
    /// Never fails: lookup errors resolve through the missing-budget policy.
    /// A negative or non-finite plan is refused against an existing budget.
    pub async fn check_budget(&self, scope: Scope, target: &str, planned_usd: f64) -> BudgetCheck {
        let status = match self.get_status(scope, target).await {
            Ok(status) => status,
            Err(e) => {
                if !e.is_not_found() {
                    warn!(%scope, target, error = %e, "budget lookup failed during pre-flight check");
                }
                return match self.config.on_missing {
                    MissingBudgetPolicy::Allow => BudgetCheck::allow(),
                    MissingBudgetPolicy::Deny => {
                        BudgetCheck::deny(format!("No budget available for {scope} {target}: {e}"))
                    }
                };
            }
        };

        if let Err(e) = validate_amount(planned_usd) {
            return BudgetCheck::deny(e.to_string());
        }

        if status.daily_limit > 0.0 {
            let projected = status.today_spent + planned_usd;
            if projected > status.daily_limit {
                return BudgetCheck::deny(format!(
                    "Would exceed daily budget: ${:.4} / ${:.2} ({:.1}%)",
                    projected,
                    status.daily_limit,
                    projected / status.daily_limit * 100.0
                ));
            }
        }

        if status.hard_cap > 0.0 {
            let projected = status.period_spent + planned_usd;
            if projected > status.hard_cap {
                return BudgetCheck::deny(format!(
                    "Would exceed hard cap: ${:.4} / ${:.2}",
                    projected, status.hard_cap
                ));
            }
        }

        BudgetCheck::allow()
    }

    /// Status of the project budget if one exists, else the global budget.
    pub async fn get_merged_status(&self, project: &str) -> Result<BudgetStatus, TollgateError> {
        if !project.is_empty() {
            match self.get_status(Scope::Project, project).await {
                Ok(status) => return Ok(status),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        match self.get_status(Scope::Global, "").await {
            Err(e) if e.is_not_found() => Err(TollgateError::BudgetNotFound {
                scope: "project or global".to_string(),
                target: project.to_string(),
            }),
            other => other,
        }
    }
}

fn validate_limits(daily_usd: f64, hard_cap: f64) -> Result<(), TollgateError> {
    if !(daily_usd >= 0.0 && hard_cap >= 0.0) {
        return Err(TollgateError::InvalidInput(format!(
            "budget limits must be non-negative (daily {daily_usd}, hard cap {hard_cap})"
        )));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<(), TollgateError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(TollgateError::InvalidInput(format!(
            "spend amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}

fn normalize_target(scope: Scope, target: &str) -> Result<String, TollgateError> {
    match scope {
        Scope::Global => Ok(String::new()),
        _ if target.trim().is_empty() => Err(TollgateError::InvalidInput(format!(
            "{scope} budgets need a target name"
        ))),
        _ => Ok(target.trim().to_string()),
    }
}

fn lookup_target(scope: Scope, target: &str) -> &str {
    match scope {
        Scope::Global => "",
        _ => target.trim(),
    }
}

fn not_found(scope: Scope, target: &str) -> TollgateError {
    TollgateError::BudgetNotFound {
        scope: scope.to_string(),
        target: target.to_string(),
    }
}

fn not_found_id(budget_id: &str) -> TollgateError {
    TollgateError::BudgetNotFound {
        scope: "id".to_string(),
        target: budget_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SessionLedger;
    use crate::pricing::PricingTable;
    use chrono::Utc;
    use tollgate_core::TokenUsage;

    async fn setup(config: BudgetConfig) -> (BudgetTracker, SessionLedger, Database) {
        let db = Database::open_in_memory().await.unwrap();
        (
            BudgetTracker::new(db.clone(), config),
            SessionLedger::new(db.clone(), PricingTable::new()),
            db,
        )
    }

    async fn spend(ledger: &SessionLedger, meta: &SessionMeta, usd: f64) {
        let id = ledger.begin(meta).await.unwrap();
        ledger
            .record_usage_with_cost(&id, &TokenUsage::exact(10, 10), "m", "http", usd, 0.0)
            .await
            .unwrap();
        ledger.end(&id, true, 1, "").await.unwrap();
    }

    fn status_with(daily: f64, cap: f64, today: f64, period: f64) -> BudgetStatus {
        let now = Utc::now().timestamp();
        let budget = Budget {
            id: "b".into(),
            scope: Scope::Global,
            target: String::new(),
            daily_usd: daily,
            hard_cap: cap,
            period_start: now - 100,
            period_end: now + 10 * 86_400 + 100,
            spent_usd: 0.0,
        };
        BudgetStatus::compute(budget, today, period, now)
    }

    #[tokio::test]
    async fn create_sets_current_period() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        let budget = tracker
            .create_budget(Scope::Project, "alpha", 10.0, 100.0)
            .await
            .unwrap();
        let (start, end) = current_period(Local::now());
        assert_eq!((budget.period_start, budget.period_end), (start, end));
        assert_eq!(budget.spent_usd, 0.0);
        assert!(budget.id.starts_with("budget_"));

        let fetched = tracker.get_budget(Scope::Project, "alpha").await.unwrap();
        assert_eq!(fetched, budget);
    }

    #[tokio::test]
    async fn global_target_is_normalized() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        let budget = tracker
            .create_budget(Scope::Global, "ignored", 5.0, 50.0)
            .await
            .unwrap();
        assert_eq!(budget.target, "");
        assert_eq!(tracker.get_global_budget().await.unwrap().id, budget.id);
    }

    #[tokio::test]
    async fn invalid_inputs_are_rejected() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        assert!(matches!(
            tracker.create_budget(Scope::Global, "", -1.0, 10.0).await,
            Err(TollgateError::InvalidInput(_))
        ));
        assert!(matches!(
            tracker.create_budget(Scope::Project, " ", 1.0, 10.0).await,
            Err(TollgateError::InvalidInput(_))
        ));
        assert!(matches!(
            tracker.update_spending("nope", -2.0).await,
            Err(TollgateError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn missing_budget_is_not_found() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        let err = tracker.get_budget(Scope::Profile, "work").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(tracker.get_status(Scope::Profile, "work").await.unwrap_err().is_not_found());
        assert!(tracker.update_limits("nope", 1.0, 1.0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_limits_only_touches_limits() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        let budget = tracker.create_budget(Scope::Global, "", 10.0, 100.0).await.unwrap();
        tracker.update_spending(&budget.id, 3.0).await.unwrap();
        tracker.update_limits(&budget.id, 20.0, 200.0).await.unwrap();

        let updated = tracker.get_global_budget().await.unwrap();
        assert_eq!(updated.daily_usd, 20.0);
        assert_eq!(updated.hard_cap, 200.0);
        assert_eq!(updated.spent_usd, 3.0);
        assert_eq!(updated.period_end, budget.period_end);
    }

    #[tokio::test]
    async fn daily_progress_scenario() {
        let (tracker, ledger, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Global, "", 10.0, 0.0).await.unwrap();
        spend(&ledger, &SessionMeta::new("work", "http"), 8.50).await;

        let status = tracker.get_status(Scope::Global, "").await.unwrap();
        assert!((status.today_spent - 8.50).abs() < 1e-9);
        assert!((status.daily_progress.unwrap() - 85.0).abs() < 1e-9);
        assert_eq!(status.total_progress, None);
        assert!(!status.is_over_daily);
        assert!(!status.expired);
        assert_eq!(status.warning_level(), WarningLevel::Warning);
    }

    #[tokio::test]
    async fn scoped_status_counts_only_matching_sessions() {
        let (tracker, ledger, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Project, "alpha", 10.0, 100.0).await.unwrap();
        tracker.create_budget(Scope::Profile, "work", 10.0, 100.0).await.unwrap();

        spend(&ledger, &SessionMeta::new("work", "http").with_project("alpha"), 1.0).await;
        spend(&ledger, &SessionMeta::new("home", "http").with_project("alpha"), 2.0).await;
        spend(&ledger, &SessionMeta::new("work", "http").with_project("beta"), 4.0).await;

        let alpha = tracker.get_status(Scope::Project, "alpha").await.unwrap();
        assert!((alpha.period_spent - 3.0).abs() < 1e-9);
        let work = tracker.get_status(Scope::Profile, "work").await.unwrap();
        assert!((work.period_spent - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn progress_is_monotonic_in_spend() {
        let (tracker, ledger, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Global, "", 10.0, 40.0).await.unwrap();
        let meta = SessionMeta::new("p", "http");

        let mut last = (0.0, 0.0);
        for _ in 0..5 {
            spend(&ledger, &meta, 1.5).await;
            let status = tracker.get_status(Scope::Global, "").await.unwrap();
            let current = (status.daily_progress.unwrap(), status.total_progress.unwrap());
            assert!(current.0 >= last.0 && current.1 >= last.1);
            last = current;
        }
    }

    #[test]
    fn zero_limits_skip_progress() {
        let status = status_with(0.0, -5.0, 3.0, 3.0);
        assert_eq!(status.daily_progress, None);
        assert_eq!(status.total_progress, None);
        assert!(!status.is_over_daily && !status.is_over_cap);
        assert_eq!(status.warning_level(), WarningLevel::None);
    }

    #[test]
    fn warning_levels() {
        assert_eq!(status_with(10.0, 100.0, 5.0, 50.0).warning_level(), WarningLevel::None);
        assert_eq!(status_with(10.0, 100.0, 8.1, 50.0).warning_level(), WarningLevel::Warning);
        assert_eq!(status_with(10.0, 100.0, 5.0, 81.0).warning_level(), WarningLevel::Warning);
        assert_eq!(status_with(10.0, 100.0, 10.5, 50.0).warning_level(), WarningLevel::Critical);
        assert_eq!(status_with(10.0, 100.0, 1.0, 101.0).warning_level(), WarningLevel::Critical);
        // Exactly at the limit is not over it.
        assert_eq!(status_with(10.0, 100.0, 10.0, 50.0).warning_level(), WarningLevel::Warning);
    }

    #[test]
    fn format_status_line() {
        let status = status_with(10.0, 100.0, 8.5, 42.0);
        assert_eq!(
            status.format_status(),
            "Daily: $8.5000 / $10.00 (85.0%) | Total: $42.0000 / $100.00 (42.0%) | 10 days remaining"
        );
    }

    #[tokio::test]
    async fn check_budget_fails_open_when_missing() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        let check = tracker.check_budget(Scope::Project, "nobody", 1_000.0).await;
        assert_eq!(check, BudgetCheck::allow());
        assert!(check.message.is_empty());
    }

    #[tokio::test]
    async fn check_budget_can_fail_closed() {
        let config = BudgetConfig {
            on_missing: MissingBudgetPolicy::Deny,
            ..BudgetConfig::default()
        };
        let (tracker, _, _) = setup(config).await;
        let check = tracker.check_budget(Scope::Project, "nobody", 1.0).await;
        assert!(!check.allowed);
        assert!(check.message.contains("No budget available"));
    }

    #[tokio::test]
    async fn check_budget_projects_daily_and_cap() {
        let (tracker, ledger, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Global, "", 10.0, 12.0).await.unwrap();
        spend(&ledger, &SessionMeta::new("p", "http"), 8.0).await;

        assert!(tracker.check_budget(Scope::Global, "", 1.0).await.allowed);

        let daily = tracker.check_budget(Scope::Global, "", 2.5).await;
        assert!(!daily.allowed);
        assert_eq!(daily.message, "Would exceed daily budget: $10.5000 / $10.00 (105.0%)");

        tracker
            .update_limits(&tracker.get_global_budget().await.unwrap().id, 0.0, 12.0)
            .await
            .unwrap();
        let cap = tracker.check_budget(Scope::Global, "", 4.5).await;
        assert!(!cap.allowed);
        assert_eq!(cap.message, "Would exceed hard cap: $12.5000 / $12.00");
    }

    #[tokio::test]
    async fn check_budget_refuses_invalid_plans() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Global, "", 10.0, 100.0).await.unwrap();

        for planned in [f64::NAN, f64::INFINITY, -5.0] {
            let check = tracker.check_budget(Scope::Global, "", planned).await;
            assert!(!check.allowed, "{planned} must be refused");
            assert!(check.message.contains("non-negative number"));
        }
        assert!(tracker.check_budget(Scope::Global, "", 0.0).await.allowed);
    }

    #[tokio::test]
    async fn expired_period_is_clamped() {
        let (tracker, _, db) = setup(BudgetConfig::default()).await;
        let budget = tracker.create_budget(Scope::Global, "", 10.0, 100.0).await.unwrap();
        let now = Utc::now().timestamp();
        budget_queries::set_period(&db, &budget.id, now - 40 * 86_400, now - 10 * 86_400)
            .await
            .unwrap();

        let status = tracker.get_status(Scope::Global, "").await.unwrap();
        assert!(status.expired);
        assert_eq!(status.days_remaining, 0);
        assert!(status.format_status().ends_with("(period ended)"));
    }

    #[tokio::test]
    async fn expired_period_rolls_over_when_configured() {
        let config = BudgetConfig {
            on_expired: ExpiredPeriodPolicy::Rollover,
            ..BudgetConfig::default()
        };
        let (tracker, _, db) = setup(config).await;
        let budget = tracker.create_budget(Scope::Global, "", 10.0, 100.0).await.unwrap();
        let now = Utc::now().timestamp();
        budget_queries::set_period(&db, &budget.id, now - 40 * 86_400, now - 10 * 86_400)
            .await
            .unwrap();

        let status = tracker.get_status(Scope::Global, "").await.unwrap();
        assert!(!status.expired);
        let (start, end) = current_period(Local::now());
        assert_eq!((status.budget.period_start, status.budget.period_end), (start, end));
        let persisted = tracker.get_global_budget().await.unwrap();
        assert_eq!(persisted.period_end, end);
    }

    #[tokio::test]
    async fn accrue_spend_hits_matching_budgets() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        tracker.create_budget(Scope::Global, "", 10.0, 100.0).await.unwrap();
        tracker.create_budget(Scope::Project, "alpha", 10.0, 100.0).await.unwrap();
        tracker.create_budget(Scope::Profile, "home", 10.0, 100.0).await.unwrap();

        let meta = SessionMeta::new("work", "http").with_project("alpha");
        assert_eq!(tracker.accrue_spend(&meta, 0.25).await.unwrap(), 2);
        assert_eq!(tracker.accrue_spend(&meta, 0.0).await.unwrap(), 0);

        let budgets = tracker.list_budgets().await.unwrap();
        let spent: Vec<f64> = budgets.iter().map(|b| b.spent_usd).collect();
        assert_eq!(spent, vec![0.25, 0.25, 0.0]);
    }

    #[tokio::test]
    async fn merged_status_prefers_project() {
        let (tracker, _, _) = setup(BudgetConfig::default()).await;
        assert!(tracker.get_merged_status("alpha").await.unwrap_err().is_not_found());

        tracker.create_budget(Scope::Global, "", 1.0, 10.0).await.unwrap();
        let merged = tracker.get_merged_status("alpha").await.unwrap();
        assert_eq!(merged.budget.scope, Scope::Global);

        tracker.create_budget(Scope::Project, "alpha", 2.0, 20.0).await.unwrap();
        let merged = tracker.get_merged_status("alpha").await.unwrap();
        assert_eq!(merged.budget.scope, Scope::Project);
        assert_eq!(merged.daily_limit, 2.0);
    }
}
