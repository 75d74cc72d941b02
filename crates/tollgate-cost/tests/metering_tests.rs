// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger, tracker and alerts sharing one on-disk database.

use futures::future::join_all;
use tollgate_config::model::{AlertConfig, BudgetConfig};
use tollgate_core::{Scope, SessionMeta, TokenUsage};
use tollgate_cost::{AlertLevel, AlertManager, BudgetTracker, PricingTable, SessionLedger};
use tollgate_storage::Database;

async fn open(dir: &tempfile::TempDir) -> Database {
    let path = dir.path().join("tollgate.db");
    Database::open(path.to_str().unwrap()).await.unwrap()
}

#[tokio::test]
async fn concurrent_sessions_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SessionLedger::new(open(&dir).await, PricingTable::new());
    let meta = SessionMeta::new("work", "http").with_project("alpha");

    let ids: Vec<_> = join_all((0..3).map(|_| ledger.begin(&meta)))
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);

    let ended = join_all(ids.iter().map(|id| ledger.end(id, true, 10, ""))).await;
    assert!(ended.iter().all(Result::is_ok));

    for id in &ids {
        assert!(ledger.get_session(id).await.unwrap().is_ended());
    }
}

#[tokio::test]
async fn priced_usage_drives_budget_and_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir).await;
    let ledger = SessionLedger::new(db.clone(), PricingTable::new());
    let tracker = BudgetTracker::new(db.clone(), BudgetConfig::default());
    let mut alerts = AlertManager::new(tracker.clone(), AlertConfig::default());

    tracker
        .create_budget(Scope::Project, "alpha", 1.0, 0.0)
        .await
        .unwrap();

    // 100k in / 50k out on a Sonnet-family model: $0.30 + $0.75.
    let meta = SessionMeta::new("work", "http").with_project("alpha");
    let id = ledger.begin(&meta).await.unwrap();
    let record = ledger
        .record_usage(&id, &TokenUsage::exact(100_000, 50_000), "claude-sonnet-4", "http")
        .await
        .unwrap();
    assert!((record.total_cost() - 1.05).abs() < 1e-9);
    tracker.accrue_spend(&meta, record.total_cost()).await.unwrap();
    ledger.end(&id, true, 800, "").await.unwrap();

    let status = tracker.get_status(Scope::Project, "alpha").await.unwrap();
    assert!(status.is_over_daily);
    assert!((status.budget.spent_usd - 1.05).abs() < 1e-9);

    let raised = alerts.check_budget_alerts(Scope::Project, "alpha").await;
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].level, AlertLevel::Critical);
    assert!(raised[0].should_block());

    let check = tracker.check_budget(Scope::Project, "alpha", 0.01).await;
    assert!(!check.allowed);
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open(&dir).await;
        let ledger = SessionLedger::new(db.clone(), PricingTable::new());
        let tracker = BudgetTracker::new(db.clone(), BudgetConfig::default());
        tracker.create_budget(Scope::Global, "", 5.0, 50.0).await.unwrap();
        let id = ledger.begin(&SessionMeta::new("p", "tool")).await.unwrap();
        ledger
            .record_usage_with_cost(&id, &TokenUsage::exact(10, 10), "m", "tool", 0.5, 0.5)
            .await
            .unwrap();
        ledger.end(&id, true, 1, "").await.unwrap();
        db.close().await.unwrap();
    }

    let db = open(&dir).await;
    let tracker = BudgetTracker::new(db.clone(), BudgetConfig::default());
    let status = tracker.get_status(Scope::Global, "").await.unwrap();
    assert!((status.today_spent - 1.0).abs() < 1e-9);
    assert!((status.daily_progress.unwrap() - 20.0).abs() < 1e-9);

    let ledger = SessionLedger::new(db, PricingTable::new());
    assert_eq!(ledger.list_recent_sessions(10).await.unwrap().len(), 1);
}
