// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end storage tests against an on-disk database.

use tollgate_core::{EstimateLevel, Scope};
use tollgate_storage::Database;
use tollgate_storage::models::{Budget, SessionRow, UsageRecord};
use tollgate_storage::queries::{budgets, sessions, usage};

fn session(id: &str, project: &str) -> SessionRow {
    SessionRow {
        id: id.to_string(),
        started_at: 1_000,
        ended_at: None,
        project: project.to_string(),
        branch: String::new(),
        profile: "work".to_string(),
        adapter: "http".to_string(),
        task_type: String::new(),
        success: None,
        latency_ms: None,
        notes: None,
    }
}

fn usage_row(id: &str, session_id: &str, ts: i64, cost: f64) -> UsageRecord {
    UsageRecord {
        id: id.to_string(),
        session_id: session_id.to_string(),
        ts,
        input_tokens: 10,
        output_tokens: 10,
        input_cost: cost,
        output_cost: 0.0,
        tool: "http".to_string(),
        model: "gpt-4o".to_string(),
        estimate_level: EstimateLevel::Exact,
    }
}

#[tokio::test]
async fn snapshot_combines_today_and_period_spend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tollgate.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();

    sessions::insert_session(&db, &session("s1", "alpha")).await.unwrap();
    sessions::insert_session(&db, &session("s2", "beta")).await.unwrap();
    budgets::insert_budget(
        &db,
        &Budget {
            id: "b1".to_string(),
            scope: Scope::Project,
            target: "alpha".to_string(),
            daily_usd: 10.0,
            hard_cap: 50.0,
            period_start: 1_000,
            period_end: 5_000,
            spent_usd: 0.0,
        },
    )
    .await
    .unwrap();

    // Before the period, inside it (yesterday and today), on the last second, after it.
    for (id, ts, cost) in [
        ("u0", 999, 100.0),
        ("u1", 1_500, 1.0),
        ("u2", 3_000, 2.0),
        ("u3", 5_000, 4.0),
        ("u4", 5_001, 100.0),
    ] {
        usage::insert_usage(&db, &usage_row(id, "s1", ts, cost)).await.unwrap();
    }
    usage::insert_usage(&db, &usage_row("other", "s2", 3_000, 50.0))
        .await
        .unwrap();

    let snap = budgets::spend_snapshot(&db, Scope::Project, "alpha", (2_500, 3_500))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.budget.id, "b1");
    assert!((snap.today_spent - 2.0).abs() < 1e-9);
    assert!((snap.period_spent - 7.0).abs() < 1e-9);

    db.close().await.unwrap();

    // Data survives a reopen.
    let db = Database::open(path.to_str().unwrap()).await.unwrap();
    let rows = usage::usage_for_session(&db, "s1").await.unwrap();
    assert_eq!(rows.len(), 5);
}
