// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use tollgate_agent::{EventKind, Notifier, Suggestion};
use tollgate_core::{Scope, SessionMeta};
use tollgate_cost::ALERT_HISTORY_LIMIT;
use tollgate_test_utils::{StubSuggestions, TestHarness};

fn suggestion(kind: &str, title: &str, priority: u8) -> Suggestion {
    Suggestion {
        kind: kind.to_string(),
        title: title.to_string(),
        detail: format!("{title} detail"),
        priority,
    }
}

#[tokio::test]
async fn alerts_for_every_budget_are_surfaced_once() {
    let h = TestHarness::new().await.unwrap();
    h.tracker.create_budget(Scope::Global, "", 100.0, 0.0).await.unwrap();
    h.tracker.create_budget(Scope::Project, "alpha", 10.0, 0.0).await.unwrap();
    h.spend(&SessionMeta::new("work", "http").with_project("alpha"), 8.5)
        .await
        .unwrap();

    let mut notifier = Notifier::new(h.tracker.clone(), h.alert_config.clone());

    let events = notifier.poll().await.unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind, EventKind::BudgetAlert);
    assert_eq!(event.title, "Approaching Daily Budget Limit");
    assert_eq!(event.metadata["scope"], "project");
    assert_eq!(event.metadata["target"], "alpha");
    assert_eq!(event.metadata["level"], "warning");
    assert!(event.message.contains("Daily spending is at 85% of the limit ($8.50 / $10.00)"));

    assert!(notifier.poll().await.unwrap().is_empty());

    notifier.clear();
    assert_eq!(notifier.poll().await.unwrap().len(), 1);
}

#[tokio::test]
async fn escalation_is_a_new_event() {
    let h = TestHarness::new().await.unwrap();
    h.tracker.create_budget(Scope::Global, "", 10.0, 0.0).await.unwrap();
    let meta = SessionMeta::new("work", "http");
    h.spend(&meta, 8.5).await.unwrap();

    let mut notifier = Notifier::new(h.tracker.clone(), h.alert_config.clone());
    assert_eq!(notifier.poll().await.unwrap().len(), 1);

    h.spend(&meta, 2.0).await.unwrap();
    let events = notifier.poll().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Daily Budget Exceeded");
    assert_eq!(events[0].metadata["level"], "critical");
}

#[tokio::test]
async fn suggestions_filtered_by_priority_and_deduplicated() {
    let h = TestHarness::new().await.unwrap();
    let source = StubSuggestions::new(vec![
        suggestion("cost", "Switch to a cheaper model", 5),
        suggestion("profile", "Tune retries", 2),
        suggestion("cost", "Batch small requests", 4),
        suggestion("cost", "Never requested", 5),
    ]);
    let mut notifier =
        Notifier::new(h.tracker.clone(), h.alert_config.clone()).with_suggestions(Arc::new(source));

    let events = notifier.poll().await.unwrap();
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Switch to a cheaper model", "Batch small requests"]);
    assert!(events.iter().all(|e| e.kind == EventKind::Suggestion));
    assert_eq!(events[0].metadata["type"], "cost");
    assert_eq!(events[0].metadata["priority"], "5");
    assert_eq!(
        events[0].message,
        "Switch to a cheaper model\nSwitch to a cheaper model detail"
    );

    assert!(notifier.poll().await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_polls_keep_alert_history_bounded() {
    let h = TestHarness::new().await.unwrap();
    h.tracker.create_budget(Scope::Global, "", 10.0, 0.0).await.unwrap();
    h.spend(&SessionMeta::new("work", "http"), 8.5).await.unwrap();

    let mut notifier = Notifier::new(h.tracker.clone(), h.alert_config.clone());
    let mut surfaced = 0;
    for _ in 0..(ALERT_HISTORY_LIMIT + 50) {
        surfaced += notifier.poll().await.unwrap().len();
    }
    assert_eq!(surfaced, 1);
    assert_eq!(notifier.alert_manager().history().len(), ALERT_HISTORY_LIMIT);

    notifier.clear();
    assert!(notifier.alert_manager().history().is_empty());
}

#[tokio::test]
async fn no_budgets_no_events() {
    let h = TestHarness::new().await.unwrap();
    let mut notifier = Notifier::new(h.tracker.clone(), h.alert_config.clone());
    assert!(notifier.poll().await.unwrap().is_empty());
    assert!(notifier.alert_manager().history().is_empty());
}
