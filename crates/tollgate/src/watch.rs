// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate watch`: poll budgets on an interval and print new notifications.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tollgate_agent::{NotificationEvent, Notifier};
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::BudgetTracker;
use tollgate_storage::Database;
use tracing::{info, warn};

use crate::shutdown;

pub async fn run_watch(
    config: &TollgateConfig,
    db: Database,
    interval_secs: u64,
    json: bool,
) -> Result<(), TollgateError> {
    if interval_secs == 0 {
        return Err(TollgateError::InvalidInput(
            "watch interval must be at least 1 second".into(),
        ));
    }

    let tracker = BudgetTracker::new(db, config.budget.clone());
    let mut notifier = Notifier::new(tracker, config.alerts.clone());
    let cancel = shutdown::install_signal_handler();

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs, "watching budgets");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match notifier.poll().await {
            Ok(events) => {
                for event in &events {
                    println!("{}", render(event, json)?);
                }
            }
            // A failed poll is retried on the next tick.
            Err(e) => warn!(error = %e, "notification poll failed"),
        }
    }

    info!("watch stopped");
    Ok(())
}

fn render(event: &NotificationEvent, json: bool) -> Result<String, TollgateError> {
    if json {
        return serde_json::to_string(event)
            .map_err(|e| TollgateError::Internal(format!("failed to encode event: {e}")));
    }
    Ok(format!(
        "[{}] {}: {}\n{}",
        event.timestamp.format("%H:%M:%S"),
        event.kind,
        event.title,
        event.message
    ))
}
