// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate budget` subcommands.

use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::{AlertManager, BudgetStatus, BudgetTracker, WarningLevel};
use tollgate_storage::Database;

use crate::BudgetCommand;

/// Returns false when a check refuses the amount.
pub async fn run_budget(
    config: &TollgateConfig,
    db: Database,
    action: BudgetCommand,
) -> Result<bool, TollgateError> {
    let tracker = BudgetTracker::new(db, config.budget.clone());

    match action {
        BudgetCommand::Create {
            scope,
            target,
            daily,
            cap,
        } => {
            let budget = tracker.create_budget(scope, &target, daily, cap).await?;
            println!("created {} ({} {})", budget.id, budget.scope, display_target(&budget.target));
        }
        BudgetCommand::Status { scope, target } => {
            let statuses = match scope {
                Some(scope) => vec![tracker.get_status(scope, &target).await?],
                None => {
                    let mut all = Vec::new();
                    for budget in tracker.list_budgets().await? {
                        all.push(tracker.get_status(budget.scope, &budget.target).await?);
                    }
                    all
                }
            };
            if statuses.is_empty() {
                println!("no budgets configured");
            }
            let mut alerts = AlertManager::new(tracker.clone(), config.alerts.clone());
            for status in &statuses {
                println!("{}", status_block(status));
                for alert in alerts.evaluate_status(status) {
                    println!("  {}", alert.message);
                    println!("  {}", alert.suggestion());
                }
            }
        }
        BudgetCommand::Check {
            scope,
            target,
            amount,
        } => {
            let check = tracker.check_budget(scope, &target, amount).await;
            if check.allowed {
                println!("allowed");
            } else {
                println!("not allowed: {}", check.message);
                return Ok(false);
            }
        }
        BudgetCommand::SetLimits { id, daily, cap } => {
            tracker.update_limits(&id, daily, cap).await?;
            println!("updated {id}");
        }
    }
    Ok(true)
}

fn display_target(target: &str) -> &str {
    if target.is_empty() { "-" } else { target }
}

fn status_block(status: &BudgetStatus) -> String {
    let marker = match status.warning_level() {
        WarningLevel::Critical => "!!",
        WarningLevel::Warning => "! ",
        WarningLevel::None => "  ",
    };
    format!(
        "{marker}{} {} [{}]\n  {}",
        status.budget.scope,
        display_target(&status.budget.target),
        status.budget.id,
        status.format_status()
    )
}
