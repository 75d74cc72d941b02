// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate sessions` command implementation.

use chrono::{Local, TimeZone};
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::{PricingTable, SessionLedger};
use tollgate_storage::Database;
use tollgate_storage::models::SessionRow;

pub async fn run_sessions(
    config: &TollgateConfig,
    db: Database,
    limit: u32,
) -> Result<(), TollgateError> {
    let ledger = SessionLedger::new(db, PricingTable::from_config(&config.pricing));
    let sessions = ledger.list_recent_sessions(limit).await?;
    let today = ledger.today_stats().await?;

    if sessions.is_empty() {
        println!("no sessions recorded");
    } else {
        println!(
            "{:<36}  {:<16}  {:<12}  {:<6}  {:<8}  {:>8}  notes",
            "id", "started", "profile", "adapter", "status", "ms"
        );
        for row in &sessions {
            println!("{}", format_row(row));
        }
    }
    println!(
        "today: {} sessions, {} tokens, ${:.4}",
        today.sessions, today.total_tokens, today.total_cost
    );
    Ok(())
}

fn format_time(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn status(row: &SessionRow) -> &'static str {
    match row.success {
        Some(true) => "ok",
        Some(false) => "failed",
        None => "open",
    }
}

fn format_row(row: &SessionRow) -> String {
    let latency = row
        .latency_ms
        .map(|ms| ms.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<36}  {:<16}  {:<12}  {:<6}  {:<8}  {:>8}  {}",
        row.id,
        format_time(row.started_at),
        row.profile,
        row.adapter,
        status(row),
        latency,
        row.notes.as_deref().unwrap_or("")
    )
}
