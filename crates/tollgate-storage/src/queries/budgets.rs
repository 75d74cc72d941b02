// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget row operations.

use rusqlite::{OptionalExtension, params};
use tollgate_core::{Scope, TollgateError};

use crate::database::{Database, map_tr_err};
use crate::models::{Budget, SpendSnapshot};
use crate::queries::parse_column;
use crate::queries::usage::spend_in;

const BUDGET_COLUMNS: &str =
    "id, scope, target, daily_usd, hard_cap, period_start, period_end, spent_usd";

fn row_to_budget(row: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        scope: parse_column(row, 1)?,
        target: row.get(2)?,
        daily_usd: row.get(3)?,
        hard_cap: row.get(4)?,
        period_start: row.get(5)?,
        period_end: row.get(6)?,
        spent_usd: row.get(7)?,
    })
}

fn find_budget(
    conn: &rusqlite::Connection,
    scope: Scope,
    target: &str,
) -> rusqlite::Result<Option<Budget>> {
    // Duplicates are not prevented; the oldest row wins.
    conn.query_row(
        &format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE scope = ?1 AND target = ?2
             ORDER BY rowid LIMIT 1"
        ),
        params![scope.to_string(), target],
        row_to_budget,
    )
    .optional()
}

pub async fn insert_budget(db: &Database, budget: &Budget) -> Result<(), TollgateError> {
    let budget = budget.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO budgets (id, scope, target, daily_usd, hard_cap, period_start,
                     period_end, spent_usd)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    budget.id,
                    budget.scope.to_string(),
                    budget.target,
                    budget.daily_usd,
                    budget.hard_cap,
                    budget.period_start,
                    budget.period_end,
                    budget.spent_usd,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_budget(
    db: &Database,
    scope: Scope,
    target: &str,
) -> Result<Option<Budget>, TollgateError> {
    let target = target.to_string();
    db.connection()
        .call(move |conn| find_budget(conn, scope, &target))
        .await
        .map_err(map_tr_err)
}

pub async fn get_budget_by_id(db: &Database, id: &str) -> Result<Option<Budget>, TollgateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1"),
                params![id],
                row_to_budget,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Every budget, global first, then by scope and target.
pub async fn list_budgets(db: &Database) -> Result<Vec<Budget>, TollgateError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BUDGET_COLUMNS} FROM budgets
                 ORDER BY CASE scope WHEN 'global' THEN 0 WHEN 'project' THEN 1 ELSE 2 END,
                          target, rowid"
            ))?;
            let rows = stmt.query_map([], row_to_budget)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the two limit fields. Returns the number of rows changed.
pub async fn update_limits(
    db: &Database,
    id: &str,
    daily_usd: f64,
    hard_cap: f64,
) -> Result<usize, TollgateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE budgets SET daily_usd = ?1, hard_cap = ?2 WHERE id = ?3",
                params![daily_usd, hard_cap, id],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically add `amount` to one budget's cumulative spend.
pub async fn add_spent(db: &Database, id: &str, amount: f64) -> Result<usize, TollgateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE budgets SET spent_usd = spent_usd + ?1 WHERE id = ?2",
                params![amount, id],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically add `amount` to the global budget and to the project/profile
/// budgets whose target matches. Empty labels match nothing.
pub async fn add_spent_matching(
    db: &Database,
    project: &str,
    profile: &str,
    amount: f64,
) -> Result<usize, TollgateError> {
    let project = project.to_string();
    let profile = profile.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE budgets SET spent_usd = spent_usd + ?1
                 WHERE scope = 'global'
                    OR (scope = 'project' AND ?2 <> '' AND target = ?2)
                    OR (scope = 'profile' AND ?3 <> '' AND target = ?3)",
                params![amount, project, profile],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Move a budget's period bounds.
pub async fn set_period(
    db: &Database,
    id: &str,
    period_start: i64,
    period_end: i64,
) -> Result<usize, TollgateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE budgets SET period_start = ?1, period_end = ?2 WHERE id = ?3",
                params![period_start, period_end, id],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Read a budget and its today/period spend inside one transaction.
///
/// `today` is a half-open `[start, end)` window; the budget period is
/// inclusive of `period_end`.
pub async fn spend_snapshot(
    db: &Database,
    scope: Scope,
    target: &str,
    today: (i64, i64),
) -> Result<Option<SpendSnapshot>, TollgateError> {
    let target = target.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(budget) = find_budget(&tx, scope, &target)? else {
                return Ok(None);
            };
            let today_spent = spend_in(&tx, scope, &target, today.0, today.1)?;
            let period_spent = spend_in(
                &tx,
                scope,
                &target,
                budget.period_start,
                budget.period_end.saturating_add(1),
            )?;
            tx.commit()?;
            Ok(Some(SpendSnapshot {
                budget,
                today_spent,
                period_spent,
            }))
        })
        .await
        .map_err(map_tr_err)
}
