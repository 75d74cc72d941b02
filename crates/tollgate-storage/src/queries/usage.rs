// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage record operations and spend aggregates.

use rusqlite::params;
use tollgate_core::{Scope, TollgateError};

use crate::database::{Database, map_tr_err};
use crate::models::{DailySummary, UsageRecord, UsageStats};
use crate::queries::parse_column;

/// Result of an insert that may reference a missing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    MissingSession,
}

fn row_to_usage(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageRecord> {
    Ok(UsageRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        ts: row.get(2)?,
        input_tokens: row.get(3)?,
        output_tokens: row.get(4)?,
        input_cost: row.get(5)?,
        output_cost: row.get(6)?,
        tool: row.get(7)?,
        model: row.get(8)?,
        estimate_level: parse_column(row, 9)?,
    })
}

/// Append a usage record. Foreign-key violations map to `MissingSession`.
pub async fn insert_usage(
    db: &Database,
    record: &UsageRecord,
) -> Result<InsertOutcome, TollgateError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO usage_records (id, session_id, ts, input_tokens, output_tokens,
                     input_cost, output_cost, tool, model, estimate_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.session_id,
                    record.ts,
                    record.input_tokens,
                    record.output_tokens,
                    record.input_cost,
                    record.output_cost,
                    record.tool,
                    record.model,
                    record.estimate_level.to_string(),
                ],
            );
            match result {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
                {
                    Ok(InsertOutcome::MissingSession)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All usage records of one session, oldest first.
pub async fn usage_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<UsageRecord>, TollgateError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, ts, input_tokens, output_tokens, input_cost, output_cost,
                        tool, model, estimate_level
                 FROM usage_records WHERE session_id = ?1 ORDER BY ts, rowid",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_usage)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Sum of usage cost in `[start, end)` attributed to `scope`/`target`.
///
/// Project and profile labels live on the session row, so scoped sums join
/// through `sessions`.
pub fn spend_in(
    conn: &rusqlite::Connection,
    scope: Scope,
    target: &str,
    start: i64,
    end: i64,
) -> rusqlite::Result<f64> {
    match scope {
        Scope::Global => conn.query_row(
            "SELECT COALESCE(SUM(input_cost + output_cost), 0.0) FROM usage_records
             WHERE ts >= ?1 AND ts < ?2",
            params![start, end],
            |row| row.get(0),
        ),
        Scope::Project => conn.query_row(
            "SELECT COALESCE(SUM(u.input_cost + u.output_cost), 0.0)
             FROM usage_records u JOIN sessions s ON s.id = u.session_id
             WHERE u.ts >= ?1 AND u.ts < ?2 AND s.project = ?3",
            params![start, end, target],
            |row| row.get(0),
        ),
        Scope::Profile => conn.query_row(
            "SELECT COALESCE(SUM(u.input_cost + u.output_cost), 0.0)
             FROM usage_records u JOIN sessions s ON s.id = u.session_id
             WHERE u.ts >= ?1 AND u.ts < ?2 AND s.profile = ?3",
            params![start, end, target],
            |row| row.get(0),
        ),
    }
}

/// Async wrapper around [`spend_in`].
pub async fn spend_between(
    db: &Database,
    scope: Scope,
    target: &str,
    start: i64,
    end: i64,
) -> Result<f64, TollgateError> {
    let target = target.to_string();
    db.connection()
        .call(move |conn| spend_in(conn, scope, &target, start, end))
        .await
        .map_err(map_tr_err)
}

/// Token, cost and session totals for usage at or after `since`.
pub async fn stats_since(db: &Database, since: i64) -> Result<UsageStats, TollgateError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(input_tokens + output_tokens), 0),
                        COALESCE(SUM(input_cost + output_cost), 0.0),
                        COUNT(DISTINCT session_id)
                 FROM usage_records WHERE ts >= ?1",
                params![since],
                |row| {
                    Ok(UsageStats {
                        total_tokens: row.get(0)?,
                        total_cost: row.get(1)?,
                        sessions: row.get(2)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent `days` rows of the daily summary view, newest first.
pub async fn daily_summary(db: &Database, days: u32) -> Result<Vec<DailySummary>, TollgateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date, total_tokens, total_cost, sessions
                 FROM v_daily_summary ORDER BY date DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![days], |row| {
                Ok(DailySummary {
                    date: row.get(0)?,
                    total_tokens: row.get(1)?,
                    total_cost: row.get(2)?,
                    sessions: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
