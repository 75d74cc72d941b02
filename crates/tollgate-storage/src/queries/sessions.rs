// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session row operations.

use rusqlite::{OptionalExtension, params};
use tollgate_core::TollgateError;

use crate::database::{Database, map_tr_err};
use crate::models::SessionRow;

const SESSION_COLUMNS: &str = "id, started_at, ended_at, project, branch, profile, adapter, \
     task_type, success, latency_ms, notes";

/// Outcome of a guarded end-of-session update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    Ended,
    NotFound,
    AlreadyEnded,
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        started_at: row.get(1)?,
        ended_at: row.get(2)?,
        project: row.get(3)?,
        branch: row.get(4)?,
        profile: row.get(5)?,
        adapter: row.get(6)?,
        task_type: row.get(7)?,
        success: row.get(8)?,
        latency_ms: row.get(9)?,
        notes: row.get(10)?,
    })
}

/// Insert a freshly begun session.
pub async fn insert_session(db: &Database, session: &SessionRow) -> Result<(), TollgateError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, started_at, project, branch, profile, adapter, task_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id,
                    session.started_at,
                    session.project,
                    session.branch,
                    session.profile,
                    session.adapter,
                    session.task_type,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Close a session. Only rows with a null `ended_at` are touched.
pub async fn end_session(
    db: &Database,
    id: &str,
    ended_at: i64,
    success: bool,
    latency_ms: i64,
    notes: &str,
) -> Result<EndOutcome, TollgateError> {
    let id = id.to_string();
    let notes = notes.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions SET ended_at = ?1, success = ?2, latency_ms = ?3, notes = ?4
                 WHERE id = ?5 AND ended_at IS NULL",
                params![ended_at, success, latency_ms, notes, id],
            )?;
            if changed > 0 {
                return Ok(EndOutcome::Ended);
            }
            let exists = conn
                .query_row("SELECT 1 FROM sessions WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?
                .is_some();
            Ok(if exists {
                EndOutcome::AlreadyEnded
            } else {
                EndOutcome::NotFound
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one session by id.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<SessionRow>, TollgateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently started sessions first.
pub async fn list_recent_sessions(
    db: &Database,
    limit: u32,
) -> Result<Vec<SessionRow>, TollgateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 ORDER BY started_at DESC, rowid DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_session)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Sessions begun but never ended.
pub async fn list_open_sessions(db: &Database) -> Result<Vec<SessionRow>, TollgateError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE ended_at IS NULL ORDER BY started_at"
            ))?;
            let rows = stmt.query_map([], row_to_session)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, started_at: i64) -> SessionRow {
        SessionRow {
            id: id.to_string(),
            started_at,
            ended_at: None,
            project: "tollgate".to_string(),
            branch: "main".to_string(),
            profile: "work".to_string(),
            adapter: "http".to_string(),
            task_type: String::new(),
            success: None,
            latency_ms: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let db = Database::open_in_memory().await.unwrap();
        insert_session(&db, &sample("s1", 100)).await.unwrap();

        let row = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(row.project, "tollgate");
        assert!(!row.is_ended());
        assert!(get_session(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_is_applied_once() {
        let db = Database::open_in_memory().await.unwrap();
        insert_session(&db, &sample("s1", 100)).await.unwrap();

        let first = end_session(&db, "s1", 200, true, 42, "ok").await.unwrap();
        assert_eq!(first, EndOutcome::Ended);

        let second = end_session(&db, "s1", 300, false, 1, "again").await.unwrap();
        assert_eq!(second, EndOutcome::AlreadyEnded);

        let row = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(row.ended_at, Some(200));
        assert_eq!(row.success, Some(true));
        assert_eq!(row.latency_ms, Some(42));
        assert_eq!(row.notes.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn end_unknown_session_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let outcome = end_session(&db, "ghost", 1, true, 0, "").await.unwrap();
        assert_eq!(outcome, EndOutcome::NotFound);
    }

    #[tokio::test]
    async fn recent_sessions_are_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        for (id, ts) in [("a", 10), ("b", 30), ("c", 20)] {
            insert_session(&db, &sample(id, ts)).await.unwrap();
        }
        end_session(&db, "b", 40, true, 1, "").await.unwrap();

        let recent = list_recent_sessions(&db, 2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let open = list_open_sessions(&db).await.unwrap();
        assert_eq!(open.len(), 2);
    }
}
