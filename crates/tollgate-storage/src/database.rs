// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: pragma setup, migrations and lifecycle.
//!
//! Every statement runs on tokio-rusqlite's single background thread, which
//! serializes writes. Do not open extra connections for writing.

use std::path::Path;
use std::time::Duration;

use tollgate_config::model::StorageConfig;
use tollgate_core::TollgateError;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Convert a tokio-rusqlite error into `TollgateError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TollgateError {
    TollgateError::storage(e)
}

/// Unwrap a closure that already produced a `TollgateError`.
pub(crate) fn map_call_err(e: tokio_rusqlite::Error<TollgateError>) -> TollgateError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        tokio_rusqlite::Error::Close((_, source)) => TollgateError::storage(source),
        tokio_rusqlite::Error::ConnectionClosed => TollgateError::Storage {
            source: "database connection closed".into(),
        },
        _ => TollgateError::Storage {
            source: "database call failed".into(),
        },
    }
}

/// An open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` with WAL enabled.
    pub async fn open(path: &str) -> Result<Self, TollgateError> {
        Self::open_with(path, true).await
    }

    /// Open the database described by the `[storage]` section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, TollgateError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, TollgateError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(TollgateError::storage)?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(TollgateError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Fresh in-memory database, migrated. Each call is isolated.
    pub async fn open_in_memory() -> Result<Self, TollgateError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(TollgateError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), TollgateError> {
        self.conn
            .call(move |conn| -> Result<(), TollgateError> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get::<_, String>(0)
                    })
                    .map_err(TollgateError::storage)?;
                    conn.pragma_update(None, "synchronous", "NORMAL")
                        .map_err(TollgateError::storage)?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")
                    .map_err(TollgateError::storage)?;
                conn.busy_timeout(BUSY_TIMEOUT)
                    .map_err(TollgateError::storage)?;
                migrations::run_migrations(conn)
            })
            .await
            .map_err(map_call_err)
    }

    /// The underlying async connection, for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), TollgateError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}
