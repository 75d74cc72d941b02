// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Tollgate metering pipeline.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer model via
//! `tokio-rusqlite`, and parameterized query modules for sessions, usage
//! records and budgets.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
