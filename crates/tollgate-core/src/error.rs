// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tollgate metering pipeline.

use thiserror::Error;

/// The primary error type used across the ledger, tracker, storage and orchestration layers.
///
/// Classified HTTP outcomes are NOT errors: the execution engine reports them
/// through its result value. This enum covers the failures that callers must
/// handle (lost writes, missing rows, misconfiguration).
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Configuration errors (invalid values, missing profile fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A session id that was never begun.
    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    /// `end` was called on a session that already has an end timestamp.
    #[error("session already ended: {id}")]
    SessionAlreadyEnded { id: String },

    /// No budget row exists for the scope/target pair.
    #[error("budget not found: {scope}/{target}")]
    BudgetNotFound { scope: String, target: String },

    /// A planned spend was refused because budget enforcement is enabled.
    #[error("budget exhausted: {message}")]
    BudgetExhausted { message: String },

    /// Caller supplied a value outside the accepted domain (negative cost, empty key).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No runner profile registered under the requested key.
    #[error("runner not found: {name}")]
    RunnerNotFound { name: String },

    /// The delegate (tool subprocess or HTTP call) could not be executed at all.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Wrap any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// True for "row is absent" failures, which the tracker treats as fail-open.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound { .. } | Self::BudgetNotFound { .. } | Self::RunnerNotFound { .. }
        )
    }
}
