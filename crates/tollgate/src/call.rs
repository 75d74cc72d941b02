// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate call` command implementation.
//!
//! Writes the response (or tool output) to stdout and a one-line session
//! summary to stderr.

use std::io::Write;
use std::path::PathBuf;

use tollgate_agent::{Executor, RunRequest, RunResult, RunnerRegistry};
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::{BudgetTracker, PricingTable, SessionLedger};
use tollgate_http::HttpEngine;
use tollgate_storage::Database;

use crate::shutdown;

pub struct CallArgs {
    pub profile: String,
    pub payload: Option<PathBuf>,
    pub project: String,
    pub branch: String,
    pub task_type: String,
    pub planned_usd: f64,
}

/// Build an executor from configuration.
pub fn build_executor(config: &TollgateConfig, db: Database) -> Result<Executor, TollgateError> {
    let registry = RunnerRegistry::from_profiles(&config.profiles);
    let ledger = SessionLedger::new(db.clone(), PricingTable::from_config(&config.pricing));
    let tracker = BudgetTracker::new(db, config.budget.clone());
    let engine = HttpEngine::new(&config.http)?;
    Ok(Executor::new(registry, ledger, tracker, engine))
}

/// Returns whether the call succeeded.
pub async fn run_call(
    config: &TollgateConfig,
    db: Database,
    args: CallArgs,
) -> Result<bool, TollgateError> {
    let payload = match &args.payload {
        Some(path) => tokio::fs::read(path).await.map_err(|e| {
            TollgateError::InvalidInput(format!("cannot read payload {}: {e}", path.display()))
        })?,
        None => Vec::new(),
    };

    let executor = build_executor(config, db)?;
    let request = RunRequest::new(args.profile)
        .with_payload(payload)
        .with_project(args.project)
        .with_branch(args.branch)
        .with_task_type(args.task_type)
        .with_planned_usd(args.planned_usd);

    let cancel = shutdown::install_signal_handler();
    let result = executor.run(&request, &cancel).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&result.output)
        .and_then(|()| stdout.flush())
        .map_err(|e| TollgateError::Internal(format!("failed to write output: {e}")))?;

    eprintln!("{}", summary(&result));
    Ok(result.success)
}

fn summary(result: &RunResult) -> String {
    let outcome = if result.success {
        "ok".to_string()
    } else {
        format!("failed ({})", result.notes)
    };
    format!(
        "session {}: {} | {} in / {} out tokens ({}) | ${:.4} | {} ms",
        result.session_id,
        outcome,
        result.usage.input_tokens,
        result.usage.output_tokens,
        result.usage.estimate,
        result.cost_usd,
        result.latency_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::{SessionId, TokenUsage};

    #[test]
    fn summary_line() {
        let result = RunResult {
            session_id: SessionId::from("s-1"),
            success: false,
            output: Vec::new(),
            usage: TokenUsage::exact(10, 5),
            cost_usd: 0.0123,
            status_code: Some(503),
            attempts: 3,
            notes: "5xx".into(),
            latency_ms: 42,
        };
        assert_eq!(
            summary(&result),
            "session s-1: failed (5xx) | 10 in / 5 out tokens (exact) | $0.0123 | 42 ms"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_call_is_metered_end_to_end() {
        use tollgate_config::model::{AdapterKind, ProfileConfig};

        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("payload.txt");
        std::fs::write(&payload, "hello").unwrap();

        let mut config = TollgateConfig::default();
        config.storage.database_path = dir.path().join("db/tollgate.db").display().to_string();
        config.profiles.push(ProfileConfig {
            key: "echo".into(),
            adapter: AdapterKind::Tool,
            bin: Some("cat".into()),
            ..ProfileConfig::default()
        });

        let db = Database::from_config(&config.storage).await.unwrap();
        let args = CallArgs {
            profile: "echo".into(),
            payload: Some(payload),
            project: "alpha".into(),
            branch: String::new(),
            task_type: String::new(),
            planned_usd: 0.0,
        };
        assert!(run_call(&config, db.clone(), args).await.unwrap());

        let ledger = SessionLedger::new(db.clone(), PricingTable::from_config(&config.pricing));
        let sessions = ledger.list_recent_sessions(5).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].project, "alpha");
        assert_eq!(sessions[0].success, Some(true));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_payload_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let args = CallArgs {
            profile: "any".into(),
            payload: Some(dir.path().join("absent.json")),
            project: String::new(),
            branch: String::new(),
            task_type: String::new(),
            planned_usd: 0.0,
        };
        let err = run_call(&TollgateConfig::default(), db, args).await.unwrap_err();
        assert!(matches!(err, TollgateError::InvalidInput(_)));
    }
}
