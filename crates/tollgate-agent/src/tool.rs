// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External command-line tools as delegates.
//!
//! The payload is written to the child's stdin. A tool reports usage by
//! printing a JSON line such as
//! `{"event":"usage","input_tokens":120,"output_tokens":40}` on stdout or
//! stderr; stdout is searched first.

use std::io;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tollgate_config::model::ProfileConfig;
use tollgate_core::{TokenUsage, TollgateError};
use tracing::{debug, warn};

use crate::delegate::{Delegate, DelegateOutcome, resolve_value};

#[derive(Debug, Deserialize)]
struct UsageEvent {
    #[serde(default)]
    event: String,
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Runs the profile's `bin` with its `args` and `env`.
#[derive(Debug, Clone, Default)]
pub struct ToolDelegate;

impl ToolDelegate {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Delegate for ToolDelegate {
    async fn execute(
        &self,
        profile: &ProfileConfig,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DelegateOutcome, TollgateError> {
        let bin = profile.bin.as_deref().ok_or_else(|| {
            TollgateError::Config(format!("profile '{}' has no bin", profile.key))
        })?;

        let mut command = Command::new(bin);
        command
            .args(&profile.args)
            .envs(profile.env.iter().map(|(k, v)| (k, resolve_value(v))))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = command.spawn().map_err(|e| TollgateError::Execution {
            message: format!("failed to spawn '{bin}': {e}"),
            source: Some(Box::new(e)),
        })?;

        let stdin = child.stdin.take();
        let input = payload.to_vec();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if !input.is_empty() {
                    stdin.write_all(&input).await?;
                }
                stdin.shutdown().await?;
            }
            Ok::<(), io::Error>(())
        };

        let run = async { tokio::join!(feed, child.wait_with_output()) };
        let (fed, output) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(profile = %profile.key, bin, "tool cancelled; child killed");
                return Ok(DelegateOutcome::failed("timeout", Vec::new(), TokenUsage::heuristic()));
            }
            joined = run => joined,
        };

        if let Err(e) = fed {
            // Tools that never read stdin close the pipe early.
            if e.kind() != io::ErrorKind::BrokenPipe {
                debug!(profile = %profile.key, error = %e, "writing tool stdin failed");
            }
        }

        let output = output.map_err(|e| TollgateError::Execution {
            message: format!("failed waiting for '{bin}': {e}"),
            source: Some(Box::new(e)),
        })?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut usage = parse_tool_usage(&output.stdout, &output.stderr);
        usage.latency_ms = latency_ms;

        let failure = if output.status.success() {
            None
        } else {
            Some(match output.status.code() {
                Some(code) => format!("exit code {code}: {}", first_line(&output.stderr)),
                None => "terminated by signal".to_string(),
            })
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        debug!(
            profile = %profile.key,
            exit = ?output.status.code(),
            latency_ms,
            estimate = %usage.estimate,
            "tool delegate finished"
        );

        Ok(match failure {
            None => DelegateOutcome::succeeded(combined, usage),
            Some(reason) => DelegateOutcome::failed(reason, combined, usage),
        })
    }
}

/// First usage event with a positive count, stdout before stderr.
pub fn parse_tool_usage(stdout: &[u8], stderr: &[u8]) -> TokenUsage {
    scan_events(stdout)
        .or_else(|| scan_events(stderr))
        .unwrap_or_else(TokenUsage::heuristic)
}

fn scan_events(data: &[u8]) -> Option<TokenUsage> {
    String::from_utf8_lossy(data).lines().find_map(|line| {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        let event: UsageEvent = serde_json::from_str(line).ok()?;
        if event.event != "usage" || (event.input_tokens == 0 && event.output_tokens == 0) {
            return None;
        }
        Some(TokenUsage::exact(clamp(event.input_tokens), clamp(event.output_tokens)))
    })
}

fn clamp(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn first_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use tollgate_core::EstimateLevel;

    use super::*;

    #[test]
    fn stdout_event_wins() {
        let stdout = b"hello\n{\"event\":\"usage\",\"input_tokens\":12,\"output_tokens\":3}\n";
        let stderr = b"{\"event\":\"usage\",\"input_tokens\":99,\"output_tokens\":99}\n";
        let usage = parse_tool_usage(stdout, stderr);
        assert_eq!((usage.input_tokens, usage.output_tokens), (12, 3));
        assert_eq!(usage.estimate, EstimateLevel::Exact);
    }

    #[test]
    fn falls_back_to_stderr() {
        let stderr = b"warn: slow\n{\"event\":\"usage\",\"input_tokens\":5,\"output_tokens\":0}";
        let usage = parse_tool_usage(b"plain output", stderr);
        assert_eq!((usage.input_tokens, usage.output_tokens), (5, 0));
    }

    #[test]
    fn ignores_zero_and_foreign_events() {
        let stdout = concat!(
            "{\"event\":\"usage\",\"input_tokens\":0,\"output_tokens\":0}\n",
            "{\"event\":\"progress\",\"input_tokens\":7}\n",
            "{not json\n",
        );
        let usage = parse_tool_usage(stdout.as_bytes(), b"");
        assert!(usage.is_zero());
        assert_eq!(usage.estimate, EstimateLevel::Heuristic);
    }

    #[test]
    fn first_stderr_line_for_notes() {
        assert_eq!(first_line(b"\n  boom happened \nmore"), "boom happened");
        assert_eq!(first_line(b""), "no output");
    }

    #[cfg(unix)]
    fn sh(script: &str) -> ProfileConfig {
        ProfileConfig {
            key: "sh".into(),
            adapter: tollgate_config::model::AdapterKind::Tool,
            bin: Some("/bin/sh".into()),
            args: vec!["-c".into(), script.into()],
            ..ProfileConfig::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn payload_reaches_stdin_and_usage_is_read() {
        let profile = sh(
            "cat; echo; echo '{\"event\":\"usage\",\"input_tokens\":4,\"output_tokens\":2}'",
        );
        let outcome = ToolDelegate::new()
            .execute(&profile, b"ping", &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.output.starts_with(b"ping"));
        assert_eq!(outcome.usage.input_tokens, 4);
        assert_eq!(outcome.failure, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_noted() {
        let profile = sh("echo 'bad flag' >&2; exit 3");
        let outcome = ToolDelegate::new()
            .execute(&profile, b"", &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.failure.as_deref(), Some("exit code 3: bad flag"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_kills_child() {
        let profile = sh("sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let started = Instant::now();
        let outcome = ToolDelegate::new()
            .execute(&profile, b"", &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.failure.as_deref(), Some("timeout"));
        assert!(started.elapsed().as_secs() < 10);
    }

    #[tokio::test]
    async fn missing_binary_is_execution_error() {
        let profile = ProfileConfig {
            key: "ghost".into(),
            bin: Some("/definitely/not/a/real/binary".into()),
            ..ProfileConfig::default()
        };
        let err = ToolDelegate::new()
            .execute(&profile, b"", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TollgateError::Execution { .. }));
    }
}
