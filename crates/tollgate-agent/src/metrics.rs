// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register metric descriptions. Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        "tollgate_http_attempts_total",
        "HTTP attempts by profile and final error class"
    );
    describe_counter!("tollgate_tokens_total", "Tokens consumed");
    describe_counter!("tollgate_sessions_total", "Metered sessions by outcome");
    describe_histogram!(
        "tollgate_session_latency_seconds",
        "Wall-clock latency of metered sessions"
    );
    describe_gauge!(
        "tollgate_budget_remaining_usd",
        "Remaining daily budget in USD"
    );
}

/// `class` is empty for a successful call.
pub fn record_http_call(profile: &str, class: &str, attempts: u32) {
    let class = if class.is_empty() { "ok" } else { class };
    metrics::counter!(
        "tollgate_http_attempts_total",
        "profile" => profile.to_string(),
        "class" => class.to_string()
    )
    .increment(u64::from(attempts));
}

pub fn record_tokens(model: &str, input: u32, output: u32) {
    metrics::counter!("tollgate_tokens_total", "model" => model.to_string(), "type" => "input")
        .increment(u64::from(input));
    metrics::counter!("tollgate_tokens_total", "model" => model.to_string(), "type" => "output")
        .increment(u64::from(output));
}

pub fn record_session(profile: &str, success: bool, latency_secs: f64) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "tollgate_sessions_total",
        "profile" => profile.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("tollgate_session_latency_seconds").record(latency_secs);
}

pub fn set_budget_remaining(scope: &str, target: &str, usd: f64) {
    metrics::gauge!(
        "tollgate_budget_remaining_usd",
        "scope" => scope.to_string(),
        "target" => target.to_string()
    )
    .set(usd);
}
