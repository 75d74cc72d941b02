// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tollgate metering pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Tollgate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Process-level settings (logging).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Execution engine defaults.
    #[serde(default)]
    pub http: HttpConfig,

    /// Threshold alerting settings.
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Budget policy flags.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Per-model pricing overrides.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Runner profiles, keyed by `key`.
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tollgate").join("tollgate.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tollgate.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Execution engine defaults applied when a request leaves a field unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt (2 means up to 3 attempts).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit: attempt `k` waits `k * backoff_step_ms`.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Method used when a request does not name one.
    #[serde(default = "default_method")]
    pub default_method: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
            default_method: default_method(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_step_ms() -> u64 {
    1000
}

fn default_method() -> String {
    "POST".to_string()
}

/// Threshold alerting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertConfig {
    /// Evaluate the daily limit.
    #[serde(default = "default_true")]
    pub enable_daily: bool,

    /// Evaluate the hard cap.
    #[serde(default = "default_true")]
    pub enable_cap: bool,

    /// Percentage at which a warning alert fires.
    #[serde(default = "default_warning_percent")]
    pub warning_percent: f64,

    /// Percentage at which a critical alert fires.
    #[serde(default = "default_critical_percent")]
    pub critical_percent: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enable_daily: true,
            enable_cap: true,
            warning_percent: default_warning_percent(),
            critical_percent: default_critical_percent(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_warning_percent() -> f64 {
    80.0
}

fn default_critical_percent() -> f64 {
    100.0
}

/// What a pre-flight check answers when no budget row exists (or it cannot be read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBudgetPolicy {
    /// Fail open: spending is allowed.
    #[default]
    Allow,
    /// Fail closed: spending is refused.
    Deny,
}

/// How status queries treat a budget whose period end has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiredPeriodPolicy {
    /// Report `expired = true` and zero days remaining.
    #[default]
    Clamp,
    /// Move the period to [start of today, end of this month] and persist it.
    Rollover,
}

/// Budget policy configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    #[serde(default)]
    pub on_missing: MissingBudgetPolicy,

    #[serde(default)]
    pub on_expired: ExpiredPeriodPolicy,

    /// Refuse calls whose pre-flight check fails instead of only logging.
    #[serde(default)]
    pub enforce: bool,
}

/// Per-model price in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPriceConfig {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Pricing overrides keyed by exact model name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    #[serde(default)]
    pub models: BTreeMap<String, ModelPriceConfig>,
}

/// How a profile reaches its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Http,
    Tool,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tool => "tool",
        }
    }
}

/// One `[[profiles]]` entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Unique profile key.
    pub key: String,

    #[serde(default)]
    pub adapter: AdapterKind,

    /// Model name used for pricing lookup.
    #[serde(default)]
    pub model: String,

    /// Provider endpoint (http profiles).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Extra request headers (http profiles).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Executable (tool profiles).
    #[serde(default)]
    pub bin: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Environment for tool profiles; API key variables also become http headers.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}
