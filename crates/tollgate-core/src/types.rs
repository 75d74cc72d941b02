// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the parser, engine, ledger and tracker.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a metered session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Allocate a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Budget and alert dimension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Project,
    Profile,
}

/// Provenance of a token count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstimateLevel {
    /// Parsed from the provider's own usage report.
    Exact,
    /// Derived through a model lookup table.
    Mapped,
    /// Guessed or defaulted.
    #[default]
    Heuristic,
}

/// Token usage and latency for one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub estimate: EstimateLevel,
}

impl TokenUsage {
    /// Zero counts tagged heuristic: what every unparseable response degrades to.
    pub fn heuristic() -> Self {
        Self::default()
    }

    pub fn exact(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            latency_ms: 0,
            estimate: EstimateLevel::Exact,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        u64::from(self.input_tokens) + u64::from(self.output_tokens)
    }

    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0
    }
}

/// Free-text scope labels attached to a session at begin time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub project: String,
    pub branch: String,
    pub profile: String,
    pub adapter: String,
    pub task_type: String,
}

impl SessionMeta {
    pub fn new(profile: impl Into<String>, adapter: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            adapter: adapter.into(),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }
}
