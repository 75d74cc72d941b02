// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tollgate metering pipeline.
//!
//! This crate provides the error type and the small value types (scopes,
//! estimate levels, token usage, session labels) shared by every other
//! Tollgate crate.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TollgateError;
pub use types::{EstimateLevel, Scope, SessionId, SessionMeta, TokenUsage};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn scope_display_and_parse() {
        for scope in [Scope::Global, Scope::Project, Scope::Profile] {
            let s = scope.to_string();
            assert_eq!(Scope::from_str(&s).unwrap(), scope);
        }
        assert_eq!(Scope::Project.to_string(), "project");
        assert!(Scope::from_str("team").is_err());
    }

    #[test]
    fn estimate_level_strings() {
        assert_eq!(EstimateLevel::Exact.to_string(), "exact");
        assert_eq!(EstimateLevel::Mapped.to_string(), "mapped");
        assert_eq!(EstimateLevel::Heuristic.to_string(), "heuristic");
        assert_eq!(EstimateLevel::default(), EstimateLevel::Heuristic);
    }

    #[test]
    fn estimate_level_serializes_lowercase() {
        let json = serde_json::to_string(&EstimateLevel::Exact).unwrap();
        assert_eq!(json, "\"exact\"");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn token_usage_helpers() {
        let usage = TokenUsage::exact(150, 250);
        assert_eq!(usage.total_tokens(), 400);
        assert!(!usage.is_zero());
        assert!(TokenUsage::heuristic().is_zero());
    }

    #[test]
    fn not_found_errors_are_flagged() {
        let err = TollgateError::BudgetNotFound {
            scope: "global".into(),
            target: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!TollgateError::Internal("x".into()).is_not_found());
        assert_eq!(err.to_string(), "budget not found: global/");
    }

    #[test]
    fn session_meta_builder() {
        let meta = SessionMeta::new("work", "http")
            .with_project("tollgate")
            .with_branch("main")
            .with_task_type("review");
        assert_eq!(meta.profile, "work");
        assert_eq!(meta.project, "tollgate");
        assert_eq!(meta.branch, "main");
        assert_eq!(meta.task_type, "review");
    }
}
