// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metered execution for Tollgate.
//!
//! The [`Executor`] is the coordinator that:
//! - Resolves a runner profile from an explicit [`RunnerRegistry`]
//! - Runs the budget pre-flight check (advisory or enforced)
//! - Wraps the HTTP or tool delegate in exactly one ledger session
//! - Records usage, accrues spend and always ends the session
//!
//! The [`Notifier`] turns budget alerts and suggestions into deduplicated events.

pub mod delegate;
pub mod executor;
pub mod metrics;
pub mod notifier;
pub mod registry;
pub mod tool;

pub use delegate::{Delegate, DelegateOutcome, HttpDelegate};
pub use executor::{Executor, RunRequest, RunResult};
pub use notifier::{EventKind, NotificationEvent, Notifier, Suggestion, SuggestionSource};
pub use registry::RunnerRegistry;
pub use tool::ToolDelegate;
