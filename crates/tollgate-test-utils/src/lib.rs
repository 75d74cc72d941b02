// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tollgate integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - temp SQLite database with ledger, tracker and alert manager wired together
//! - [`StubDelegate`] - delegate returning queued outcomes and recording its calls
//! - [`StubSuggestions`] - fixed suggestion source for notifier tests

pub mod harness;
pub mod stub;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use stub::{StubCall, StubDelegate, StubSuggestions};
