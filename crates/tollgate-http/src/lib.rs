// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP execution engine and usage parser.
//!
//! [`HttpEngine`] sends one logical call with bounded linear-backoff retries,
//! classifies every failure into an [`ErrorClass`], and parses token usage
//! from successful responses. Classified failures are reported through
//! [`HttpResult`], never as `Err`.

pub mod engine;
pub mod usage;

pub use engine::{ErrorClass, HttpEngine, HttpRequest, HttpResult};
pub use usage::parse_usage;
