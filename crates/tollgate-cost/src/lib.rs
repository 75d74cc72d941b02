// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metering and spend control for the Tollgate pipeline.
//!
//! - **Session ledger**: begin / record usage / end lifecycle, persisted
//! - **Budget tracker**: per-scope spend aggregation against daily and period limits
//! - **Alert manager**: warning/critical threshold evaluation with in-memory history
//! - **Pricing**: per-model rates and cost calculation

pub mod alerts;
pub mod budget;
pub mod ledger;
pub mod period;
pub mod pricing;

pub use alerts::{ALERT_HISTORY_LIMIT, Alert, AlertLevel, AlertManager, LimitKind};
pub use budget::{BudgetCheck, BudgetStatus, BudgetTracker, WarningLevel};
pub use ledger::SessionLedger;
pub use pricing::{ModelPricing, PricingTable, calculate_cost};
