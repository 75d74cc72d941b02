// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Built-in list prices, USD per million tokens:
//!
//! Claude Opus:    input=$15.00, output=$75.00
//! Claude Sonnet:  input=$3.00,  output=$15.00
//! Claude Haiku:   input=$0.80,  output=$4.00
//! GPT-4o:         input=$2.50,  output=$10.00
//! GPT-4o mini:    input=$0.15,  output=$0.60

use std::collections::BTreeMap;

use tollgate_config::model::PricingConfig;
use tollgate_core::TokenUsage;

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelPricing {
    pub const ZERO: Self = Self {
        input_per_mtok: 0.0,
        output_per_mtok: 0.0,
    };

    pub const fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }
}

/// Family substrings, most specific first.
const BUILTIN_FAMILIES: &[(&str, ModelPricing)] = &[
    ("opus", ModelPricing::new(15.0, 75.0)),
    ("sonnet", ModelPricing::new(3.0, 15.0)),
    ("haiku", ModelPricing::new(0.80, 4.0)),
    ("gpt-4o-mini", ModelPricing::new(0.15, 0.60)),
    ("gpt-4o", ModelPricing::new(2.50, 10.0)),
];

/// Price lookup: exact config override, then built-in family, then zero.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    overrides: BTreeMap<String, ModelPricing>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        let overrides = config
            .models
            .iter()
            .map(|(name, p)| {
                (
                    name.to_lowercase(),
                    ModelPricing::new(p.input_per_mtok, p.output_per_mtok),
                )
            })
            .collect();
        Self { overrides }
    }

    pub fn with_override(mut self, model: &str, pricing: ModelPricing) -> Self {
        self.overrides.insert(model.to_lowercase(), pricing);
        self
    }

    /// Pricing for `model`, or `None` when nothing matches.
    pub fn lookup(&self, model: &str) -> Option<ModelPricing> {
        let lower = model.to_lowercase();
        if let Some(p) = self.overrides.get(&lower) {
            return Some(*p);
        }
        BUILTIN_FAMILIES
            .iter()
            .find(|(family, _)| lower.contains(family))
            .map(|(_, p)| *p)
    }

    /// Pricing for `model`; unknown models cost nothing.
    pub fn get(&self, model: &str) -> ModelPricing {
        self.lookup(model).unwrap_or(ModelPricing::ZERO)
    }
}

/// Input and output cost in USD.
pub fn calculate_cost(usage: &TokenUsage, pricing: &ModelPricing) -> (f64, f64) {
    let input = (f64::from(usage.input_tokens) / 1_000_000.0) * pricing.input_per_mtok;
    let output = (f64::from(usage.output_tokens) / 1_000_000.0) * pricing.output_per_mtok;
    (input, output)
}
