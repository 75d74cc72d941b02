// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: threshold
//! ordering, non-negative prices, unique profile keys, adapter-specific fields.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{AdapterKind, TollgateConfig};

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &TollgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.http.timeout_secs == 0 {
        errors.push(ConfigError::validation("http.timeout_secs must be positive"));
    }

    if config.http.default_method.trim().is_empty() {
        errors.push(ConfigError::validation(
            "http.default_method must not be empty",
        ));
    }

    let alerts = &config.alerts;
    if alerts.warning_percent <= 0.0 {
        errors.push(ConfigError::validation(format!(
            "alerts.warning_percent must be positive, got {}",
            alerts.warning_percent
        )));
    }
    if alerts.warning_percent > alerts.critical_percent {
        errors.push(ConfigError::validation(format!(
            "alerts.warning_percent ({}) must not exceed alerts.critical_percent ({})",
            alerts.warning_percent, alerts.critical_percent
        )));
    }

    for (model, price) in &config.pricing.models {
        if price.input_per_mtok < 0.0 || price.output_per_mtok < 0.0 {
            errors.push(ConfigError::validation(format!(
                "pricing.models.{model} prices must be non-negative"
            )));
        }
    }

    let mut seen = HashSet::new();
    for (i, profile) in config.profiles.iter().enumerate() {
        if profile.key.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "profiles[{i}].key must not be empty"
            )));
            continue;
        }
        if !seen.insert(profile.key.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate profile key `{}`",
                profile.key
            )));
        }
        match profile.adapter {
            AdapterKind::Http => {
                if profile.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
                    errors.push(ConfigError::validation(format!(
                        "profile `{}` uses the http adapter but has no endpoint",
                        profile.key
                    )));
                }
            }
            AdapterKind::Tool => {
                if profile.bin.as_deref().is_none_or(|b| b.trim().is_empty()) {
                    errors.push(ConfigError::validation(format!(
                        "profile `{}` uses the tool adapter but has no bin",
                        profile.key
                    )));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
