// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner profiles indexed by key.
//!
//! Built once from `[[profiles]]` and handed to the [`Executor`](crate::Executor).

use std::collections::BTreeMap;

use tollgate_config::model::{AdapterKind, ProfileConfig};
use tollgate_core::TollgateError;

#[derive(Debug, Clone, Default)]
pub struct RunnerRegistry {
    profiles: BTreeMap<String, ProfileConfig>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured profiles. Later duplicates replace earlier ones.
    pub fn from_profiles(profiles: &[ProfileConfig]) -> Self {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile.clone());
        }
        registry
    }

    pub fn register(&mut self, profile: ProfileConfig) {
        self.profiles.insert(profile.key.clone(), profile);
    }

    pub fn get(&self, key: &str) -> Result<&ProfileConfig, TollgateError> {
        self.profiles
            .get(key)
            .ok_or_else(|| TollgateError::RunnerNotFound {
                name: key.to_string(),
            })
    }

    /// `(key, adapter)` pairs in key order.
    pub fn list(&self) -> Vec<(&str, AdapterKind)> {
        self.profiles
            .values()
            .map(|p| (p.key.as_str(), p.adapter))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(key: &str, adapter: AdapterKind) -> ProfileConfig {
        ProfileConfig {
            key: key.to_string(),
            adapter,
            ..ProfileConfig::default()
        }
    }

    #[test]
    fn lookup_by_key() {
        let registry = RunnerRegistry::from_profiles(&[
            profile("work", AdapterKind::Http),
            profile("local", AdapterKind::Tool),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("local").unwrap().adapter, AdapterKind::Tool);
        assert_eq!(
            registry.list(),
            vec![("local", AdapterKind::Tool), ("work", AdapterKind::Http)]
        );
    }

    #[test]
    fn unknown_key_is_runner_not_found() {
        let registry = RunnerRegistry::new();
        assert!(registry.is_empty());
        let err = registry.get("ghost").unwrap_err();
        assert!(matches!(err, TollgateError::RunnerNotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn registries_are_independent() {
        let mut a = RunnerRegistry::new();
        let b = RunnerRegistry::new();
        a.register(profile("x", AdapterKind::Http));
        assert!(a.get("x").is_ok());
        assert!(b.get("x").is_err());
    }
}
