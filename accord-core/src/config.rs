//! Engine configuration, built the same way as domain types: a
//! `with_*`-chained builder that validates on `.build()`. Defaults here
//! match the documented external-interface defaults exactly, so an engine
//! constructed with `Default::default()` behaves the way an operator reading
//! the interface table would expect.

use crate::error::{Error, Result};
use crate::negotiation::ConflictResolutionStrategy;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the Shared Context Engine
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub sync_interval: Duration,
    pub max_size_bytes: u64,
    pub compression_threshold_bytes: u64,
    pub archive_every_n_versions: u32,
    pub memory_integration_enabled: bool,
    /// Bound on the notification dispatcher's queue before it starts
    /// dropping the oldest pending notification.
    pub notification_queue_capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(500),
            max_size_bytes: 200 * 1024 * 1024,
            compression_threshold_bytes: 5_000,
            archive_every_n_versions: 5,
            memory_integration_enabled: true,
            notification_queue_capacity: 1_000,
        }
    }
}

impl ContextConfig {
    pub fn builder() -> ContextConfigBuilder {
        ContextConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ContextConfigBuilder {
    inner: Option<ContextConfig>,
}

impl ContextConfigBuilder {
    fn base(&mut self) -> &mut ContextConfig {
        self.inner.get_or_insert_with(ContextConfig::default)
    }

    pub fn sync_interval(mut self, value: Duration) -> Self {
        self.base().sync_interval = value;
        self
    }

    pub fn max_size_bytes(mut self, value: u64) -> Self {
        self.base().max_size_bytes = value;
        self
    }

    pub fn compression_threshold_bytes(mut self, value: u64) -> Self {
        self.base().compression_threshold_bytes = value;
        self
    }

    pub fn archive_every_n_versions(mut self, value: u32) -> Self {
        self.base().archive_every_n_versions = value;
        self
    }

    pub fn memory_integration_enabled(mut self, value: bool) -> Self {
        self.base().memory_integration_enabled = value;
        self
    }

    pub fn notification_queue_capacity(mut self, value: usize) -> Self {
        self.base().notification_queue_capacity = value;
        self
    }

    pub fn build(mut self) -> Result<ContextConfig> {
        let config = self.base().clone();
        if config.archive_every_n_versions == 0 {
            return Err(Error::invalid_argument(
                "archive_every_n_versions must be at least 1",
            ));
        }
        Ok(config)
    }
}

/// Configuration for the Team Formation Engine
#[derive(Debug, Clone)]
pub struct TeamFormationConfig {
    pub capability_match_threshold: f64,
}

impl Default for TeamFormationConfig {
    fn default() -> Self {
        Self {
            capability_match_threshold: 0.75,
        }
    }
}

impl TeamFormationConfig {
    pub fn builder() -> TeamFormationConfigBuilder {
        TeamFormationConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct TeamFormationConfigBuilder {
    inner: Option<TeamFormationConfig>,
}

impl TeamFormationConfigBuilder {
    pub fn capability_match_threshold(mut self, value: f64) -> Self {
        self.inner
            .get_or_insert_with(TeamFormationConfig::default)
            .capability_match_threshold = value;
        self
    }

    pub fn build(mut self) -> Result<TeamFormationConfig> {
        let config = self
            .inner
            .take()
            .unwrap_or_else(TeamFormationConfig::default);
        if !(0.0..=1.0).contains(&config.capability_match_threshold) {
            return Err(Error::invalid_argument(
                "capability_match_threshold must be in 0.0..=1.0",
            ));
        }
        Ok(config)
    }
}

/// Per-resource ceiling used by the OPTIMIZATION conflict-resolution
/// strategy's utility calculation. The source this spec was distilled from
/// hardcoded a constant 100.0 `getMaxQuantity`; here it's a configurable
/// map with that same value as the fallback default.
#[derive(Debug, Clone, Default)]
pub struct OptimizationEngineConfig {
    default_max_quantity: Option<f64>,
    per_resource_max_quantity: HashMap<String, f64>,
}

impl OptimizationEngineConfig {
    pub fn with_resource_max(mut self, resource_key: impl Into<String>, max: f64) -> Self {
        self.per_resource_max_quantity.insert(resource_key.into(), max);
        self
    }

    pub fn max_quantity_for(&self, resource_key: &str) -> f64 {
        self.per_resource_max_quantity
            .get(resource_key)
            .copied()
            .unwrap_or_else(|| self.default_max_quantity.unwrap_or(100.0))
    }
}

/// Configuration for the Negotiation Engine
#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    pub max_rounds: u32,
    pub timeout: Duration,
    pub default_strategy: ConflictResolutionStrategy,
    pub fallback_strategy: ConflictResolutionStrategy,
    pub resource_optimization_enabled: bool,
    pub optimization: OptimizationEngineConfig,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            timeout: Duration::from_secs(15),
            default_strategy: ConflictResolutionStrategy::PriorityBased,
            fallback_strategy: ConflictResolutionStrategy::Compromise,
            resource_optimization_enabled: true,
            optimization: OptimizationEngineConfig::default(),
        }
    }
}

impl NegotiationConfig {
    pub fn builder() -> NegotiationConfigBuilder {
        NegotiationConfigBuilder::default()
    }

    /// The strategy actually used: OPTIMIZATION falls back to
    /// `fallback_strategy` when resource optimization is disabled.
    pub fn effective_strategy(
        &self,
        requested: ConflictResolutionStrategy,
    ) -> ConflictResolutionStrategy {
        if requested == ConflictResolutionStrategy::Optimization
            && !self.resource_optimization_enabled
        {
            self.fallback_strategy
        } else {
            requested
        }
    }
}

#[derive(Debug, Default)]
pub struct NegotiationConfigBuilder {
    inner: Option<NegotiationConfig>,
}

impl NegotiationConfigBuilder {
    fn base(&mut self) -> &mut NegotiationConfig {
        self.inner.get_or_insert_with(NegotiationConfig::default)
    }

    pub fn max_rounds(mut self, value: u32) -> Self {
        self.base().max_rounds = value;
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.base().timeout = value;
        self
    }

    pub fn default_strategy(mut self, value: ConflictResolutionStrategy) -> Self {
        self.base().default_strategy = value;
        self
    }

    pub fn fallback_strategy(mut self, value: ConflictResolutionStrategy) -> Self {
        self.base().fallback_strategy = value;
        self
    }

    pub fn resource_optimization_enabled(mut self, value: bool) -> Self {
        self.base().resource_optimization_enabled = value;
        self
    }

    pub fn optimization(mut self, value: OptimizationEngineConfig) -> Self {
        self.base().optimization = value;
        self
    }

    pub fn build(mut self) -> Result<NegotiationConfig> {
        let config = self.base().clone();
        if config.max_rounds == 0 {
            return Err(Error::invalid_argument("max_rounds must be at least 1"));
        }
        if config.fallback_strategy == ConflictResolutionStrategy::Optimization {
            return Err(Error::invalid_argument(
                "fallback_strategy cannot itself be OPTIMIZATION",
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_config_defaults_match_documented_values() {
        let config = ContextConfig::default();
        assert_eq!(config.sync_interval, Duration::from_millis(500));
        assert_eq!(config.max_size_bytes, 200 * 1024 * 1024);
        assert_eq!(config.compression_threshold_bytes, 5_000);
        assert_eq!(config.archive_every_n_versions, 5);
        assert!(config.memory_integration_enabled);
    }

    #[test]
    fn negotiation_config_defaults_match_documented_values() {
        let config = NegotiationConfig::default();
        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.default_strategy, ConflictResolutionStrategy::PriorityBased);
        assert_eq!(config.fallback_strategy, ConflictResolutionStrategy::Compromise);
        assert!(config.resource_optimization_enabled);
    }

    #[test]
    fn optimization_falls_back_when_disabled() {
        let config = NegotiationConfigBuilder::default()
            .resource_optimization_enabled(false)
            .build()
            .unwrap();
        assert_eq!(
            config.effective_strategy(ConflictResolutionStrategy::Optimization),
            ConflictResolutionStrategy::Compromise
        );
    }

    #[test]
    fn max_quantity_falls_back_to_default() {
        let optimization = OptimizationEngineConfig::default().with_resource_max("gpu", 8.0);
        assert_eq!(optimization.max_quantity_for("gpu"), 8.0);
        assert_eq!(optimization.max_quantity_for("cpu"), 100.0);
    }
}
