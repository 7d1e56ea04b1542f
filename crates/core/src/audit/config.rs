//! Engine weights and thresholds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::checks::{find_check, CheckDefinition};
use super::types::{AuditDimension, ScoreThresholds};
use crate::errors::ConfigurationError;

/// Allowed drift of the weight sum away from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Contribution of each dimension to the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub profitability: f64,
    pub supplier: f64,
    pub feed: f64,
    pub market: f64,
}

impl DimensionWeights {
    pub fn get(&self, dimension: AuditDimension) -> f64 {
        match dimension {
            AuditDimension::Profitability => self.profitability,
            AuditDimension::Supplier => self.supplier,
            AuditDimension::Feed => self.feed,
            AuditDimension::Market => self.market,
        }
    }

    pub fn set(&mut self, dimension: AuditDimension, weight: f64) {
        match dimension {
            AuditDimension::Profitability => self.profitability = weight,
            AuditDimension::Supplier => self.supplier = weight,
            AuditDimension::Feed => self.feed = weight,
            AuditDimension::Market => self.market = weight,
        }
    }

    pub fn sum(&self) -> f64 {
        AuditDimension::ALL.iter().map(|dimension| self.get(*dimension)).sum()
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        DEFAULT_AUDIT_ENGINE_CONFIG.weights
    }
}

/// Caller-supplied or default weights and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAuditEngineConfig {
    pub weights: DimensionWeights,
    /// Net margin percentage considered healthy
    pub target_margin: f64,
    /// Classification applied to dimension scores and the overall score
    pub dimension_thresholds: ScoreThresholds,
    /// Per-check overrides keyed by check id; unlisted checks use their defaults
    #[serde(default)]
    pub check_thresholds: BTreeMap<String, ScoreThresholds>,
    /// Cap on returned priority actions, `None` for all of them
    pub max_priority_actions: Option<usize>,
}

/// Process-wide fallback configuration.
pub static DEFAULT_AUDIT_ENGINE_CONFIG: ProductAuditEngineConfig = ProductAuditEngineConfig {
    weights: DimensionWeights { profitability: 0.30, supplier: 0.25, feed: 0.25, market: 0.20 },
    target_margin: 30.0,
    dimension_thresholds: ScoreThresholds::new(80.0, 60.0),
    check_thresholds: BTreeMap::new(),
    max_priority_actions: Some(10),
};

impl Default for ProductAuditEngineConfig {
    fn default() -> Self {
        DEFAULT_AUDIT_ENGINE_CONFIG.clone()
    }
}

impl ProductAuditEngineConfig {
    /// Thresholds for a check, honouring overrides.
    pub fn thresholds_for(&self, check: &CheckDefinition) -> ScoreThresholds {
        self.check_thresholds.get(check.id).copied().unwrap_or(check.thresholds)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for dimension in AuditDimension::ALL {
            let value = self.weights.get(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidWeight { dimension, value });
            }
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum { sum, tolerance: WEIGHT_SUM_TOLERANCE });
        }

        if !self.target_margin.is_finite() || self.target_margin <= 0.0 || self.target_margin > 100.0
        {
            return Err(ConfigurationError::InvalidTargetMargin(self.target_margin));
        }

        validate_thresholds("dimension_thresholds", &self.dimension_thresholds)?;
        for (check_id, thresholds) in &self.check_thresholds {
            if find_check(check_id).is_none() {
                return Err(ConfigurationError::UnknownCheck(check_id.clone()));
            }
            validate_thresholds(check_id, thresholds)?;
        }

        if self.max_priority_actions == Some(0) {
            return Err(ConfigurationError::InvalidActionLimit);
        }

        Ok(())
    }
}

fn validate_thresholds(scope: &str, thresholds: &ScoreThresholds) -> Result<(), ConfigurationError> {
    let in_range = |value: f64| value.is_finite() && (0.0..=100.0).contains(&value);
    if !in_range(thresholds.pass) || !in_range(thresholds.warn) {
        return Err(ConfigurationError::InvalidThresholds {
            scope: scope.to_string(),
            reason: "pass and warn must be within 0..=100".to_string(),
        });
    }
    if thresholds.warn > thresholds.pass {
        return Err(ConfigurationError::InvalidThresholds {
            scope: scope.to_string(),
            reason: format!("warn ({}) exceeds pass ({})", thresholds.warn, thresholds.pass),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_sums_to_one() {
        assert_eq!(DEFAULT_AUDIT_ENGINE_CONFIG.validate(), Ok(()));
        assert!((DEFAULT_AUDIT_ENGINE_CONFIG.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_summing_to_half_or_one_and_a_half_are_rejected() {
        for scale in [0.5, 1.5] {
            let mut config = ProductAuditEngineConfig::default();
            for dimension in AuditDimension::ALL {
                let weight = config.weights.get(dimension) * scale;
                config.weights.set(dimension, weight);
            }
            assert!(matches!(config.validate(), Err(ConfigurationError::WeightSum { .. })));
        }
    }

    #[test]
    fn negative_and_nan_weights_are_rejected() {
        let mut config = ProductAuditEngineConfig::default();
        config.weights.supplier = -0.25;
        config.weights.market = 0.70;
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidWeight {
                dimension: AuditDimension::Supplier,
                value: -0.25
            })
        );

        let mut config = ProductAuditEngineConfig::default();
        config.weights.feed = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidWeight { dimension: AuditDimension::Feed, .. })
        ));
    }

    #[test]
    fn inverted_or_out_of_range_thresholds_are_rejected() {
        let mut config = ProductAuditEngineConfig::default();
        config.dimension_thresholds = ScoreThresholds::new(50.0, 70.0);
        assert!(matches!(config.validate(), Err(ConfigurationError::InvalidThresholds { .. })));

        let mut config = ProductAuditEngineConfig::default();
        config.check_thresholds.insert("gross-margin".to_string(), ScoreThresholds::new(120.0, 40.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidThresholds { ref scope, .. }) if scope == "gross-margin"
        ));
    }

    #[test]
    fn overrides_for_unknown_checks_are_rejected() {
        let mut config = ProductAuditEngineConfig::default();
        config.check_thresholds.insert("margin-vibes".to_string(), ScoreThresholds::new(70.0, 40.0));
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::UnknownCheck("margin-vibes".to_string()))
        );
    }

    #[test]
    fn override_takes_precedence_over_catalogue_default() {
        let check = find_check("roi").expect("roi is catalogued");
        let mut config = ProductAuditEngineConfig::default();
        assert_eq!(config.thresholds_for(check), check.thresholds);

        config.check_thresholds.insert("roi".to_string(), ScoreThresholds::new(90.0, 10.0));
        assert_eq!(config.thresholds_for(check), ScoreThresholds::new(90.0, 10.0));
    }

    #[test]
    fn zero_action_limit_and_bad_target_margin_are_rejected() {
        let config =
            ProductAuditEngineConfig { max_priority_actions: Some(0), ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidActionLimit));

        let config = ProductAuditEngineConfig { target_margin: 0.0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidTargetMargin(0.0)));
    }
}
