//! Check catalogue and the shared dimension evaluation loop.
//!
//! Every dimension declares a fixed, ordered table of [`Check`]s. Each entry
//! pairs static metadata (impact, effort, default thresholds) with a measure
//! function that turns the dimension's input bundle into a raw
//! [`Measurement`], or `None` when the input it needs is absent. Scoring,
//! classification, recommendation attachment and the dimension rollup are
//! the same for every dimension and live here.

use super::config::ProductAuditEngineConfig;
use super::feed::FeedAuditor;
use super::market::MarketAuditor;
use super::profitability::ProfitabilityAuditor;
use super::supplier::SupplierAuditor;
use super::types::{
    AuditCheck, AuditDimension, AuditEffort, AuditImpact, AuditStatus, DimensionAuditResult,
    DimensionMetrics, ScoreThresholds,
};

/// Static description of one check type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub expected_value: &'static str,
    pub impact: AuditImpact,
    pub effort: AuditEffort,
    /// Share of the dimension average relative to sibling checks
    pub weight: f64,
    pub thresholds: ScoreThresholds,
}

/// A catalogued check bound to the input bundle it reads.
pub struct Check<D: 'static> {
    pub definition: CheckDefinition,
    pub measure: fn(&D, &ProductAuditEngineConfig) -> Option<Measurement>,
}

/// Raw outcome of a measure function before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub score: f64,
    pub value: String,
    pub expected_value: Option<String>,
    /// Attached as the recommendation when the check does not pass
    pub advice: String,
}

impl Measurement {
    pub fn new(score: f64, value: impl Into<String>, advice: impl Into<String>) -> Self {
        Self { score, value: value.into(), expected_value: None, advice: advice.into() }
    }

    pub fn expecting(mut self, expected_value: impl Into<String>) -> Self {
        self.expected_value = Some(expected_value.into());
        self
    }
}

/// One audit dimension: its input bundle, check table and metrics.
pub trait DimensionAuditor {
    type Data: 'static;

    const DIMENSION: AuditDimension;
    const CHECKS: &'static [Check<Self::Data>];

    fn metrics(data: &Self::Data, config: &ProductAuditEngineConfig) -> Option<DimensionMetrics>;
}

/// Runs every check of `A` in catalogue order and rolls them up.
///
/// A missing bundle yields a result whose checks are all not applicable and
/// whose score is `None`.
pub fn evaluate_dimension<A: DimensionAuditor>(
    data: Option<&A::Data>,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    let checks: Vec<AuditCheck> = A::CHECKS
        .iter()
        .map(|check| {
            let measurement = data.and_then(|data| (check.measure)(data, config));
            build_check(&check.definition, measurement, config.thresholds_for(&check.definition))
        })
        .collect();

    let score = weighted_mean(&checks);
    let status = score
        .map(|score| config.dimension_thresholds.classify(score))
        .unwrap_or(AuditStatus::NotApplicable);
    let recommendations = checks
        .iter()
        .filter_map(|check| check.recommendation.clone())
        .filter(|recommendation| !recommendation.is_empty())
        .collect();

    DimensionAuditResult {
        dimension: A::DIMENSION,
        score,
        status,
        checks,
        recommendations,
        weight: config.weights.get(A::DIMENSION),
        metrics: data.and_then(|data| A::metrics(data, config)),
    }
}

fn build_check(
    definition: &CheckDefinition,
    measurement: Option<Measurement>,
    thresholds: ScoreThresholds,
) -> AuditCheck {
    let expected_default = definition.expected_value.to_string();

    match measurement.filter(|measurement| measurement.score.is_finite()) {
        Some(measurement) => {
            let score = round_to(measurement.score.clamp(0.0, 100.0), 1);
            let status = thresholds.classify(score);
            AuditCheck {
                id: definition.id.to_string(),
                name: definition.name.to_string(),
                description: definition.description.to_string(),
                status,
                score,
                value: measurement.value,
                expected_value: measurement.expected_value.unwrap_or(expected_default),
                recommendation: status.needs_action().then_some(measurement.advice),
                impact: definition.impact,
                effort: definition.effort,
                weight: definition.weight,
            }
        }
        None => AuditCheck {
            id: definition.id.to_string(),
            name: definition.name.to_string(),
            description: definition.description.to_string(),
            status: AuditStatus::NotApplicable,
            score: 0.0,
            value: "not provided".to_string(),
            expected_value: expected_default,
            recommendation: None,
            impact: definition.impact,
            effort: definition.effort,
            weight: definition.weight,
        },
    }
}

/// Weighted mean over applicable checks, `None` if there are none.
pub(crate) fn weighted_mean(checks: &[AuditCheck]) -> Option<f64> {
    let (weighted, total) = checks
        .iter()
        .filter(|check| check.status != AuditStatus::NotApplicable)
        .fold((0.0, 0.0), |(weighted, total), check| {
            (weighted + check.score * check.weight, total + check.weight)
        });

    if total <= 0.0 {
        None
    } else {
        Some(round_to((weighted / total).clamp(0.0, 100.0), 1))
    }
}

/// Catalogue entries of one dimension, in evaluation order.
pub fn definitions(dimension: AuditDimension) -> Vec<&'static CheckDefinition> {
    match dimension {
        AuditDimension::Profitability => {
            ProfitabilityAuditor::CHECKS.iter().map(|check| &check.definition).collect()
        }
        AuditDimension::Supplier => {
            SupplierAuditor::CHECKS.iter().map(|check| &check.definition).collect()
        }
        AuditDimension::Feed => FeedAuditor::CHECKS.iter().map(|check| &check.definition).collect(),
        AuditDimension::Market => {
            MarketAuditor::CHECKS.iter().map(|check| &check.definition).collect()
        }
    }
}

pub fn find_check(id: &str) -> Option<&'static CheckDefinition> {
    AuditDimension::ALL
        .into_iter()
        .flat_map(definitions)
        .find(|definition| definition.id == id)
}

// ---------------------------------------------------------------------------
// Input helpers shared by measure functions
// ---------------------------------------------------------------------------

/// Finite, non-negative number or nothing.
pub(crate) fn amount(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value >= 0.0)
}

/// Finite percentage within 0..=100 or nothing.
pub(crate) fn percentage(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && (0.0..=100.0).contains(value))
}

/// Trimmed, non-empty text or nothing.
pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(|value| value.trim()).filter(|value| !value.is_empty())
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn check(status: AuditStatus, score: f64, weight: f64) -> AuditCheck {
        AuditCheck {
            id: "probe".to_string(),
            name: "Probe".to_string(),
            description: String::new(),
            status,
            score,
            value: String::new(),
            expected_value: String::new(),
            recommendation: None,
            impact: AuditImpact::Low,
            effort: AuditEffort::Low,
            weight,
        }
    }

    #[test]
    fn score_at_pass_threshold_is_passed() {
        let thresholds = ScoreThresholds::new(70.0, 40.0);
        assert_eq!(thresholds.classify(70.0), AuditStatus::Passed);
        assert_eq!(thresholds.classify(69.9), AuditStatus::Warning);
        assert_eq!(thresholds.classify(40.0), AuditStatus::Warning);
        assert_eq!(thresholds.classify(39.9), AuditStatus::Failed);
    }

    #[test]
    fn weighted_mean_ignores_not_applicable_checks() {
        let checks = vec![
            check(AuditStatus::Passed, 90.0, 2.0),
            check(AuditStatus::NotApplicable, 0.0, 5.0),
            check(AuditStatus::Failed, 30.0, 1.0),
        ];
        assert_eq!(weighted_mean(&checks), Some(70.0));
    }

    #[test]
    fn weighted_mean_of_only_not_applicable_checks_is_none() {
        let checks = vec![check(AuditStatus::NotApplicable, 0.0, 1.0)];
        assert_eq!(weighted_mean(&checks), None);
        assert_eq!(weighted_mean(&[]), None);
    }

    #[test]
    fn build_check_attaches_advice_only_when_not_passing() {
        let definition = find_check("roi").expect("roi is catalogued");
        let passed = build_check(
            definition,
            Some(Measurement::new(75.0, "75.0%", "improve roi")),
            definition.thresholds,
        );
        assert_eq!(passed.status, AuditStatus::Passed);
        assert_eq!(passed.recommendation, None);

        let failed = build_check(
            definition,
            Some(Measurement::new(-12.0, "-12.0%", "improve roi")),
            definition.thresholds,
        );
        assert_eq!(failed.status, AuditStatus::Failed);
        assert_eq!(failed.score, 0.0);
        assert_eq!(failed.recommendation.as_deref(), Some("improve roi"));
    }

    #[test]
    fn non_finite_measurement_is_not_applicable() {
        let definition = find_check("roi").expect("roi is catalogued");
        let check = build_check(
            definition,
            Some(Measurement::new(f64::NAN, "NaN", "improve roi")),
            definition.thresholds,
        );
        assert_eq!(check.status, AuditStatus::NotApplicable);
        assert_eq!(check.score, 0.0);
    }

    #[test]
    fn catalogue_ids_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for dimension in AuditDimension::ALL {
            let definitions = definitions(dimension);
            assert!(!definitions.is_empty(), "{dimension} has no checks");
            for definition in definitions {
                assert!(seen.insert(definition.id), "duplicate check id {}", definition.id);
                assert!(definition.weight > 0.0);
                assert!(definition.thresholds.warn <= definition.thresholds.pass);
                assert!((0.0..=100.0).contains(&definition.thresholds.pass));
            }
        }
    }
}
