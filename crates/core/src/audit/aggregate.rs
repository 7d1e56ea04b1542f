//! Cross-dimension rollup: overall score, priority actions and summary.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::checks::{evaluate_dimension, round_to, DimensionAuditor};
use super::config::ProductAuditEngineConfig;
use super::feed::FeedAuditor;
use super::market::MarketAuditor;
use super::profitability::ProfitabilityAuditor;
use super::summary::summarize;
use super::supplier::SupplierAuditor;
use super::types::{
    AuditDimension, AuditEffort, AuditImpact, AuditStatus, DimensionAuditResult, PriorityAction,
    ProductAuditEngineResult,
};

pub const INSUFFICIENT_DATA_ACTION: &str = "insufficient-data";

/// Result for a dimension that received no input bundle.
pub fn not_applicable_result(
    dimension: AuditDimension,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    fn empty<A: DimensionAuditor>(config: &ProductAuditEngineConfig) -> DimensionAuditResult {
        evaluate_dimension::<A>(None, config)
    }

    match dimension {
        AuditDimension::Profitability => empty::<ProfitabilityAuditor>(config),
        AuditDimension::Supplier => empty::<SupplierAuditor>(config),
        AuditDimension::Feed => empty::<FeedAuditor>(config),
        AuditDimension::Market => empty::<MarketAuditor>(config),
    }
}

/// Combines dimension results into the engine output.
///
/// Results may arrive in any order; the first result seen for a dimension
/// wins and absent dimensions are filled with not-applicable results.
/// Dimension weights are renormalised over the dimensions that produced a
/// score, so missing data never drags the overall score down.
pub fn aggregate(
    results: Vec<DimensionAuditResult>,
    config: &ProductAuditEngineConfig,
) -> ProductAuditEngineResult {
    let mut by_dimension = BTreeMap::new();
    for result in results {
        by_dimension.entry(result.dimension).or_insert(result);
    }
    for dimension in AuditDimension::ALL {
        by_dimension
            .entry(dimension)
            .or_insert_with(|| not_applicable_result(dimension, config));
    }

    if !by_dimension.values().any(DimensionAuditResult::has_data) {
        return ProductAuditEngineResult {
            overall_score: 0,
            overall_status: AuditStatus::NotApplicable,
            summary: summarize(&by_dimension),
            dimension_results: by_dimension,
            priority_actions: vec![insufficient_data_action()],
        };
    }

    let scored_weight: f64 = by_dimension
        .values()
        .filter(|result| result.has_data())
        .map(|result| config.weights.get(result.dimension))
        .sum();

    // Scored dimensions that all carry zero weight contribute nothing.
    let weighted: f64 = if scored_weight > 0.0 {
        by_dimension
            .values()
            .filter_map(|result| {
                result.score.map(|score| score * config.weights.get(result.dimension) / scored_weight)
            })
            .sum()
    } else {
        0.0
    };
    let overall_score = weighted.round().clamp(0.0, 100.0) as u8;

    let mut priority_actions = collect_actions(&by_dimension, config, scored_weight);
    priority_actions.sort_by(rank_actions);
    if let Some(limit) = config.max_priority_actions {
        priority_actions.truncate(limit);
    }

    ProductAuditEngineResult {
        overall_score,
        overall_status: config.dimension_thresholds.classify(f64::from(overall_score)),
        summary: summarize(&by_dimension),
        dimension_results: by_dimension,
        priority_actions,
    }
}

fn collect_actions(
    results: &BTreeMap<AuditDimension, DimensionAuditResult>,
    config: &ProductAuditEngineConfig,
    scored_weight: f64,
) -> Vec<PriorityAction> {
    let mut actions = Vec::new();

    for result in results.values().filter(|result| result.has_data()) {
        let dimension_share = if scored_weight > 0.0 {
            config.weights.get(result.dimension) / scored_weight
        } else {
            0.0
        };
        let check_weight_total: f64 = result
            .checks
            .iter()
            .filter(|check| check.status != AuditStatus::NotApplicable)
            .map(|check| check.weight)
            .sum();

        for check in result.checks.iter().filter(|check| check.status.needs_action()) {
            let gain = (100.0 - check.score) * check.weight / check_weight_total * dimension_share;
            actions.push(PriorityAction {
                dimension: Some(result.dimension),
                check_id: check.id.clone(),
                action: check.recommendation.clone().unwrap_or_else(|| check.name.clone()),
                impact: check.impact,
                effort: check.effort,
                score: check.score,
                estimated_score_gain: round_to(gain, 1),
            });
        }
    }

    actions
}

/// Impact first, then the lowest score, then canonical dimension order.
/// `sort_by` is stable, so evaluation order breaks the remaining ties.
fn rank_actions(left: &PriorityAction, right: &PriorityAction) -> Ordering {
    right
        .impact
        .rank()
        .cmp(&left.impact.rank())
        .then_with(|| left.score.total_cmp(&right.score))
        .then_with(|| left.dimension.cmp(&right.dimension))
}

fn insufficient_data_action() -> PriorityAction {
    PriorityAction {
        dimension: None,
        check_id: INSUFFICIENT_DATA_ACTION.to_string(),
        action: "Provide data for at least one audit dimension".to_string(),
        impact: AuditImpact::High,
        effort: AuditEffort::Low,
        score: 0.0,
        estimated_score_gain: 0.0,
    }
}
