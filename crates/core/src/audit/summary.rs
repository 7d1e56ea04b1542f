//! Strengths / weaknesses / opportunities / threats derived from metrics.

use std::collections::BTreeMap;

use super::types::{
    AuditDimension, AuditSummary, DimensionAuditResult, DimensionMetrics, DiversificationStatus,
    MarginHealth, MarketPosition, SupplierRiskLevel,
};

const GOOGLE_READY_STRENGTH: u8 = 80;
const OPPORTUNITY_STRENGTH: f64 = 70.0;
const COMPETITION_PRESSURE: f64 = 50.0;

/// Dimensions without metrics contribute nothing.
pub fn summarize(results: &BTreeMap<AuditDimension, DimensionAuditResult>) -> AuditSummary {
    let mut summary = AuditSummary::default();

    for metrics in results.values().filter_map(|result| result.metrics.as_ref()) {
        match metrics {
            DimensionMetrics::Profitability(metrics) => match metrics.margin_health {
                MarginHealth::Excellent => summary.strengths.push("Excellent profit margin".into()),
                MarginHealth::Critical => {
                    summary.weaknesses.push("Insufficient margin".into());
                    summary.threats.push("Risk of selling at a loss".into());
                }
                MarginHealth::Good | MarginHealth::Warning => {}
            },
            DimensionMetrics::Supplier(metrics) => {
                match metrics.risk_level {
                    SupplierRiskLevel::Low => {
                        summary.strengths.push("Reliable supply chain".into())
                    }
                    SupplierRiskLevel::Critical => {
                        summary.threats.push("Supplier disruption risk".into())
                    }
                    SupplierRiskLevel::Medium | SupplierRiskLevel::High => {}
                }
                if metrics.diversification == DiversificationStatus::SingleSource {
                    summary.weaknesses.push("Dependence on a single supplier".into());
                    summary.opportunities.push("Diversify sourcing".into());
                }
            }
            DimensionMetrics::Feed(metrics) => {
                if metrics.google_ready_score >= GOOGLE_READY_STRENGTH {
                    summary.strengths.push("Listing optimised for Google Shopping".into());
                } else if !metrics.missing_required_fields.is_empty() {
                    summary.weaknesses.push(format!(
                        "Missing feed fields: {}",
                        metrics.missing_required_fields.join(", ")
                    ));
                    summary
                        .opportunities
                        .push("Complete product data to improve visibility".into());
                }
            }
            DimensionMetrics::Market(metrics) => {
                match metrics.market_position {
                    Some(MarketPosition::Leader) => {
                        summary.strengths.push("Market leader position".into())
                    }
                    Some(MarketPosition::Niche) => {
                        summary.opportunities.push("Growth potential in a niche market".into())
                    }
                    _ => {}
                }
                if metrics.opportunity_score.is_some_and(|score| score >= OPPORTUNITY_STRENGTH) {
                    summary.opportunities.push("Strong growth potential".into());
                }
                if metrics.competition_index.is_some_and(|index| index < COMPETITION_PRESSURE) {
                    summary.threats.push("Strong competitive pressure".into());
                }
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{
        AuditStatus, FeedMetrics, MarketMetrics, ProfitabilityMetrics, SupplierMetrics,
    };

    fn with_metrics(dimension: AuditDimension, metrics: DimensionMetrics) -> DimensionAuditResult {
        DimensionAuditResult {
            dimension,
            score: Some(50.0),
            status: AuditStatus::Failed,
            checks: Vec::new(),
            recommendations: Vec::new(),
            weight: 0.25,
            metrics: Some(metrics),
        }
    }

    #[test]
    fn weak_product_collects_weaknesses_and_threats() {
        let mut results = BTreeMap::new();
        results.insert(
            AuditDimension::Profitability,
            with_metrics(
                AuditDimension::Profitability,
                DimensionMetrics::Profitability(ProfitabilityMetrics {
                    gross_margin: 8.0,
                    net_margin: 2.0,
                    profit_per_unit: 0.4,
                    break_even_units: 40,
                    roi: 2.1,
                    margin_health: MarginHealth::Critical,
                }),
            ),
        );
        results.insert(
            AuditDimension::Supplier,
            with_metrics(
                AuditDimension::Supplier,
                DimensionMetrics::Supplier(SupplierMetrics {
                    reliability_score: Some(60.0),
                    quality_score: None,
                    communication_score: None,
                    risk_level: SupplierRiskLevel::High,
                    diversification: DiversificationStatus::SingleSource,
                }),
            ),
        );
        results.insert(
            AuditDimension::Feed,
            with_metrics(
                AuditDimension::Feed,
                DimensionMetrics::Feed(FeedMetrics {
                    google_ready_score: 55,
                    meta_ready_score: 64,
                    amazon_ready_score: 70,
                    completeness_score: 58,
                    missing_required_fields: vec!["price".into(), "availability".into()],
                    missing_recommended_fields: vec!["gtin".into()],
                }),
            ),
        );
        results.insert(
            AuditDimension::Market,
            with_metrics(
                AuditDimension::Market,
                DimensionMetrics::Market(MarketMetrics {
                    price_competitiveness: Some(40.0),
                    demand_score: Some(30.0),
                    opportunity_score: Some(33.0),
                    competition_index: Some(25.0),
                    market_position: Some(MarketPosition::Follower),
                }),
            ),
        );

        let summary = summarize(&results);

        assert!(summary.strengths.is_empty());
        assert_eq!(
            summary.weaknesses,
            vec![
                "Insufficient margin",
                "Dependence on a single supplier",
                "Missing feed fields: price, availability",
            ]
        );
        assert_eq!(
            summary.threats,
            vec!["Risk of selling at a loss", "Strong competitive pressure"]
        );
        assert_eq!(summary.opportunities.len(), 2);
    }

    #[test]
    fn dimensions_without_metrics_are_silent() {
        let mut results = BTreeMap::new();
        let mut empty = with_metrics(
            AuditDimension::Market,
            DimensionMetrics::Market(MarketMetrics {
                price_competitiveness: None,
                demand_score: None,
                opportunity_score: None,
                competition_index: None,
                market_position: None,
            }),
        );
        results.insert(AuditDimension::Market, empty.clone());
        assert_eq!(summarize(&results), AuditSummary::default());

        empty.metrics = None;
        results.insert(AuditDimension::Market, empty);
        assert_eq!(summarize(&results), AuditSummary::default());
    }
}
