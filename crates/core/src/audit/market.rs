//! Market dimension: price position, demand, competition and saturation.

use super::checks::{
    amount, evaluate_dimension, percentage, round_to, Check, CheckDefinition, DimensionAuditor,
    Measurement,
};
use super::config::ProductAuditEngineConfig;
use super::types::{
    AuditDimension, AuditEffort, AuditImpact, CompetitionLevel, DemandTrend,
    DimensionAuditResult, DimensionMetrics, MarketAuditData, MarketMetrics, MarketPosition,
    PricePosition, ScoreThresholds,
};

pub struct MarketAuditor;

impl PricePosition {
    fn score(self) -> f64 {
        match self {
            Self::Lowest => 90.0,
            Self::BelowAverage => 80.0,
            Self::Average => 60.0,
            Self::AboveAverage => 40.0,
            Self::Highest => 20.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::BelowAverage => "below average",
            Self::Average => "average",
            Self::AboveAverage => "above average",
            Self::Highest => "highest",
        }
    }
}

impl DemandTrend {
    fn score(self) -> f64 {
        match self {
            Self::Rising => 100.0,
            Self::Stable => 70.0,
            Self::Declining => 30.0,
        }
    }
}

impl CompetitionLevel {
    fn score(self) -> f64 {
        match self {
            Self::Low => 95.0,
            Self::Medium => 70.0,
            Self::High => 45.0,
            Self::VeryHigh => 25.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very high",
        }
    }
}

fn search_volume_score(volume: f64) -> f64 {
    match volume {
        v if v >= 10_000.0 => 100.0,
        v if v >= 5_000.0 => 80.0,
        v if v >= 1_000.0 => 60.0,
        v if v >= 100.0 => 40.0,
        _ => 20.0,
    }
}

fn market_position(price: f64, demand: f64, saturation: Option<f64>) -> MarketPosition {
    if price >= 80.0 && demand >= 70.0 {
        MarketPosition::Leader
    } else if price >= 60.0 && demand >= 60.0 {
        MarketPosition::Challenger
    } else if saturation.is_some_and(|saturation| saturation <= 30.0) {
        MarketPosition::Niche
    } else {
        MarketPosition::Follower
    }
}

fn price_position(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let position = data.price_position?;
    Some(Measurement::new(
        position.score(),
        position.label(),
        "Your price sits above the market; consider a reduction",
    ))
}

fn demand(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let trend = data.demand_trend?;
    let value = match trend {
        DemandTrend::Rising => "rising",
        DemandTrend::Stable => "stable",
        DemandTrend::Declining => "declining",
    };
    Some(Measurement::new(
        trend.score(),
        value,
        "Demand is falling; reduce stock levels or plan promotions",
    ))
}

fn competition(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let level = data.competition_level?;
    Some(Measurement::new(
        level.score(),
        level.label(),
        "Crowded market; differentiate on service or quality",
    ))
}

fn trending(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let score = percentage(data.trending_score)?;
    Some(Measurement::new(
        score,
        format!("{score}/100"),
        "Low product popularity; invest in marketing",
    ))
}

fn saturation(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let saturation = percentage(data.market_saturation)?;
    Some(Measurement::new(
        100.0 - saturation,
        format!("{saturation}%"),
        "Saturated market; look for a niche or differentiate",
    ))
}

fn search_volume(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let volume = amount(data.search_volume)?;
    Some(Measurement::new(
        search_volume_score(volume),
        format!("{volume:.0}/month"),
        "Low search demand; work on SEO and listing keywords",
    ))
}

impl DimensionAuditor for MarketAuditor {
    type Data = MarketAuditData;

    const DIMENSION: AuditDimension = AuditDimension::Market;
    const CHECKS: &'static [Check<MarketAuditData>] = &[
        Check {
            definition: CheckDefinition {
                id: "market-price-position",
                name: "Price position",
                description: "Your price relative to the market",
                expected_value: "competitive",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 40.0),
            },
            measure: price_position,
        },
        Check {
            definition: CheckDefinition {
                id: "market-demand",
                name: "Demand trend",
                description: "Direction of demand for the product",
                expected_value: "rising or stable",
                impact: AuditImpact::High,
                effort: AuditEffort::High,
                weight: 1.0,
                thresholds: ScoreThresholds::new(70.0, 30.0),
            },
            measure: demand,
        },
        Check {
            definition: CheckDefinition {
                id: "market-competition",
                name: "Competition level",
                description: "Intensity of competing offers",
                expected_value: "low to medium",
                impact: AuditImpact::Medium,
                effort: AuditEffort::High,
                weight: 1.0,
                thresholds: ScoreThresholds::new(70.0, 45.0),
            },
            measure: competition,
        },
        Check {
            definition: CheckDefinition {
                id: "market-trending",
                name: "Trending score",
                description: "Current popularity of the product",
                expected_value: ">= 70",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(70.0, 40.0),
            },
            measure: trending,
        },
        Check {
            definition: CheckDefinition {
                id: "market-saturation",
                name: "Market saturation",
                description: "How saturated the market already is",
                expected_value: "<= 40%",
                impact: AuditImpact::High,
                effort: AuditEffort::High,
                weight: 1.0,
                thresholds: ScoreThresholds::new(60.0, 30.0),
            },
            measure: saturation,
        },
        Check {
            definition: CheckDefinition {
                id: "market-search-volume",
                name: "Search volume",
                description: "Monthly searches for the product",
                expected_value: ">= 1000/month",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(60.0, 40.0),
            },
            measure: search_volume,
        },
    ];

    fn metrics(data: &MarketAuditData, _: &ProductAuditEngineConfig) -> Option<DimensionMetrics> {
        let price = data.price_position.map(PricePosition::score);
        let demand = data.demand_trend.map(DemandTrend::score);
        let saturation = percentage(data.market_saturation);

        let opportunity_score = match (price, demand, saturation) {
            (Some(price), Some(demand), Some(saturation)) => {
                Some(round_to((price + demand + (100.0 - saturation)) / 3.0, 0))
            }
            _ => None,
        };
        let market_position = match (price, demand) {
            (Some(price), Some(demand)) => Some(market_position(price, demand, saturation)),
            _ => None,
        };

        Some(DimensionMetrics::Market(MarketMetrics {
            price_competitiveness: price,
            demand_score: demand,
            opportunity_score,
            competition_index: data.competition_level.map(CompetitionLevel::score),
            market_position,
        }))
    }
}

pub fn audit_market(
    data: &MarketAuditData,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    evaluate_dimension::<MarketAuditor>(Some(data), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::AuditStatus;
    use crate::audit::DEFAULT_AUDIT_ENGINE_CONFIG;

    fn crowded() -> MarketAuditData {
        MarketAuditData {
            price_position: Some(PricePosition::Lowest),
            demand_trend: Some(DemandTrend::Rising),
            competition_level: Some(CompetitionLevel::Low),
            trending_score: Some(80.0),
            market_saturation: Some(90.0),
            search_volume: None,
        }
    }

    fn check<'a>(result: &'a DimensionAuditResult, id: &str) -> &'a crate::audit::AuditCheck {
        result.checks.iter().find(|check| check.id == id).unwrap()
    }

    #[test]
    fn saturated_market_fails_saturation_with_high_impact() {
        let result = audit_market(&crowded(), &DEFAULT_AUDIT_ENGINE_CONFIG);
        let saturation = check(&result, "market-saturation");

        assert_eq!(saturation.score, 10.0);
        assert_eq!(saturation.status, AuditStatus::Failed);
        assert_eq!(saturation.impact, AuditImpact::High);
        assert_eq!(check(&result, "market-search-volume").status, AuditStatus::NotApplicable);
        // (90 + 100 + 95 + 80 + 10) / 5
        assert_eq!(result.score, Some(75.0));
        assert_eq!(result.status, AuditStatus::Warning);
    }

    #[test]
    fn metrics_place_cheap_rising_product_as_leader() {
        let result = audit_market(&crowded(), &DEFAULT_AUDIT_ENGINE_CONFIG);
        let Some(DimensionMetrics::Market(metrics)) = result.metrics else {
            panic!("market metrics expected");
        };

        assert_eq!(metrics.market_position, Some(MarketPosition::Leader));
        // (90 + 100 + 10) / 3
        assert_eq!(metrics.opportunity_score, Some(67.0));
        assert_eq!(metrics.competition_index, Some(95.0));
    }

    #[test]
    fn expensive_product_in_quiet_market_is_a_niche() {
        let data = MarketAuditData {
            price_position: Some(PricePosition::Highest),
            demand_trend: Some(DemandTrend::Stable),
            market_saturation: Some(20.0),
            ..Default::default()
        };
        let result = audit_market(&data, &DEFAULT_AUDIT_ENGINE_CONFIG);

        assert_eq!(check(&result, "market-price-position").status, AuditStatus::Failed);
        let Some(DimensionMetrics::Market(metrics)) = result.metrics else {
            panic!("market metrics expected");
        };
        assert_eq!(metrics.market_position, Some(MarketPosition::Niche));
    }

    #[test]
    fn search_volume_tiers() {
        assert_eq!(search_volume_score(12_000.0), 100.0);
        assert_eq!(search_volume_score(5_000.0), 80.0);
        assert_eq!(search_volume_score(999.0), 40.0);
        assert_eq!(search_volume_score(0.0), 20.0);
    }

    #[test]
    fn out_of_range_scores_are_not_applicable() {
        let data = MarketAuditData {
            trending_score: Some(140.0),
            market_saturation: Some(f64::NAN),
            ..Default::default()
        };
        let result = audit_market(&data, &DEFAULT_AUDIT_ENGINE_CONFIG);

        assert!(result.checks.iter().all(|check| check.status == AuditStatus::NotApplicable));
        assert_eq!(result.score, None);
        let Some(DimensionMetrics::Market(metrics)) = result.metrics else {
            panic!("market metrics expected");
        };
        assert_eq!(metrics.market_position, None);
    }
}
