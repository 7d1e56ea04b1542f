//! Profitability dimension: margins, ROI, returns and per-unit profit.

use super::checks::{
    amount, evaluate_dimension, percentage, round_to, Check, CheckDefinition, DimensionAuditor,
    Measurement,
};
use super::config::ProductAuditEngineConfig;
use super::types::{
    AuditDimension, AuditEffort, AuditImpact, DimensionAuditResult, DimensionMetrics,
    MarginHealth, ProfitabilityAuditData, ProfitabilityMetrics, ScoreThresholds,
};

pub struct ProfitabilityAuditor;

/// Unit economics derived from a bundle that has both a selling and a cost price.
#[derive(Debug, Clone, Copy, PartialEq)]
struct UnitEconomics {
    gross_margin: f64,
    net_margin: f64,
    profit_per_unit: f64,
    total_costs: f64,
    roi: f64,
}

impl UnitEconomics {
    fn from_data(data: &ProfitabilityAuditData) -> Option<Self> {
        let sell_price = amount(data.sell_price).filter(|price| *price > 0.0)?;
        let cost_price = amount(data.cost_price)?;
        let shipping = amount(data.shipping_cost).unwrap_or(0.0);
        let fees = amount(data.platform_fees).unwrap_or(0.0);
        let advertising = amount(data.advertising_cost).unwrap_or(0.0);
        let return_rate = percentage(data.return_rate).unwrap_or(0.0);

        let gross_profit = sell_price - cost_price - shipping;
        let return_loss = sell_price * return_rate / 100.0;
        let net_profit = gross_profit - fees - advertising - return_loss;
        let total_costs = cost_price + shipping + fees + advertising;
        let roi = if total_costs > 0.0 { net_profit / total_costs * 100.0 } else { 0.0 };

        Some(Self {
            gross_margin: gross_profit / sell_price * 100.0,
            net_margin: net_profit / sell_price * 100.0,
            profit_per_unit: net_profit,
            total_costs,
            roi,
        })
    }

    fn break_even_units(&self) -> u32 {
        if self.total_costs > 0.0 && self.profit_per_unit > 0.0 {
            (self.total_costs / self.profit_per_unit).ceil() as u32
        } else {
            0
        }
    }
}

fn margin_health(net_margin: f64, target_margin: f64) -> MarginHealth {
    if net_margin >= target_margin {
        MarginHealth::Excellent
    } else if net_margin >= target_margin * 0.7 {
        MarginHealth::Good
    } else if net_margin >= target_margin * 0.4 {
        MarginHealth::Warning
    } else {
        MarginHealth::Critical
    }
}

fn gross_margin(data: &ProfitabilityAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let economics = UnitEconomics::from_data(data)?;
    Some(Measurement::new(
        economics.gross_margin * 2.0,
        format!("{:.1}%", economics.gross_margin),
        "Negotiate better supplier prices or raise the selling price",
    ))
}

fn net_margin(
    data: &ProfitabilityAuditData,
    config: &ProductAuditEngineConfig,
) -> Option<Measurement> {
    let economics = UnitEconomics::from_data(data)?;
    Some(
        Measurement::new(
            economics.net_margin / config.target_margin * 100.0,
            format!("{:.1}%", economics.net_margin),
            "Cut advertising spend or platform fees to lift the net margin",
        )
        .expecting(format!(">= {}%", config.target_margin)),
    )
}

fn roi(data: &ProfitabilityAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let economics = UnitEconomics::from_data(data)?;
    Some(Measurement::new(
        economics.roi,
        format!("{:.1}%", economics.roi),
        "Rework the cost structure to improve the return per unit sold",
    ))
}

fn return_rate(data: &ProfitabilityAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let rate = percentage(data.return_rate)?;
    Some(Measurement::new(
        100.0 - rate * 5.0,
        format!("{rate}%"),
        "Improve descriptions and photos to reduce returns",
    ))
}

fn profit_per_unit(
    data: &ProfitabilityAuditData,
    _: &ProductAuditEngineConfig,
) -> Option<Measurement> {
    let economics = UnitEconomics::from_data(data)?;
    Some(Measurement::new(
        economics.profit_per_unit * 10.0,
        format!("{:.2}", economics.profit_per_unit),
        "Each sale earns very little; revisit pricing or sell it in bundles",
    ))
}

impl DimensionAuditor for ProfitabilityAuditor {
    type Data = ProfitabilityAuditData;

    const DIMENSION: AuditDimension = AuditDimension::Profitability;
    const CHECKS: &'static [Check<ProfitabilityAuditData>] = &[
        Check {
            definition: CheckDefinition {
                id: "gross-margin",
                name: "Gross margin",
                description: "Margin before platform fees and advertising",
                expected_value: ">= 40%",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 50.0),
            },
            measure: gross_margin,
        },
        Check {
            definition: CheckDefinition {
                id: "net-margin",
                name: "Net margin",
                description: "Margin after every fee, advertising and expected returns",
                expected_value: ">= target margin",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(100.0, 60.0),
            },
            measure: net_margin,
        },
        Check {
            definition: CheckDefinition {
                id: "roi",
                name: "Return on investment",
                description: "Net profit relative to the cost of one unit",
                expected_value: ">= 50%",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(50.0, 20.0),
            },
            measure: roi,
        },
        Check {
            definition: CheckDefinition {
                id: "return-rate",
                name: "Return rate",
                description: "Share of orders sent back by customers",
                expected_value: "<= 5%",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(75.0, 25.0),
            },
            measure: return_rate,
        },
        Check {
            definition: CheckDefinition {
                id: "profit-per-unit",
                name: "Profit per unit",
                description: "Net profit earned on each unit sold",
                expected_value: ">= 5.00",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(50.0, 20.0),
            },
            measure: profit_per_unit,
        },
    ];

    fn metrics(
        data: &ProfitabilityAuditData,
        config: &ProductAuditEngineConfig,
    ) -> Option<DimensionMetrics> {
        let economics = UnitEconomics::from_data(data)?;
        Some(DimensionMetrics::Profitability(ProfitabilityMetrics {
            gross_margin: round_to(economics.gross_margin, 1),
            net_margin: round_to(economics.net_margin, 1),
            profit_per_unit: round_to(economics.profit_per_unit, 2),
            break_even_units: economics.break_even_units(),
            roi: round_to(economics.roi, 1),
            margin_health: margin_health(economics.net_margin, config.target_margin),
        }))
    }
}

pub fn audit_profitability(
    data: &ProfitabilityAuditData,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    evaluate_dimension::<ProfitabilityAuditor>(Some(data), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::AuditStatus;
    use crate::audit::DEFAULT_AUDIT_ENGINE_CONFIG;

    fn healthy() -> ProfitabilityAuditData {
        ProfitabilityAuditData {
            sell_price: Some(100.0),
            cost_price: Some(55.0),
            shipping_cost: Some(0.0),
            platform_fees: Some(0.0),
            advertising_cost: Some(0.0),
            return_rate: Some(2.0),
        }
    }

    fn status_of(result: &DimensionAuditResult, id: &str) -> AuditStatus {
        result.checks.iter().find(|check| check.id == id).map(|check| check.status).unwrap()
    }

    #[test]
    fn healthy_margin_passes_every_check() {
        let result = audit_profitability(&healthy(), &DEFAULT_AUDIT_ENGINE_CONFIG);

        assert_eq!(status_of(&result, "gross-margin"), AuditStatus::Passed);
        assert_eq!(status_of(&result, "net-margin"), AuditStatus::Passed);
        assert_eq!(status_of(&result, "profit-per-unit"), AuditStatus::Passed);
        assert!(result.recommendations.is_empty());
        assert_eq!(result.status, AuditStatus::Passed);

        let Some(DimensionMetrics::Profitability(metrics)) = result.metrics else {
            panic!("profitability metrics expected");
        };
        assert_eq!(metrics.gross_margin, 45.0);
        assert_eq!(metrics.net_margin, 43.0);
        assert_eq!(metrics.margin_health, MarginHealth::Excellent);
        assert_eq!(metrics.break_even_units, 2);
    }

    #[test]
    fn thin_margin_fails_with_recommendations_in_check_order() {
        let data = ProfitabilityAuditData {
            sell_price: Some(20.0),
            cost_price: Some(14.0),
            shipping_cost: Some(3.0),
            platform_fees: Some(1.0),
            advertising_cost: Some(1.5),
            return_rate: Some(12.0),
        };
        let result = audit_profitability(&data, &DEFAULT_AUDIT_ENGINE_CONFIG);

        assert_eq!(status_of(&result, "gross-margin"), AuditStatus::Failed);
        assert_eq!(status_of(&result, "net-margin"), AuditStatus::Failed);
        assert_eq!(status_of(&result, "return-rate"), AuditStatus::Warning);
        assert_eq!(result.status, AuditStatus::Failed);
        assert_eq!(result.recommendations.len(), 5);
        assert_eq!(
            result.recommendations[0],
            "Negotiate better supplier prices or raise the selling price"
        );
    }

    #[test]
    fn missing_prices_make_margin_checks_not_applicable() {
        let data = ProfitabilityAuditData { return_rate: Some(3.0), ..Default::default() };
        let result = audit_profitability(&data, &DEFAULT_AUDIT_ENGINE_CONFIG);

        let applicable: Vec<_> = result
            .checks
            .iter()
            .filter(|check| check.status != AuditStatus::NotApplicable)
            .map(|check| check.id.as_str())
            .collect();
        assert_eq!(applicable, vec!["return-rate"]);
        assert_eq!(result.score, Some(85.0));
        assert!(result.metrics.is_none());
    }

    #[test]
    fn nan_and_negative_prices_are_treated_as_missing() {
        let data = ProfitabilityAuditData {
            sell_price: Some(f64::NAN),
            cost_price: Some(-4.0),
            ..Default::default()
        };
        let result = audit_profitability(&data, &DEFAULT_AUDIT_ENGINE_CONFIG);

        assert!(result.checks.iter().all(|check| check.status == AuditStatus::NotApplicable));
        assert_eq!(result.score, None);
        assert_eq!(result.status, AuditStatus::NotApplicable);
    }

    #[test]
    fn net_margin_expectation_follows_target_margin() {
        let config = ProductAuditEngineConfig { target_margin: 20.0, ..Default::default() };
        let result = audit_profitability(&healthy(), &config);
        let check = result.checks.iter().find(|check| check.id == "net-margin").unwrap();
        assert_eq!(check.expected_value, ">= 20%");
        assert_eq!(check.score, 100.0);
    }
}
