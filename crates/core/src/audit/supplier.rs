//! Supplier dimension: assignment, reliability, quality and sourcing risk.

use super::checks::{
    amount, evaluate_dimension, percentage, present, round_to, Check, CheckDefinition,
    DimensionAuditor, Measurement,
};
use super::config::ProductAuditEngineConfig;
use super::types::{
    AuditDimension, AuditEffort, AuditImpact, DimensionAuditResult, DimensionMetrics,
    DiversificationStatus, ScoreThresholds, SupplierAuditData, SupplierMetrics,
    SupplierRiskLevel,
};

pub struct SupplierAuditor;

/// Stand-in for an unmeasured reliability component when the other one is known.
const UNMEASURED_COMPONENT: f64 = 70.0;

fn supplier_label(data: &SupplierAuditData) -> Option<&str> {
    present(data.supplier_name.as_ref()).or_else(|| present(data.supplier_id.as_ref()))
}

fn rating(data: &SupplierAuditData) -> Option<f64> {
    data.supplier_rating.filter(|rating| rating.is_finite() && *rating > 0.0 && *rating <= 5.0)
}

fn delivery_score(days: f64) -> f64 {
    100.0 - (days - 3.0) * 5.0
}

fn defect_score(rate: f64) -> f64 {
    (100.0 - rate * 10.0).max(0.0)
}

fn response_score(hours: f64) -> f64 {
    (100.0 - (hours - 2.0) * 10.0).clamp(0.0, 100.0)
}

fn supplier_assigned(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match supplier_label(data) {
        Some(label) => Measurement::new(100.0, label, ""),
        None => Measurement::new(0.0, "none", "Assign a supplier to this product"),
    };
    Some(measurement)
}

fn supplier_rating(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let rating = rating(data)?;
    Some(Measurement::new(
        rating * 20.0,
        format!("{rating}/5"),
        "Consider switching to a better-rated supplier",
    ))
}

fn delivery_time(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let days = amount(data.average_delivery_days).filter(|days| *days > 0.0)?;
    Some(Measurement::new(
        delivery_score(days),
        format!("{days} days"),
        "Long delivery times hurt customer satisfaction; look for a closer warehouse",
    ))
}

fn on_time_delivery(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let rate = percentage(data.on_time_delivery_rate)?;
    Some(Measurement::new(
        rate,
        format!("{rate}%"),
        "Fulfilment is unreliable; spread orders across more suppliers",
    ))
}

fn defect_rate(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let rate = percentage(data.defect_rate)?;
    Some(Measurement::new(
        defect_score(rate),
        format!("{rate}%"),
        "Too many defective units; negotiate quality controls with the supplier",
    ))
}

fn response_time(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let hours = amount(data.response_time_hours)?;
    Some(Measurement::new(
        response_score(hours),
        format!("{hours} h"),
        "The supplier answers slowly; agree on a response-time commitment",
    ))
}

fn stock_consistency(
    data: &SupplierAuditData,
    _: &ProductAuditEngineConfig,
) -> Option<Measurement> {
    let rate = percentage(data.stock_accuracy_rate)?;
    Some(Measurement::new(
        rate,
        format!("{rate}%"),
        "Supplier stock drifts from the listing; sync inventory more often",
    ))
}

fn backup_supplier(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = if data.has_backup_supplier? {
        Measurement::new(100.0, "yes", "")
    } else {
        Measurement::new(40.0, "no", "Identify an alternative supplier to reduce stock-out risk")
    };
    Some(measurement)
}

impl DimensionAuditor for SupplierAuditor {
    type Data = SupplierAuditData;

    const DIMENSION: AuditDimension = AuditDimension::Supplier;
    const CHECKS: &'static [Check<SupplierAuditData>] = &[
        Check {
            definition: CheckDefinition {
                id: "supplier-assigned",
                name: "Supplier assigned",
                description: "Product is linked to a supplier",
                expected_value: "assigned",
                impact: AuditImpact::High,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 50.0),
            },
            measure: supplier_assigned,
        },
        Check {
            definition: CheckDefinition {
                id: "supplier-rating",
                name: "Supplier rating",
                description: "Overall rating of the supplier",
                expected_value: ">= 4/5",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 60.0),
            },
            measure: supplier_rating,
        },
        Check {
            definition: CheckDefinition {
                id: "delivery-time",
                name: "Delivery time",
                description: "Average days from order to delivery",
                expected_value: "<= 7 days",
                impact: AuditImpact::High,
                effort: AuditEffort::High,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 45.0),
            },
            measure: delivery_time,
        },
        Check {
            definition: CheckDefinition {
                id: "on-time-delivery",
                name: "On-time delivery",
                description: "Share of orders delivered within the promised window",
                expected_value: ">= 95%",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(95.0, 85.0),
            },
            measure: on_time_delivery,
        },
        Check {
            definition: CheckDefinition {
                id: "defect-rate",
                name: "Defect rate",
                description: "Share of units received damaged or faulty",
                expected_value: "<= 2%",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 50.0),
            },
            measure: defect_rate,
        },
        Check {
            definition: CheckDefinition {
                id: "response-time",
                name: "Response time",
                description: "Average hours before the supplier answers a request",
                expected_value: "<= 4 h",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 50.0),
            },
            measure: response_time,
        },
        Check {
            definition: CheckDefinition {
                id: "stock-consistency",
                name: "Stock consistency",
                description: "Share of stock syncs where supplier stock matched the listing",
                expected_value: ">= 90%",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 1.0,
                thresholds: ScoreThresholds::new(90.0, 70.0),
            },
            measure: stock_consistency,
        },
        Check {
            definition: CheckDefinition {
                id: "backup-supplier",
                name: "Backup supplier",
                description: "An alternative source exists if the main one runs out",
                expected_value: "yes",
                impact: AuditImpact::Medium,
                effort: AuditEffort::High,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 40.0),
            },
            measure: backup_supplier,
        },
    ];

    fn metrics(data: &SupplierAuditData, _: &ProductAuditEngineConfig) -> Option<DimensionMetrics> {
        let on_time = percentage(data.on_time_delivery_rate);
        let defects = percentage(data.defect_rate);

        let reliability_score = match (on_time, defects) {
            (None, None) => None,
            (on_time, defects) => Some(round_to(
                on_time.unwrap_or(UNMEASURED_COMPONENT) * 0.5
                    + defects.map(defect_score).unwrap_or(UNMEASURED_COMPONENT) * 0.5,
                0,
            )),
        };
        let quality_score = defects.map(|rate| round_to((100.0 - rate * 20.0).max(0.0), 0));
        let communication_score =
            amount(data.response_time_hours).map(|hours| round_to(response_score(hours), 0));

        let has_supplier = supplier_label(data).is_some();
        let has_backup = data.has_backup_supplier.unwrap_or(false);
        let reliable = reliability_score.unwrap_or(UNMEASURED_COMPONENT) >= 80.0;
        let risk_level = match (has_supplier, has_backup, reliable) {
            (false, _, _) => SupplierRiskLevel::Critical,
            (true, true, true) => SupplierRiskLevel::Low,
            (true, true, false) | (true, false, true) => SupplierRiskLevel::Medium,
            (true, false, false) => SupplierRiskLevel::High,
        };
        let diversification = match (has_supplier, data.has_backup_supplier) {
            (false, _) => DiversificationStatus::NoSupplier,
            (true, Some(true)) => DiversificationStatus::Diversified,
            (true, Some(false)) => DiversificationStatus::SingleSource,
            (true, None) => DiversificationStatus::Unknown,
        };

        Some(DimensionMetrics::Supplier(SupplierMetrics {
            reliability_score,
            quality_score,
            communication_score,
            risk_level,
            diversification,
        }))
    }
}

pub fn audit_supplier(
    data: &SupplierAuditData,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    evaluate_dimension::<SupplierAuditor>(Some(data), config)
}
