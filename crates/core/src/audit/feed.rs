//! Feed dimension: listing completeness for shopping channels.
//!
//! Unlike the other dimensions, an absent field inside a present feed bundle
//! is itself the defect being measured (a listing without a title is a failed
//! title check). Only a missing bundle makes feed checks not applicable.

use super::checks::{
    amount, evaluate_dimension, present, Check, CheckDefinition, DimensionAuditor, Measurement,
};
use super::config::ProductAuditEngineConfig;
use super::types::{
    AuditDimension, AuditEffort, AuditImpact, DimensionAuditResult, DimensionMetrics,
    FeedAuditData, FeedMetrics, ScoreThresholds,
};

pub struct FeedAuditor;

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 150;
const DESCRIPTION_TARGET_CHARS: usize = 150;

/// Field presence per channel requirement, in feed field order.
fn field_presence(data: &FeedAuditData) -> [(&'static str, bool, bool); 12] {
    let text = |value: &Option<String>| present(value.as_ref()).is_some();
    // (field, present, required)
    [
        ("title", text(&data.title), true),
        ("description", text(&data.description), true),
        ("image_url", text(&data.image_url), true),
        ("price", valid_price(data).is_some(), true),
        ("availability", text(&data.availability), true),
        ("gtin", text(&data.gtin), false),
        ("mpn", text(&data.mpn), false),
        ("brand", text(&data.brand), false),
        ("category", text(&data.category), false),
        ("condition", text(&data.condition), false),
        ("shipping_weight", amount(data.shipping_weight).is_some(), false),
        (
            "additional_images",
            data.additional_images.as_ref().is_some_and(|images| !images.is_empty()),
            false,
        ),
    ]
}

fn valid_price(data: &FeedAuditData) -> Option<f64> {
    amount(data.price).filter(|price| *price > 0.0)
}

/// GTIN-8/12/13/14 with a valid mod-10 check digit.
fn is_valid_gtin(gtin: &str) -> bool {
    let digits: Vec<u32> = gtin.chars().filter_map(|ch| ch.to_digit(10)).collect();
    if digits.len() != gtin.len() || ![8, 12, 13, 14].contains(&digits.len()) {
        return false;
    }

    let (check_digit, body) = match digits.split_last() {
        Some(split) => split,
        None => return false,
    };
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(index, digit)| if index % 2 == 0 { digit * 3 } else { *digit })
        .sum();
    (10 - sum % 10) % 10 == *check_digit
}

fn title(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let length = present(data.title.as_ref()).map(|title| title.chars().count()).unwrap_or(0);
    let score = match length {
        0 => 0.0,
        l if l < TITLE_MIN_CHARS => l as f64 * 2.0,
        l if l <= TITLE_MAX_CHARS => 100.0,
        _ => 80.0,
    };
    let value = if length == 0 { "missing".to_string() } else { format!("{length} chars") };
    let advice = if length > TITLE_MAX_CHARS {
        "Shorten the title to 150 characters or fewer; channels truncate longer titles"
    } else {
        "Enrich the title with relevant keywords (30-150 characters)"
    };
    Some(Measurement::new(score, value, advice))
}

fn description(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let length =
        present(data.description.as_ref()).map(|text| text.chars().count()).unwrap_or(0);
    let score = length as f64 * 100.0 / DESCRIPTION_TARGET_CHARS as f64;
    let value = if length == 0 { "missing".to_string() } else { format!("{length} chars") };
    Some(Measurement::new(
        score,
        value,
        "Write a detailed description of at least 150 characters",
    ))
}

fn image(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = if present(data.image_url.as_ref()).is_some() {
        Measurement::new(100.0, "present", "")
    } else {
        Measurement::new(0.0, "missing", "Add a high-resolution main image (at least 800x800 px)")
    };
    Some(measurement)
}

fn additional_images(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let count = data
        .additional_images
        .as_ref()
        .map(|images| images.iter().filter(|url| !url.trim().is_empty()).count())
        .unwrap_or(0);
    Some(Measurement::new(
        count as f64 * 25.0,
        format!("{count} images"),
        "Add more images showing the product from different angles",
    ))
}

fn price(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match valid_price(data) {
        Some(price) => Measurement::new(100.0, format!("{price:.2}"), ""),
        None => Measurement::new(
            25.0,
            "missing",
            "Set an explicit feed price so channels do not fall back to the store price",
        ),
    };
    Some(measurement)
}

fn gtin(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match present(data.gtin.as_ref()) {
        Some(gtin) if is_valid_gtin(gtin) => Measurement::new(100.0, gtin, ""),
        Some(gtin) => Measurement::new(
            10.0,
            gtin,
            "Fix the GTIN: its check digit does not match, so channels will reject it",
        ),
        None => Measurement::new(
            40.0,
            "missing",
            "Add the GTIN to improve Google Shopping visibility",
        ),
    };
    Some(measurement)
}

fn brand(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match present(data.brand.as_ref()) {
        Some(brand) => Measurement::new(100.0, brand, ""),
        None => Measurement::new(50.0, "missing", "Fill in the brand for marketplace filtering"),
    };
    Some(measurement)
}

fn category(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match present(data.category.as_ref()) {
        Some(category) => Measurement::new(100.0, category, ""),
        None => Measurement::new(40.0, "missing", "Map the product to a Google product category"),
    };
    Some(measurement)
}

fn availability(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<Measurement> {
    let measurement = match present(data.availability.as_ref()) {
        Some(availability) => Measurement::new(100.0, availability, ""),
        None => Measurement::new(
            25.0,
            "missing",
            "State availability (in_stock / out_of_stock) in the feed",
        ),
    };
    Some(measurement)
}

fn readiness(missing_required: usize, missing_recommended: usize, weights: (i32, i32)) -> u8 {
    let score = 100 - missing_required as i32 * weights.0 - missing_recommended as i32 * weights.1;
    score.clamp(0, 100) as u8
}

impl DimensionAuditor for FeedAuditor {
    type Data = FeedAuditData;

    const DIMENSION: AuditDimension = AuditDimension::Feed;
    const CHECKS: &'static [Check<FeedAuditData>] = &[
        Check {
            definition: CheckDefinition {
                id: "feed-title",
                name: "Product title",
                description: "Title length suited to channel feeds",
                expected_value: "30-150 characters",
                impact: AuditImpact::High,
                effort: AuditEffort::Low,
                weight: 2.0,
                thresholds: ScoreThresholds::new(100.0, 40.0),
            },
            measure: title,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-description",
                name: "Description",
                description: "Detailed product description",
                expected_value: ">= 150 characters",
                impact: AuditImpact::High,
                effort: AuditEffort::Medium,
                weight: 2.0,
                thresholds: ScoreThresholds::new(100.0, 33.0),
            },
            measure: description,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-image",
                name: "Main image",
                description: "Primary image used by every channel",
                expected_value: "required",
                impact: AuditImpact::High,
                effort: AuditEffort::Low,
                weight: 2.0,
                thresholds: ScoreThresholds::new(100.0, 50.0),
            },
            measure: image,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-additional-images",
                name: "Additional images",
                description: "Gallery beyond the main image",
                expected_value: ">= 3 images",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(75.0, 25.0),
            },
            measure: additional_images,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-price",
                name: "Feed price",
                description: "Explicit positive price in the feed",
                expected_value: "> 0",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 2.0,
                thresholds: ScoreThresholds::new(80.0, 25.0),
            },
            measure: price,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-gtin",
                name: "GTIN / EAN",
                description: "International barcode with a valid check digit",
                expected_value: "valid GTIN-8/12/13/14",
                impact: AuditImpact::High,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 40.0),
            },
            measure: gtin,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-brand",
                name: "Brand",
                description: "Brand name used for marketplace filters",
                expected_value: "recommended",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 50.0),
            },
            measure: brand,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-category",
                name: "Google category",
                description: "Mapping to the Google product taxonomy",
                expected_value: "required",
                impact: AuditImpact::High,
                effort: AuditEffort::Low,
                weight: 1.0,
                thresholds: ScoreThresholds::new(80.0, 40.0),
            },
            measure: category,
        },
        Check {
            definition: CheckDefinition {
                id: "feed-availability",
                name: "Availability",
                description: "Stock status exposed to channels",
                expected_value: "in_stock / out_of_stock",
                impact: AuditImpact::Medium,
                effort: AuditEffort::Low,
                weight: 2.0,
                thresholds: ScoreThresholds::new(80.0, 25.0),
            },
            measure: availability,
        },
    ];

    fn metrics(data: &FeedAuditData, _: &ProductAuditEngineConfig) -> Option<DimensionMetrics> {
        let fields = field_presence(data);
        let missing = |required: bool| -> Vec<String> {
            fields
                .iter()
                .filter(|(name, present, is_required)| {
                    *is_required == required && !present && *name != "additional_images"
                })
                .map(|(name, _, _)| name.to_string())
                .collect()
        };
        let missing_required = missing(true);
        let missing_recommended = missing(false);
        let present_count = fields.iter().filter(|(_, present, _)| *present).count();

        Some(DimensionMetrics::Feed(FeedMetrics {
            google_ready_score: readiness(missing_required.len(), missing_recommended.len(), (15, 5)),
            meta_ready_score: readiness(missing_required.len(), missing_recommended.len(), (12, 3)),
            amazon_ready_score: readiness(missing_required.len(), missing_recommended.len(), (10, 8)),
            completeness_score: (present_count * 100 / fields.len()) as u8,
            missing_required_fields: missing_required,
            missing_recommended_fields: missing_recommended,
        }))
    }
}

pub fn audit_feed(data: &FeedAuditData, config: &ProductAuditEngineConfig) -> DimensionAuditResult {
    evaluate_dimension::<FeedAuditor>(Some(data), config)
}
