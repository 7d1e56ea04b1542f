//! Types for the product audit engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classification of a check or dimension score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Passed,
    Warning,
    Failed,
    /// Required input was absent; carries no score.
    NotApplicable,
}

impl AuditStatus {
    pub fn needs_action(&self) -> bool {
        matches!(self, Self::Warning | Self::Failed)
    }
}

/// Static impact of a check type, primary sort key for priority actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditImpact {
    High,
    Medium,
    Low,
}

impl AuditImpact {
    /// Higher rank sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Rough effort needed to fix a failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEffort {
    Low,
    Medium,
    High,
}

impl AuditEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// The four independent audit axes, declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDimension {
    Profitability,
    Supplier,
    Feed,
    Market,
}

impl AuditDimension {
    pub const ALL: [AuditDimension; 4] =
        [Self::Profitability, Self::Supplier, Self::Feed, Self::Market];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profitability => "profitability",
            Self::Supplier => "supplier",
            Self::Feed => "feed",
            Self::Market => "market",
        }
    }
}

impl std::fmt::Display for AuditDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/warn cutoffs on the 0-100 score scale.
///
/// `score >= pass` is passed, `warn <= score < pass` is a warning and anything
/// below `warn` fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub pass: f64,
    pub warn: f64,
}

impl ScoreThresholds {
    pub const fn new(pass: f64, warn: f64) -> Self {
        Self { pass, warn }
    }

    pub fn classify(&self, score: f64) -> AuditStatus {
        if score >= self.pass {
            AuditStatus::Passed
        } else if score >= self.warn {
            AuditStatus::Warning
        } else {
            AuditStatus::Failed
        }
    }
}

/// One atomic evaluation within a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCheck {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: AuditStatus,
    /// 0-100; always 0 when not applicable
    pub score: f64,
    pub value: String,
    pub expected_value: String,
    pub recommendation: Option<String>,
    pub impact: AuditImpact,
    pub effort: AuditEffort,
    /// Relative weight inside the dimension average
    pub weight: f64,
}

/// Rollup for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAuditResult {
    pub dimension: AuditDimension,
    /// `None` when no check had usable input. Distinct from a real score of 0.
    pub score: Option<f64>,
    pub status: AuditStatus,
    pub checks: Vec<AuditCheck>,
    pub recommendations: Vec<String>,
    /// Configured contribution to the overall score, before renormalisation
    pub weight: f64,
    pub metrics: Option<DimensionMetrics>,
}

impl DimensionAuditResult {
    pub fn has_data(&self) -> bool {
        self.score.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginHealth {
    Excellent,
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityMetrics {
    pub gross_margin: f64,
    pub net_margin: f64,
    pub profit_per_unit: f64,
    pub break_even_units: u32,
    pub roi: f64,
    pub margin_health: MarginHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversificationStatus {
    Diversified,
    SingleSource,
    NoSupplier,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierMetrics {
    pub reliability_score: Option<f64>,
    pub quality_score: Option<f64>,
    pub communication_score: Option<f64>,
    pub risk_level: SupplierRiskLevel,
    pub diversification: DiversificationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMetrics {
    pub google_ready_score: u8,
    pub meta_ready_score: u8,
    pub amazon_ready_score: u8,
    pub completeness_score: u8,
    pub missing_required_fields: Vec<String>,
    pub missing_recommended_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    Leader,
    Challenger,
    Follower,
    Niche,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub price_competitiveness: Option<f64>,
    pub demand_score: Option<f64>,
    pub opportunity_score: Option<f64>,
    pub competition_index: Option<f64>,
    pub market_position: Option<MarketPosition>,
}

/// Dimension-specific figures computed alongside the checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionMetrics {
    Profitability(ProfitabilityMetrics),
    Supplier(SupplierMetrics),
    Feed(FeedMetrics),
    Market(MarketMetrics),
}

/// A ranked, cross-dimension recommendation derived from a non-passing check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAction {
    /// `None` only for the synthetic insufficient-data action
    pub dimension: Option<AuditDimension>,
    pub check_id: String,
    pub action: String,
    pub impact: AuditImpact,
    pub effort: AuditEffort,
    pub score: f64,
    /// Overall-score points recovered if the check reached 100
    pub estimated_score_gain: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

/// Top-level output for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAuditEngineResult {
    pub overall_score: u8,
    pub overall_status: AuditStatus,
    pub dimension_results: BTreeMap<AuditDimension, DimensionAuditResult>,
    pub priority_actions: Vec<PriorityAction>,
    pub summary: AuditSummary,
}

impl ProductAuditEngineResult {
    pub fn dimension(&self, dimension: AuditDimension) -> Option<&DimensionAuditResult> {
        self.dimension_results.get(&dimension)
    }
}

// ---------------------------------------------------------------------------
// Input bundles
// ---------------------------------------------------------------------------

/// Unit economics of one product. Money fields share the store currency;
/// `return_rate` is a percentage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitabilityAuditData {
    #[serde(deserialize_with = "super::lenient::number")]
    pub sell_price: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub cost_price: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub shipping_cost: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub platform_fees: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub advertising_cost: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub return_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierAuditData {
    #[serde(deserialize_with = "super::lenient::text")]
    pub supplier_id: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub supplier_name: Option<String>,
    /// 1-5 stars; 0 means unrated
    #[serde(deserialize_with = "super::lenient::number")]
    pub supplier_rating: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub average_delivery_days: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub on_time_delivery_rate: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub defect_rate: Option<f64>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub response_time_hours: Option<f64>,
    /// Share of stock syncs where supplier stock matched the listing
    #[serde(deserialize_with = "super::lenient::number")]
    pub stock_accuracy_rate: Option<f64>,
    #[serde(deserialize_with = "super::lenient::flag")]
    pub has_backup_supplier: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedAuditData {
    #[serde(deserialize_with = "super::lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "super::lenient::text_list")]
    pub additional_images: Option<Vec<String>>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub availability: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub gtin: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub mpn: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "super::lenient::text")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "super::lenient::number")]
    pub shipping_weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    Lowest,
    BelowAverage,
    Average,
    AboveAverage,
    Highest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandTrend {
    Rising,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAuditData {
    #[serde(deserialize_with = "super::lenient::choice")]
    pub price_position: Option<PricePosition>,
    #[serde(deserialize_with = "super::lenient::choice")]
    pub demand_trend: Option<DemandTrend>,
    #[serde(deserialize_with = "super::lenient::choice")]
    pub competition_level: Option<CompetitionLevel>,
    /// 0-100 popularity index
    #[serde(deserialize_with = "super::lenient::number")]
    pub trending_score: Option<f64>,
    /// 0-100, share of the niche already covered by competing listings
    #[serde(deserialize_with = "super::lenient::number")]
    pub market_saturation: Option<f64>,
    /// Monthly searches
    #[serde(deserialize_with = "super::lenient::number")]
    pub search_volume: Option<f64>,
}

/// Raw data for one product audit. Any bundle may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductAuditInput {
    #[serde(deserialize_with = "super::lenient::choice")]
    pub profitability: Option<ProfitabilityAuditData>,
    #[serde(deserialize_with = "super::lenient::choice")]
    pub supplier: Option<SupplierAuditData>,
    #[serde(deserialize_with = "super::lenient::choice")]
    pub feed: Option<FeedAuditData>,
    #[serde(deserialize_with = "super::lenient::choice")]
    pub market: Option<MarketAuditData>,
}
