//! Product audit engine.
//!
//! A product is scored on four independent dimensions (profitability,
//! supplier, feed, market). Each dimension runs a fixed catalogue of checks
//! against its optional input bundle; the dimension results are then rolled up
//! into a weighted overall score, a ranked list of priority actions and a
//! strengths/weaknesses summary.
//!
//! The engine is a pure function of `(input, config)`: no clock, no I/O and no
//! randomness, so identical calls always produce identical results.

pub mod aggregate;
pub mod checks;
pub mod config;
pub mod feed;
mod lenient;
pub mod market;
pub mod profitability;
pub mod summary;
pub mod supplier;
pub mod types;

use tracing::{debug, warn};

use crate::errors::ConfigurationError;

pub use aggregate::{aggregate, not_applicable_result, INSUFFICIENT_DATA_ACTION};
pub use checks::{
    definitions, evaluate_dimension, find_check, Check, CheckDefinition, DimensionAuditor,
    Measurement,
};
pub use config::{
    DimensionWeights, ProductAuditEngineConfig, DEFAULT_AUDIT_ENGINE_CONFIG, WEIGHT_SUM_TOLERANCE,
};
pub use feed::{audit_feed, FeedAuditor};
pub use market::{audit_market, MarketAuditor};
pub use profitability::{audit_profitability, ProfitabilityAuditor};
pub use summary::summarize;
pub use supplier::{audit_supplier, SupplierAuditor};
pub use types::*;

pub trait AuditEngine: Send + Sync {
    fn audit(&self, input: &ProductAuditInput) -> ProductAuditEngineResult;
}

/// Engine bound to a configuration that has already been validated.
#[derive(Clone, Debug)]
pub struct DeterministicAuditEngine {
    config: ProductAuditEngineConfig,
}

impl DeterministicAuditEngine {
    pub fn new(config: ProductAuditEngineConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProductAuditEngineConfig {
        &self.config
    }
}

impl Default for DeterministicAuditEngine {
    fn default() -> Self {
        Self { config: ProductAuditEngineConfig::default() }
    }
}

impl AuditEngine for DeterministicAuditEngine {
    fn audit(&self, input: &ProductAuditInput) -> ProductAuditEngineResult {
        evaluate(input, &self.config)
    }
}

/// Audits one product.
///
/// `None` uses [`DEFAULT_AUDIT_ENGINE_CONFIG`]. An invalid configuration is
/// rejected before any dimension is evaluated; data problems never error and
/// surface as not-applicable checks instead.
pub fn run_product_audit(
    input: &ProductAuditInput,
    config: Option<&ProductAuditEngineConfig>,
) -> Result<ProductAuditEngineResult, ConfigurationError> {
    let config = config.unwrap_or(&DEFAULT_AUDIT_ENGINE_CONFIG);
    if let Err(error) = config.validate() {
        warn!(
            event_name = "audit.engine.config_rejected",
            error = %error,
            "audit engine configuration rejected"
        );
        return Err(error);
    }

    Ok(evaluate(input, config))
}

/// Evaluates a single dimension of `input` without aggregation.
pub fn audit_dimension(
    dimension: AuditDimension,
    input: &ProductAuditInput,
    config: &ProductAuditEngineConfig,
) -> DimensionAuditResult {
    match dimension {
        AuditDimension::Profitability => {
            evaluate_dimension::<ProfitabilityAuditor>(input.profitability.as_ref(), config)
        }
        AuditDimension::Supplier => {
            evaluate_dimension::<SupplierAuditor>(input.supplier.as_ref(), config)
        }
        AuditDimension::Feed => evaluate_dimension::<FeedAuditor>(input.feed.as_ref(), config),
        AuditDimension::Market => evaluate_dimension::<MarketAuditor>(input.market.as_ref(), config),
    }
}

/// Stable digest of an audit request, usable as a cache key by callers.
pub fn audit_cache_key(
    input: &ProductAuditInput,
    config: &ProductAuditEngineConfig,
) -> Result<String, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    serde_json::to_writer(&mut hasher, &(input, config))?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn evaluate(input: &ProductAuditInput, config: &ProductAuditEngineConfig) -> ProductAuditEngineResult {
    let results =
        AuditDimension::ALL.iter().map(|dimension| audit_dimension(*dimension, input, config)).collect();
    let result = aggregate(results, config);

    debug!(
        event_name = "audit.engine.completed",
        overall_score = result.overall_score,
        overall_status = ?result.overall_status,
        priority_actions = result.priority_actions.len(),
        "product audit completed"
    );
    result
}
