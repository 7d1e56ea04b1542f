pub mod audit;
pub mod batch;
pub mod config;
pub mod errors;

pub use audit::{
    audit_cache_key, audit_dimension, run_product_audit, AuditCheck, AuditDimension, AuditEffort,
    AuditEngine, AuditImpact, AuditStatus, AuditSummary, DeterministicAuditEngine,
    DimensionAuditResult, PriorityAction, ProductAuditEngineConfig, ProductAuditEngineResult,
    ProductAuditInput, DEFAULT_AUDIT_ENGINE_CONFIG,
};
pub use batch::{
    BatchAuditor, BatchConfig, BatchOutcome, BatchReport, ProductAuditReport, ProductAuditRequest,
    ProductRef,
};
pub use errors::{ApplicationError, ConfigurationError, InterfaceError};
