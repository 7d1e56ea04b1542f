use thiserror::Error;

use crate::audit::AuditDimension;

/// Structurally invalid engine configuration. Raised before any evaluation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("weight for dimension `{dimension}` must be a finite non-negative number, got {value}")]
    InvalidWeight { dimension: AuditDimension, value: f64 },
    #[error("dimension weights must sum to 1.0 (tolerance {tolerance}), got {sum}")]
    WeightSum { sum: f64, tolerance: f64 },
    #[error("invalid thresholds for `{scope}`: {reason}")]
    InvalidThresholds { scope: String, reason: String },
    #[error("threshold override references unknown check `{0}`")]
    UnknownCheck(String),
    #[error("target margin must be a finite percentage in (0, 100], got {0}")]
    InvalidTargetMargin(f64),
    #[error("max_priority_actions must be greater than zero when set")]
    InvalidActionLimit,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("settings failure: {0}")]
    Settings(String),
    #[error("invalid audit input: {0}")]
    Input(String),
    #[error("batch failure: {0}")]
    Batch(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The audit request could not be processed. Check the product data and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The audit did not finish in time. Please retry shortly."
            }
            Self::Internal { .. } => "The audit engine is misconfigured.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Input(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Batch(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Settings(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
