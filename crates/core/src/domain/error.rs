// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid experience level: {0}")]
    InvalidExperienceLevel(String),

    #[error("Invalid salary range: min {min} > max {max}")]
    InvalidSalaryRange { min: i64, max: i64 },

    #[error("Negative salary bound: {0}")]
    NegativeSalary(i64),

    #[error("Invalid match weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid source config '{source_name}': {reason}")]
    InvalidSourceConfig { source_name: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
