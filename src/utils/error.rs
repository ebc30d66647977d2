//! Unified Error Handling
//!
//! Application-level error taxonomy for embedders that want a single error
//! type at the top of the stack:
//! - [`AppError`] - application error enum
//! - [`AppResult`] - result alias
//!
//! Layer-specific errors ([`crate::db::repository::RepoError`],
//! [`crate::engine::AllocationError`]) convert into [`AppError`] via `From`.

use tracing::error;

/// Application error enum
///
/// | Category | Meaning |
/// |----------|---------|
/// | Business | resource missing, duplicate, validation, rule violation |
/// | System   | database failure, internal failure |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== System Errors ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for application-level operations
pub type AppResult<T> = Result<T, AppError>;

impl From<crate::db::repository::RepoError> for AppError {
    fn from(err: crate::db::repository::RepoError) -> Self {
        use crate::db::repository::RepoError;
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                AppError::Database(msg)
            }
        }
    }
}

impl From<crate::engine::AllocationError> for AppError {
    fn from(err: crate::engine::AllocationError) -> Self {
        use crate::engine::AllocationError;
        match err {
            AllocationError::CustomerNotFound(id) => {
                AppError::NotFound(format!("Customer {id} not found"))
            }
            AllocationError::CampaignNotFound(id) => {
                AppError::NotFound(format!("Campaign {id} not found"))
            }
            AllocationError::Ineligible(reason) => {
                AppError::BusinessRule(format!("Customer is not eligible: {reason}"))
            }
            AllocationError::ZeroDiscount => {
                AppError::BusinessRule("No discount available for this transaction".to_string())
            }
            AllocationError::BudgetRaceLost => {
                AppError::Conflict("Campaign budget is being consumed concurrently".to_string())
            }
            AllocationError::Repo(repo) => repo.into(),
        }
    }
}
