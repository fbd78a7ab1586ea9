//! Billing error types

use rollcall_shared::SubscriptionStatus;

pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Malformed or missing input. `field` uses the API (camelCase) name.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Cannot move subscription from {from} to {to}")]
    InvalidTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl BillingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable error code surfaced to API clients
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::Validation { .. } | BillingError::InvalidTransition { .. } => {
                "VALIDATION_ERROR"
            }
            BillingError::Conflict(_) => "CONFLICT",
            BillingError::NotFound(_) => "NOT_FOUND",
            BillingError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        BillingError::Database(e.to_string())
    }
}
