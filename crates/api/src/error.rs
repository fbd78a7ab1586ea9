//! API error type and the failure envelope

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollcall_billing::BillingError;
use serde::Serialize;

/// Failure envelope: `{"success": false, "error": CODE, "message": ...}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn subscription_not_found() -> Self {
        Self::NotFound("Subscription not found".to_string())
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation { .. } | BillingError::InvalidTransition { .. } => {
                Self::Validation(err.to_string())
            }
            BillingError::Conflict(message) => Self::Conflict(message),
            BillingError::NotFound(message) => Self::NotFound(message),
            BillingError::Database(message) => Self::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Internal details are logged, never returned
        let message = if let Self::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal API error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_shared::SubscriptionStatus;

    #[test]
    fn test_billing_error_mapping() {
        let cases = [
            (
                BillingError::validation("planId", "planId is required"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                BillingError::InvalidTransition {
                    from: SubscriptionStatus::Active,
                    to: SubscriptionStatus::Trialing,
                },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                BillingError::Conflict("taken".into()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                BillingError::NotFound("gone".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                BillingError::Database("pool timed out".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (billing, status, code) in cases {
            let api = ApiError::from(billing);
            assert_eq!(api.status_code(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("connection refused at 10.0.0.5".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "Internal server error");
    }
}
