//! API routes

pub mod plans;
pub mod subscriptions;


use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{auth::require_auth, error::ApiError, state::AppState};

/// Success envelope: `{"success": true, "data": ..., "message": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Paged list envelope
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: rollcall_billing::Pagination,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

pub fn create_router(state: AppState) -> Router {
    // Everything under /subscriptions requires a tenant-bound token
    let protected = Router::new()
        .route(
            "/subscriptions",
            post(subscriptions::create_subscription).get(subscriptions::list_subscriptions),
        )
        .route(
            "/subscriptions/active",
            get(subscriptions::get_active_subscription),
        )
        .route(
            "/subscriptions/{subscription_id}",
            get(subscriptions::get_subscription)
                .put(subscriptions::update_subscription)
                .delete(subscriptions::cancel_subscription),
        )
        .route_layer(from_fn_with_state(state.auth_state(), require_auth));

    let public = Router::new().route("/plans", get(plans::list_plans));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", protected.merge(public))
        .fallback(route_not_found)
        .with_state(state)
}
