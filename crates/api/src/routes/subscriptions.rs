//! Subscription routes
//!
//! Every handler works on the tenant of the authenticated caller; ids of
//! other tenants' subscriptions resolve to 404.

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use rollcall_billing::{
    validation, CancelSubscriptionRequest, CreateSubscriptionRequest, ListOptions, Subscription,
    UpdateSubscriptionRequest,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResponse, PaginatedResponse};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListSubscriptionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Ids that are not UUIDs cannot name a stored subscription
fn parse_subscription_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::subscription_not_found())
}

/// POST /api/v1/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Subscription>>)> {
    let Json(request) = payload?;

    let sub = state
        .subscriptions
        .create_subscription(request, &auth_user.tenant_id, &auth_user.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            sub,
            "Subscription created successfully",
        )),
    ))
}

/// GET /api/v1/subscriptions/{subscription_id}
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(subscription_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let id = parse_subscription_id(&subscription_id)?;

    let sub = state
        .subscriptions
        .get_subscription(id, &auth_user.tenant_id)
        .await?
        .ok_or_else(ApiError::subscription_not_found)?;

    Ok(Json(ApiResponse::ok(sub)))
}

/// GET /api/v1/subscriptions/active
///
/// `data` is null when the tenant has no ACTIVE subscription.
pub async fn get_active_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Option<Subscription>>>> {
    let active = state
        .subscriptions
        .get_active_subscription_by_tenant(&auth_user.tenant_id)
        .await?;

    let response = match active {
        Some(sub) => ApiResponse::ok(Some(sub)),
        None => ApiResponse::with_message(None, "No active subscription"),
    };

    Ok(Json(response))
}

/// PUT /api/v1/subscriptions/{subscription_id}
pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(subscription_id): Path<String>,
    payload: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let id = parse_subscription_id(&subscription_id)?;
    let Json(updates) = payload?;

    let sub = state
        .subscriptions
        .update_subscription(id, updates, &auth_user.tenant_id, &auth_user.user_id)
        .await?;

    Ok(Json(ApiResponse::with_message(
        sub,
        "Subscription updated successfully",
    )))
}

/// DELETE /api/v1/subscriptions/{subscription_id}
///
/// The `{reason}` body is optional; an empty body cancels without a reason.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(subscription_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let id = parse_subscription_id(&subscription_id)?;

    let request: CancelSubscriptionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CancelSubscriptionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?
    };

    let sub = state
        .subscriptions
        .cancel_subscription(id, &auth_user.tenant_id, &auth_user.user_id, request)
        .await?;

    Ok(Json(ApiResponse::with_message(
        sub,
        "Subscription cancelled successfully",
    )))
}

/// GET /api/v1/subscriptions?page=&limit=&status=
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<ListSubscriptionsQuery>, QueryRejection>,
) -> ApiResult<Json<PaginatedResponse<Subscription>>> {
    let Query(query) = query?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(validation::parse_status)
        .transpose()?;

    let page = state
        .subscriptions
        .get_subscriptions_by_tenant(
            &auth_user.tenant_id,
            ListOptions {
                page: query.page,
                limit: query.limit,
                status,
            },
        )
        .await?;

    Ok(Json(PaginatedResponse {
        success: true,
        data: page.data,
        pagination: page.pagination,
    }))
}
