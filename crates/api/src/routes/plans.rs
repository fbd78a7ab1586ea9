//! Plan catalogue route

use axum::Json;
use rollcall_billing::Plan;

use super::ApiResponse;

/// GET /api/v1/plans
pub async fn list_plans() -> Json<ApiResponse<Vec<Plan>>> {
    Json(ApiResponse::ok(Plan::catalogue()))
}
