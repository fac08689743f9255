//! Data plan catalog and pricing HTTP handlers.
//!
//! This module implements the catalog endpoints:
//! - GET /api/v1/plans - Purchasable plans with selling prices
//! - GET /api/v1/admin/plans - Full catalog including disabled plans
//! - PUT /api/v1/admin/plans/:plan_id - Set a plan's markup / enabled flag

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::plan::{PlanOverride, PricedPlan, UpsertPlanOverrideRequest},
    services::plans,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

/// Purchasable plans: the vendor catalog merged with local overrides,
/// disabled plans hidden, prices including markup.
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PricedPlan>>, AppError> {
    let priced = plans::list_plans(&state, false).await?;

    Ok(Json(priced))
}

/// Full merged catalog for administrators, disabled plans included.
pub async fn list_all_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<PricedPlan>>, AppError> {
    let priced = plans::list_plans(&state, true).await?;

    Ok(Json(priced))
}

/// Set or update a plan's markup and enabled flag.
///
/// # Request Body
///
/// ```json
/// {
///   "markup_kobo": 2000,
///   "is_enabled": true
/// }
/// ```
///
/// The plan id must exist in the vendor catalog. The change is audited.
pub async fn upsert_plan_override(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<i64>,
    Json(request): Json<UpsertPlanOverrideRequest>,
) -> Result<Json<PlanOverride>, AppError> {
    let override_row = plans::upsert_override(&state, auth.user_id, plan_id, request).await?;

    Ok(Json(override_row))
}
