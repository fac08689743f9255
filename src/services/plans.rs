//! Vendor catalog merged with local pricing overrides.
//!
//! The vendor owns the catalog; this platform stores only a per-plan
//! markup and an enabled flag. Purchases are priced exclusively from this
//! merged view so a client can never name its own price.

use std::collections::HashMap;

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::plan::{PlanOverride, PricedPlan, UpsertPlanOverrideRequest, VendorPlan};
use crate::state::AppState;

/// A plan resolved for purchase: the vendor entry plus the selling price.
#[derive(Debug)]
pub struct ResolvedPlan {
    pub vendor: VendorPlan,
    pub price_kobo: i64,
}

/// The merged catalog.
///
/// `include_disabled` is for the admin view; users only ever see enabled
/// plans.
pub async fn list_plans(
    state: &AppState,
    include_disabled: bool,
) -> Result<Vec<PricedPlan>, AppError> {
    let catalog = state.vtu()?.fetch_catalog().await?;
    let overrides = load_overrides(&state.pool).await?;

    let mut priced: Vec<PricedPlan> = catalog
        .iter()
        .map(|plan| PricedPlan::merge(plan, overrides.get(&plan.plan_id)))
        .collect();

    if !include_disabled {
        priced.retain(|p| p.is_enabled);
    }

    Ok(priced)
}

/// Resolve one plan for purchase.
///
/// # Errors
///
/// - `PlanNotFound`: the vendor catalog has no such plan
/// - `InvalidRequest`: the plan exists but is disabled on this platform
pub async fn resolve_purchasable_plan(
    state: &AppState,
    plan_id: i64,
) -> Result<ResolvedPlan, AppError> {
    let vendor = find_vendor_plan(state, plan_id).await?;
    let override_row = load_override(&state.pool, plan_id).await?;

    let merged = PricedPlan::merge(&vendor, override_row.as_ref());
    if !merged.is_enabled {
        return Err(AppError::InvalidRequest(
            "The selected plan is currently unavailable.".to_string(),
        ));
    }

    Ok(ResolvedPlan {
        vendor,
        price_kobo: merged.price_kobo,
    })
}

/// Create or update a plan's override and audit the change.
///
/// The plan id is validated against the vendor catalog, so overrides can
/// only exist for plans the vendor actually sells.
pub async fn upsert_override(
    state: &AppState,
    admin_id: Uuid,
    plan_id: i64,
    request: UpsertPlanOverrideRequest,
) -> Result<PlanOverride, AppError> {
    if request.markup_kobo < 0 {
        return Err(AppError::InvalidRequest(
            "Markup must not be negative".to_string(),
        ));
    }

    let vendor = find_vendor_plan(state, plan_id).await?;

    let override_row = sqlx::query_as::<_, PlanOverride>(
        r#"
        INSERT INTO plan_overrides (plan_id, network, markup_kobo, is_enabled, updated_by, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (plan_id) DO UPDATE
        SET markup_kobo = EXCLUDED.markup_kobo,
            is_enabled = EXCLUDED.is_enabled,
            updated_by = EXCLUDED.updated_by,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(plan_id)
    .bind(&vendor.network)
    .bind(request.markup_kobo)
    .bind(request.is_enabled)
    .bind(admin_id)
    .fetch_one(&state.pool)
    .await?;

    crate::services::audit::record(
        &state.pool,
        admin_id,
        "plan_override_set",
        "plan_overrides",
        Some(plan_id.to_string()),
        serde_json::json!({
            "network": override_row.network,
            "markup_kobo": override_row.markup_kobo,
            "is_enabled": override_row.is_enabled,
        }),
    )
    .await;

    Ok(override_row)
}

async fn find_vendor_plan(state: &AppState, plan_id: i64) -> Result<VendorPlan, AppError> {
    let catalog = state.vtu()?.fetch_catalog().await?;
    catalog
        .into_iter()
        .find(|p| p.plan_id == plan_id)
        .ok_or(AppError::PlanNotFound)
}

async fn load_overrides(pool: &DbPool) -> Result<HashMap<i64, PlanOverride>, AppError> {
    let rows = sqlx::query_as::<_, PlanOverride>("SELECT * FROM plan_overrides")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|o| (o.plan_id, o)).collect())
}

async fn load_override(pool: &DbPool, plan_id: i64) -> Result<Option<PlanOverride>, AppError> {
    let row = sqlx::query_as::<_, PlanOverride>("SELECT * FROM plan_overrides WHERE plan_id = $1")
        .bind(plan_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
