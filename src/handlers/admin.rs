//! Admin user management and audit trail HTTP handlers.
//!
//! This module implements the admin endpoints:
//! - GET /api/v1/admin/users - List user accounts
//! - POST /api/v1/admin/users/:id/ban - Suspend an account
//! - POST /api/v1/admin/users/:id/unban - Lift a suspension
//! - GET /api/v1/admin/audit-logs - Recent admin activity

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        audit::AuditLog,
        user::{User, UserResponse},
    },
    services::audit,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Query parameters for admin listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// List user accounts, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);

    let users =
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Suspend an account. Banned users fail authentication on every request.
///
/// The change is audited. Admins cannot ban themselves.
pub async fn ban_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    if user_id == auth.user_id {
        return Err(AppError::InvalidRequest(
            "Administrators cannot ban themselves".to_string(),
        ));
    }

    let user = set_ban_state(&state, user_id, true).await?;

    audit::record(
        &state.pool,
        auth.user_id,
        "user_banned",
        "users",
        Some(user_id.to_string()),
        json!({ "email": user.email }),
    )
    .await;

    Ok(Json(user.into()))
}

/// Lift a suspension. The change is audited.
pub async fn unban_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = set_ban_state(&state, user_id, false).await?;

    audit::record(
        &state.pool,
        auth.user_id,
        "user_unbanned",
        "users",
        Some(user_id.to_string()),
        json!({ "email": user.email }),
    )
    .await;

    Ok(Json(user.into()))
}

/// Recent admin activity, newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let logs = audit::list(&state.pool, limit).await?;

    Ok(Json(logs))
}

async fn set_ban_state(state: &AppState, user_id: Uuid, banned: bool) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET is_banned = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(banned)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::UserNotFound)
}
