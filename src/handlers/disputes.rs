//! Dispute HTTP handlers.
//!
//! This module implements the dispute workflow endpoints:
//! - POST /api/v1/transactions/:id/dispute - File a dispute (owner)
//! - GET /api/v1/admin/disputes - Open dispute queue (admin)
//! - POST /api/v1/admin/disputes/:id/resolve - Resolve a dispute (admin)

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::transaction::{
        DisputeRequest, ResolveDisputeRequest, TransactionResponse, TransactionStatus,
    },
    services::dispute,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for the dispute queue.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Response for a resolved dispute.
///
/// # JSON Example
///
/// ```json
/// {
///   "transaction": { "id": "...", "status": "refunded", ... },
///   "previous_status": "disputed",
///   "refunded_amount_kobo": 30000
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ResolveDisputeResponse {
    pub transaction: TransactionResponse,
    pub previous_status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_amount_kobo: Option<i64>,
}

/// File a dispute on one of the caller's completed transactions.
///
/// # Request Body
///
/// ```json
/// {
///   "dispute_type": "not_delivered",
///   "note": "Bundle never arrived on my line"
/// }
/// ```
///
/// Only `completed` transactions can be disputed; anything else returns
/// 409 with the current status.
pub async fn open_dispute(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<DisputeRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction =
        dispute::open_dispute(&state.pool, auth.user_id, transaction_id, request).await?;

    Ok(Json(transaction.into()))
}

/// Open dispute queue, oldest first.
pub async fn list_disputes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let disputes = dispute::list_open_disputes(&state.pool, limit).await?;

    Ok(Json(disputes.into_iter().map(Into::into).collect()))
}

/// Resolve a dispute.
///
/// # Request Body
///
/// ```json
/// {
///   "refund": true,
///   "refund_amount_kobo": 30000,
///   "note": "Gateway settled short; refunding the difference"
/// }
/// ```
///
/// # Concurrency
///
/// Two admins resolving the same dispute race on a row lock; the loser
/// receives 409 and no second refund is issued.
pub async fn resolve_dispute(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
    Json(request): Json<ResolveDisputeRequest>,
) -> Result<Json<ResolveDisputeResponse>, AppError> {
    let resolution =
        dispute::resolve_dispute(&state.pool, auth.user_id, transaction_id, request).await?;

    Ok(Json(ResolveDisputeResponse {
        transaction: resolution.transaction.into(),
        previous_status: resolution.previous_status,
        refunded_amount_kobo: resolution.refunded_kobo,
    }))
}
