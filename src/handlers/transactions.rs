//! Data purchase and transaction history HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/purchases - Buy a data bundle with wallet balance
//! - GET /api/v1/transactions - List the caller's transactions
//! - GET /api/v1/transactions/:id - Get transaction details

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::transaction::{PurchaseRequest, Transaction, TransactionResponse},
    services::purchase,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for transaction listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Buy a data bundle.
///
/// # Request Body
///
/// ```json
/// {
///   "plan_id": 7,
///   "phone_number": "08031234567",
///   "ported_number": false
/// }
/// ```
///
/// # Response (201)
///
/// The completed transaction, including the vendor's transaction id.
///
/// # Failure Semantics
///
/// The wallet is debited exactly once; every failure after the debit
/// (persistence, vendor transport, vendor rejection) triggers a
/// compensating refund before the error response is returned.
pub async fn create_purchase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let transaction = purchase::purchase_data(&state, auth.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// List the caller's transactions, newest first.
///
/// # Endpoint
///
/// `GET /api/v1/transactions?limit=50`
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);

    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(auth.user_id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// Get one transaction by id.
///
/// # Security
///
/// Returns 404 rather than 403 when the transaction belongs to someone
/// else, so ids cannot be probed. Admins may fetch any transaction.
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(transaction_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    if !auth.can_access(transaction.user_id) {
        return Err(AppError::TransactionNotFound);
    }

    Ok(Json(transaction.into()))
}
