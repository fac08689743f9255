//! Atomic wallet ledger operations.
//!
//! This module is the only place that touches `users.wallet_balance_kobo`.
//! Every mutation is a single conditional UPDATE statement, so two
//! concurrent requests can never interleave a read-modify-write: the
//! database serializes the increments and the `wallet_balance_kobo >= $1`
//! predicate doubles as the insufficient-funds check.

use crate::db::DbPool;
use crate::error::AppError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Deduct `amount_kobo` from a user's wallet.
///
/// The balance check and the decrement are one statement; zero rows
/// updated means the balance was insufficient (or the user is gone).
///
/// # Errors
///
/// - `InvalidRequest`: amount is zero or negative
/// - `InsufficientBalance`: wallet does not cover the amount
/// - `UserNotFound`: no such user
pub async fn deduct(pool: &DbPool, user_id: Uuid, amount_kobo: i64) -> Result<(), AppError> {
    if amount_kobo <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET wallet_balance_kobo = wallet_balance_kobo - $1,
            updated_at = NOW()
        WHERE id = $2 AND wallet_balance_kobo >= $1
        "#,
    )
    .bind(amount_kobo)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        return Err(if exists {
            AppError::InsufficientBalance
        } else {
            AppError::UserNotFound
        });
    }

    Ok(())
}

/// Credit `amount_kobo` to a user's wallet.
///
/// Used for funding settlement and for the compensating refunds in the
/// purchase flow.
pub async fn credit(pool: &DbPool, user_id: Uuid, amount_kobo: i64) -> Result<(), AppError> {
    if amount_kobo <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET wallet_balance_kobo = wallet_balance_kobo + $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount_kobo)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::UserNotFound);
    }

    Ok(())
}

/// Credit a wallet inside a caller-owned database transaction.
///
/// Settlement and dispute resolution use this so the credit commits (or
/// rolls back) together with the status writes that justify it.
pub async fn credit_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount_kobo: i64,
) -> Result<(), AppError> {
    if amount_kobo <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET wallet_balance_kobo = wallet_balance_kobo + $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount_kobo)
    .bind(user_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::UserNotFound);
    }

    Ok(())
}

/// Admin-initiated refund credit, used by dispute resolution.
///
/// Identical ledger effect to [`credit_in_tx`]; kept separate so the admin
/// identity and the transaction being refunded travel with the operation
/// in the logs.
pub async fn admin_refund(
    tx: &mut Transaction<'_, Postgres>,
    admin_id: Uuid,
    user_id: Uuid,
    transaction_id: Uuid,
    amount_kobo: i64,
) -> Result<(), AppError> {
    credit_in_tx(tx, user_id, amount_kobo).await?;
    tracing::info!(
        %admin_id,
        %user_id,
        %transaction_id,
        amount_kobo,
        "admin refund credited"
    );
    Ok(())
}

/// Current wallet balance in kobo.
pub async fn balance(pool: &DbPool, user_id: Uuid) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT wallet_balance_kobo FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UserNotFound)
}
