//! Dispute filing and admin-driven resolution.
//!
//! Filing flips a `completed` transaction to `disputed` via a conditional
//! update. Resolution runs in one database transaction with the row locked
//! `FOR UPDATE` and the prior status re-checked, so two admins racing on
//! the same dispute cannot both issue a refund: the loser sees a status
//! that is no longer resolvable and gets a conflict.
//!
//! The ledger credit happens inside the same database transaction as the
//! status write, before it commits. A transaction is therefore never
//! marked `refunded` without a successful credit, and never credited
//! without ending up `refunded`.

use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::transaction::{
    DisputeRequest, ResolveDisputeRequest, StatusOverride, Transaction, TransactionStatus,
    TransactionType,
};
use crate::services::{audit, wallet};

/// Result of a resolved dispute, with what the audit trail needs.
#[derive(Debug)]
pub struct DisputeResolution {
    pub transaction: Transaction,
    pub previous_status: TransactionStatus,
    pub refunded_kobo: Option<i64>,
}

/// File a dispute on the caller's own completed transaction.
///
/// The status flip is conditioned on `completed`, which both enforces the
/// transition graph and keeps double-filing idempotent-safe.
pub async fn open_dispute(
    pool: &DbPool,
    user_id: Uuid,
    transaction_id: Uuid,
    request: DisputeRequest,
) -> Result<Transaction, AppError> {
    if request.dispute_type.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "dispute_type is required".to_string(),
        ));
    }

    let disputed = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'disputed',
            dispute_type = $3,
            dispute_note = $4,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND status = 'completed'
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(user_id)
    .bind(request.dispute_type.trim())
    .bind(request.note.as_deref().map(str::trim))
    .fetch_optional(pool)
    .await?;

    match disputed {
        Some(t) => Ok(t),
        None => {
            // Distinguish "not yours / doesn't exist" from "wrong state".
            let current: Option<TransactionStatus> = sqlx::query_scalar(
                "SELECT status FROM transactions WHERE id = $1 AND user_id = $2",
            )
            .bind(transaction_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

            match current {
                None => Err(AppError::TransactionNotFound),
                Some(status) => Err(AppError::Conflict(format!(
                    "only completed transactions can be disputed (current status: {})",
                    status.as_str()
                ))),
            }
        }
    }
}

/// Resolve a dispute as an administrator.
///
/// Exactly one of three outcomes is chosen by the request:
/// full/partial refund (`refunded`), keep under review (`under_review`),
/// or reject (`dispute_rejected`). See [`ResolveDisputeRequest`].
pub async fn resolve_dispute(
    pool: &DbPool,
    admin_id: Uuid,
    transaction_id: Uuid,
    request: ResolveDisputeRequest,
) -> Result<DisputeResolution, AppError> {
    if request.refund && request.status_override.is_some() {
        return Err(AppError::InvalidRequest(
            "refund and status_override are mutually exclusive".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // Lock the row and re-check the status under the lock: the
    // optimistic-concurrency guard against two admins resolving at once.
    let row = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE id = $1 FOR UPDATE",
    )
    .bind(transaction_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::TransactionNotFound)?;

    if !row.status.is_resolvable() {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!(
            "dispute already resolved (current status: {})",
            row.status.as_str()
        )));
    }

    let previous_status = row.status;
    let note = request.note.as_deref().map(str::trim);

    let (transaction, refunded_kobo) = if request.refund {
        // Validation happens before any ledger write.
        let amount = refund_amount(row.transaction_type, row.amount_kobo, request.refund_amount_kobo)?;

        // Credit first, in the same transaction: the status write below
        // only commits together with a successful credit.
        wallet::admin_refund(&mut tx, admin_id, row.user_id, transaction_id, amount).await?;

        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = 'refunded',
                admin_resolution = $2,
                resolved_by = $3,
                resolved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(note)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        (updated, Some(amount))
    } else if request.status_override == Some(StatusOverride::PendingReview) {
        if row.transaction_type != TransactionType::WalletFunding {
            tx.rollback().await?;
            return Err(AppError::InvalidRequest(
                "only wallet funding disputes can be marked for review".to_string(),
            ));
        }
        if row.status == TransactionStatus::UnderReview {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "dispute is already under review".to_string(),
            ));
        }

        // The case stays open: resolution fields are cleared, not set.
        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = 'under_review',
                admin_resolution = NULL,
                resolved_by = NULL,
                resolved_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        (updated, None)
    } else {
        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = 'dispute_rejected',
                admin_resolution = $2,
                resolved_by = $3,
                resolved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(note)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        (updated, None)
    };

    tx.commit().await?;

    // Audit after commit; a logging failure must not fail a resolution
    // whose financial effect already happened.
    audit::record(
        pool,
        admin_id,
        "dispute_resolved",
        "transactions",
        Some(transaction_id.to_string()),
        json!({
            "previous_status": previous_status,
            "new_status": transaction.status,
            "refunded_amount_kobo": refunded_kobo,
            "note": note,
        }),
    )
    .await;

    if let Some(amount) = refunded_kobo {
        audit::record(
            pool,
            admin_id,
            "wallet_refunded",
            "users",
            Some(transaction.user_id.to_string()),
            json!({
                "transaction_id": transaction_id,
                "amount_kobo": amount,
            }),
        )
        .await;
    }

    Ok(DisputeResolution {
        transaction,
        previous_status,
        refunded_kobo,
    })
}

/// Open disputes for the admin queue, oldest first.
pub async fn list_open_disputes(pool: &DbPool, limit: i64) -> Result<Vec<Transaction>, AppError> {
    let disputes = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE status IN ('disputed', 'under_review')
        ORDER BY updated_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(disputes)
}

/// Decide how much to credit for a refund, before any ledger write.
///
/// Data purchases are all-or-nothing. Wallet fundings may be partial, but
/// never more than the original transaction amount.
fn refund_amount(
    transaction_type: TransactionType,
    original_kobo: i64,
    requested_kobo: Option<i64>,
) -> Result<i64, AppError> {
    match transaction_type {
        TransactionType::DataPurchase => match requested_kobo {
            None => Ok(original_kobo),
            Some(a) if a == original_kobo => Ok(a),
            Some(_) => Err(AppError::InvalidRequest(
                "partial refunds are not supported for data purchases".to_string(),
            )),
        },
        TransactionType::WalletFunding => {
            let amount = requested_kobo.unwrap_or(original_kobo);
            if amount <= 0 {
                Err(AppError::InvalidRequest(
                    "Refund amount must be positive".to_string(),
                ))
            } else if amount > original_kobo {
                Err(AppError::InvalidRequest(
                    "Refund amount cannot exceed the original transaction amount".to_string(),
                ))
            } else {
                Ok(amount)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_dispute_defaults_to_full_refund() {
        assert_eq!(
            refund_amount(TransactionType::WalletFunding, 50_000, None).unwrap(),
            50_000
        );
    }

    #[test]
    fn wallet_dispute_allows_partial_refund_within_bound() {
        assert_eq!(
            refund_amount(TransactionType::WalletFunding, 50_000, Some(30_000)).unwrap(),
            30_000
        );
        assert_eq!(
            refund_amount(TransactionType::WalletFunding, 50_000, Some(50_000)).unwrap(),
            50_000
        );
    }

    #[test]
    fn wallet_dispute_rejects_refund_above_original_amount() {
        assert!(refund_amount(TransactionType::WalletFunding, 50_000, Some(60_000)).is_err());
    }

    #[test]
    fn wallet_dispute_rejects_non_positive_refund() {
        assert!(refund_amount(TransactionType::WalletFunding, 50_000, Some(0)).is_err());
        assert!(refund_amount(TransactionType::WalletFunding, 50_000, Some(-100)).is_err());
    }

    #[test]
    fn data_purchase_refund_is_all_or_nothing() {
        assert_eq!(
            refund_amount(TransactionType::DataPurchase, 24_100, None).unwrap(),
            24_100
        );
        assert_eq!(
            refund_amount(TransactionType::DataPurchase, 24_100, Some(24_100)).unwrap(),
            24_100
        );
        assert!(refund_amount(TransactionType::DataPurchase, 24_100, Some(10_000)).is_err());
    }
}
