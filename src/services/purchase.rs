//! The synchronous data purchase flow.
//!
//! Converts wallet balance into a vendor-delivered bundle within one
//! request. Each step is its own failure domain with an explicit
//! compensation rule:
//!
//! 1. **Deduct** the wallet. Failure aborts with nothing written.
//! 2. **Record** a `pending` transaction. Failure refunds the deduction.
//! 3. **Call the vendor.** Transport failure marks the row `failed` and
//!    refunds.
//! 4. **Interpret the response.** A vendor-reported failure marks the row
//!    `failed` with the mapped message and refunds.
//! 5. **Complete.** The row becomes `completed` with the vendor id and raw
//!    payload attached. Past this point no compensation is possible.
//!
//! Per invocation: exactly one wallet debit, at most one compensating
//! credit, at most one transaction row.

use serde_json::Value;
use uuid::Uuid;

use crate::clients::vtu::{VendorOutcome, VendorPurchase};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::transaction::{PurchaseRequest, Transaction};
use crate::services::{plans, wallet};
use crate::state::AppState;

/// Execute a data bundle purchase for `user_id`.
///
/// The price is resolved server-side from the vendor catalog plus the
/// local markup; the client only names a plan and a phone number.
pub async fn purchase_data(
    state: &AppState,
    user_id: Uuid,
    request: PurchaseRequest,
) -> Result<Transaction, AppError> {
    // Fail before any state change if the vendor credential is missing.
    let vtu = state.vtu()?;

    validate_phone_number(&request.phone_number)?;

    // Catalog lookup also happens before money moves: an unknown or
    // disabled plan never reaches the wallet.
    let plan = plans::resolve_purchasable_plan(state, request.plan_id).await?;

    // Step 1: deduct. Zero rows updated means insufficient balance and
    // nothing has been written yet.
    wallet::deduct(&state.pool, user_id, plan.price_kobo).await?;

    // Step 2: record the pending transaction. From here on, every failure
    // path owes the user a refund.
    let pending = match insert_pending(state, user_id, &plan, &request).await {
        Ok(t) => t,
        Err(e) => {
            compensate(&state.pool, user_id, plan.price_kobo).await;
            return Err(e);
        }
    };

    // Step 3: vendor call.
    let vendor_request = VendorPurchase {
        network: plan.vendor.network_code,
        mobile_number: request.phone_number.clone(),
        plan: plan.vendor.plan_id,
        ported_number: request.ported_number,
    };
    let outcome = match vtu.purchase(&vendor_request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            mark_failed(&state.pool, pending.id, &e.to_string(), None).await;
            compensate(&state.pool, user_id, plan.price_kobo).await;
            return Err(e);
        }
    };

    // Step 4/5: interpret the normalized outcome.
    match outcome {
        VendorOutcome::Rejected { message, raw } => {
            mark_failed(&state.pool, pending.id, &message, Some(&raw)).await;
            compensate(&state.pool, user_id, plan.price_kobo).await;
            Err(AppError::VendorRejected(message))
        }
        VendorOutcome::Delivered { vendor_tx_id, raw } => {
            // Point of no return: the bundle is delivered, so a failure to
            // persist completion must NOT refund. The row stays pending for
            // manual review instead.
            mark_completed(&state.pool, pending.id, vendor_tx_id.as_deref(), &raw).await
        }
    }
}

fn validate_phone_number(phone: &str) -> Result<(), AppError> {
    let p = phone.trim();
    if p.len() < 10 || p.len() > 15 || !p.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidRequest(
            "Phone number must be 10-15 digits".to_string(),
        ));
    }
    Ok(())
}

async fn insert_pending(
    state: &AppState,
    user_id: Uuid,
    plan: &plans::ResolvedPlan,
    request: &PurchaseRequest,
) -> Result<Transaction, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            user_id,
            transaction_type,
            amount_kobo,
            status,
            network_code,
            phone_number,
            data_size,
            duration
        )
        VALUES ($1, 'data_purchase', $2, 'pending', $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan.price_kobo)
    .bind(&plan.vendor.network)
    .bind(request.phone_number.trim())
    .bind(&plan.vendor.data_size)
    .bind(&plan.vendor.duration)
    .fetch_one(&state.pool)
    .await?;

    Ok(transaction)
}

/// Mark the pending row `failed` with the best-effort error message.
///
/// Best-effort: the caller is already on a failure path, so a second
/// failure here is logged rather than propagated.
async fn mark_failed(pool: &DbPool, transaction_id: Uuid, message: &str, raw: Option<&Value>) {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'failed',
            error_message = $2,
            vendor_response = COALESCE($3, vendor_response),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(transaction_id)
    .bind(message)
    .bind(raw)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(
            error = %e,
            %transaction_id,
            "failed to mark purchase transaction as failed"
        );
    }
}

/// Refund a deduction whose purchase did not complete.
///
/// A failure here leaves the user debited with no bundle; it is logged at
/// error level for manual reconciliation since there is nothing further
/// the request can do.
async fn compensate(pool: &DbPool, user_id: Uuid, amount_kobo: i64) {
    if let Err(e) = wallet::credit(pool, user_id, amount_kobo).await {
        tracing::error!(
            error = %e,
            %user_id,
            amount_kobo,
            "compensating refund failed; wallet requires manual reconciliation"
        );
    }
}

async fn mark_completed(
    pool: &DbPool,
    transaction_id: Uuid,
    vendor_tx_id: Option<&str>,
    raw: &Value,
) -> Result<Transaction, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'completed',
            vendor_transaction_id = $2,
            vendor_response = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(vendor_tx_id)
    .bind(raw)
    .fetch_one(pool)
    .await?;

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::validate_phone_number;

    #[test]
    fn accepts_nigerian_msisdns() {
        assert!(validate_phone_number("08031234567").is_ok());
        assert!(validate_phone_number("2348031234567").is_ok());
        assert!(validate_phone_number(" 08031234567 ").is_ok());
    }

    #[test]
    fn rejects_short_long_and_non_numeric() {
        assert!(validate_phone_number("080312").is_err());
        assert!(validate_phone_number("0803123456789012").is_err());
        assert!(validate_phone_number("0803-123-4567").is_err());
        assert!(validate_phone_number("").is_err());
    }
}
