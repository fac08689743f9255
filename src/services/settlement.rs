//! Wallet funding settlement.
//!
//! Shared by the gateway webhook and the verification endpoint, which can
//! race each other or be replayed. Idempotency rests on two database
//! guards, both inside one transaction:
//!
//! - the funding flip `pending -> completed` is conditioned on
//!   `status = 'pending'`, so only one settler wins the optimistic lock;
//! - the transaction insert dedupes on the unique `payment_reference`
//!   index, and the wallet credit only happens when that insert actually
//!   produced a row.
//!
//! Running the funding update, the transaction insert, and the credit as a
//! single unit also means a funding can never end up `completed` without
//! its transaction row and credit.

use crate::clients::paystack::GatewayVerification;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::funding::WalletFunding;
use crate::services::wallet;
use uuid::Uuid;

/// What a settlement attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The funding settled: transaction row inserted, wallet credited.
    Credited { amount_kobo: i64 },
    /// Another settler got here first (or this is a replay). No-op.
    AlreadyProcessed,
    /// The gateway reported failure/abandonment; funding marked `failed`.
    MarkedFailed,
    /// The gateway has not finished processing the charge. No-op.
    StillPending,
}

/// Apply a normalized gateway verification to the funding it references.
///
/// An `Unknown` status is the fail-safe default: logged and surfaced as an
/// error without mutating anything.
pub async fn apply_verification(
    pool: &DbPool,
    reference: &str,
    verification: GatewayVerification,
) -> Result<SettlementOutcome, AppError> {
    match verification {
        GatewayVerification::Success { amount_kobo } => {
            settle_success(pool, reference, Some(amount_kobo)).await
        }
        GatewayVerification::Failed { reason } => {
            tracing::info!(reference, reason = %reason, "gateway reported funding failure");
            settle_failure(pool, reference).await
        }
        GatewayVerification::Pending => Ok(SettlementOutcome::StillPending),
        GatewayVerification::Unknown { status } => {
            tracing::warn!(reference, status = %status, "unrecognized gateway status; not settling");
            Err(AppError::GatewayUnavailable(format!(
                "unrecognized gateway status \"{status}\""
            )))
        }
    }
}

/// Settle a confirmed-successful funding.
///
/// Safe to call concurrently and repeatedly for the same reference: every
/// caller after the first observes either zero rows from the conditional
/// update or a conflict on the transaction insert and short-circuits as
/// [`SettlementOutcome::AlreadyProcessed`].
pub async fn settle_success(
    pool: &DbPool,
    reference: &str,
    gateway_amount_kobo: Option<i64>,
) -> Result<SettlementOutcome, AppError> {
    let mut tx = pool.begin().await?;

    // Optimistic lock: only the caller that flips pending -> completed
    // proceeds to credit.
    let funding = sqlx::query_as::<_, WalletFunding>(
        r#"
        UPDATE wallet_fundings
        SET status = 'completed', updated_at = NOW()
        WHERE payment_reference = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(reference)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(funding) = funding else {
        tx.rollback().await?;
        return if funding_exists(pool, reference).await? {
            Ok(SettlementOutcome::AlreadyProcessed)
        } else {
            Err(AppError::FundingNotFound)
        };
    };

    if gateway_amount_kobo.is_some_and(|settled| settled != funding.amount_kobo) {
        // Credit what the funding row reserved; the mismatch is for a
        // human to look at.
        tracing::warn!(
            reference,
            expected_kobo = funding.amount_kobo,
            settled_kobo = gateway_amount_kobo.unwrap_or(0),
            "gateway settled amount differs from funding amount"
        );
    }

    // The transaction insert is the duplicate-credit guard: a replay that
    // somehow got past the conditional update hits the unique reference
    // index and inserts nothing.
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (
            user_id,
            transaction_type,
            amount_kobo,
            status,
            payment_reference,
            payment_method,
            funding_id
        )
        VALUES ($1, 'wallet_funding', $2, 'completed', $3, $4, $5)
        ON CONFLICT (payment_reference) WHERE payment_reference IS NOT NULL DO NOTHING
        RETURNING id
        "#,
    )
    .bind(funding.user_id)
    .bind(funding.amount_kobo)
    .bind(reference)
    .bind(&funding.payment_method)
    .bind(funding.id)
    .fetch_optional(&mut *tx)
    .await?;

    if inserted.is_none() {
        // A completed transaction already carries this reference. Keep the
        // funding flip but do not credit again.
        tx.commit().await?;
        return Ok(SettlementOutcome::AlreadyProcessed);
    }

    // Credit only after the insert succeeded, inside the same transaction:
    // either all three writes commit or none do.
    wallet::credit_in_tx(&mut tx, funding.user_id, funding.amount_kobo).await?;

    tx.commit().await?;

    tracing::info!(
        reference,
        user_id = %funding.user_id,
        amount_kobo = funding.amount_kobo,
        "wallet funding settled"
    );

    Ok(SettlementOutcome::Credited {
        amount_kobo: funding.amount_kobo,
    })
}

/// Settle a confirmed-failed (or abandoned) funding.
///
/// Marks the funding `failed` without touching the wallet. Conditioned on
/// `pending` so a late failure report cannot clobber a completed funding.
pub async fn settle_failure(pool: &DbPool, reference: &str) -> Result<SettlementOutcome, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE wallet_fundings
        SET status = 'failed', updated_at = NOW()
        WHERE payment_reference = $1 AND status = 'pending'
        "#,
    )
    .bind(reference)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return if funding_exists(pool, reference).await? {
            Ok(SettlementOutcome::AlreadyProcessed)
        } else {
            Err(AppError::FundingNotFound)
        };
    }

    Ok(SettlementOutcome::MarkedFailed)
}

async fn funding_exists(pool: &DbPool, reference: &str) -> Result<bool, AppError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wallet_fundings WHERE payment_reference = $1)")
            .bind(reference)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}
