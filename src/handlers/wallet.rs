//! Wallet balance and funding HTTP handlers.
//!
//! This module implements the wallet API endpoints:
//! - GET /api/v1/wallet - Balance and recent funding attempts
//! - POST /api/v1/wallet/fundings - Start a gateway-hosted funding
//! - POST /api/v1/wallet/fundings/verify - Verify and settle a funding

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::funding::{
        FundingResponse, InitiateFundingRequest, InitiateFundingResponse, VerifyFundingRequest,
        WalletFunding,
    },
    services::{settlement, settlement::SettlementOutcome, wallet},
    state::AppState,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Wallet summary returned to the owner.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub wallet_balance_kobo: i64,
    pub recent_fundings: Vec<FundingResponse>,
}

/// Outcome of a verification call.
///
/// # JSON Example
///
/// ```json
/// {
///   "reference": "fund_9f8a6c...",
///   "status": "credited",
///   "amount_kobo": 100000
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct VerifyFundingResponse {
    pub reference: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_kobo: Option<i64>,
}

/// Wallet balance and the caller's recent funding attempts.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet_balance_kobo = wallet::balance(&state.pool, auth.user_id).await?;

    let fundings = sqlx::query_as::<_, WalletFunding>(
        r#"
        SELECT * FROM wallet_fundings
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 20
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(WalletResponse {
        wallet_balance_kobo,
        recent_fundings: fundings.into_iter().map(Into::into).collect(),
    }))
}

/// Start funding the wallet through the payment gateway.
///
/// # Request Body
///
/// ```json
/// {
///   "amount_naira": 1000,
///   "payment_method": "card"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "reference": "fund_9f8a6c...",
///   "authorization_url": "https://checkout.paystack.com/abc123"
/// }
/// ```
///
/// A `pending` WalletFunding row is reserved before the gateway is called;
/// settlement later keys off its reference. If the gateway call fails the
/// row is marked `failed` and no money has moved anywhere.
pub async fn initiate_funding(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<InitiateFundingRequest>,
) -> Result<(StatusCode, Json<InitiateFundingResponse>), AppError> {
    // Configuration is checked before any state change.
    let paystack = state.paystack()?;

    let amount_kobo = request.amount_kobo()?;
    let payment_method = request.payment_method.as_deref().unwrap_or("card").to_string();

    let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let reference = new_funding_reference();

    sqlx::query(
        r#"
        INSERT INTO wallet_fundings (user_id, amount_kobo, payment_method, payment_reference)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(auth.user_id)
    .bind(amount_kobo)
    .bind(&payment_method)
    .bind(&reference)
    .execute(&state.pool)
    .await?;

    let authorization_url = match paystack.initialize(&email, amount_kobo, &reference).await {
        Ok(url) => url,
        Err(e) => {
            // The handshake never happened; retire the reserved row.
            let result = sqlx::query(
                "UPDATE wallet_fundings SET status = 'failed', updated_at = NOW() WHERE payment_reference = $1",
            )
            .bind(&reference)
            .execute(&state.pool)
            .await;
            if let Err(mark_err) = result {
                tracing::error!(error = %mark_err, %reference, "failed to retire unstarted funding");
            }
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(InitiateFundingResponse {
            reference,
            authorization_url,
        }),
    ))
}

/// Verify a funding with the gateway and settle it.
///
/// Safe to call any number of times and concurrently with the webhook:
/// settlement is idempotent, so a replay reports `already_processed`
/// instead of crediting twice.
///
/// # Security
///
/// Non-admin callers may only verify their own fundings.
pub async fn verify_funding(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<VerifyFundingRequest>,
) -> Result<Json<VerifyFundingResponse>, AppError> {
    let paystack = state.paystack()?;
    let reference = request.reference.trim().to_string();

    let funding = sqlx::query_as::<_, WalletFunding>(
        "SELECT * FROM wallet_fundings WHERE payment_reference = $1",
    )
    .bind(&reference)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::FundingNotFound)?;

    if !auth.can_access(funding.user_id) {
        return Err(AppError::FundingNotFound);
    }

    let verification = paystack.verify(&reference).await?;
    let outcome = settlement::apply_verification(&state.pool, &reference, verification).await?;

    let (status, amount_kobo) = match outcome {
        SettlementOutcome::Credited { amount_kobo } => ("credited", Some(amount_kobo)),
        SettlementOutcome::AlreadyProcessed => ("already_processed", None),
        SettlementOutcome::MarkedFailed => ("failed", None),
        SettlementOutcome::StillPending => ("pending", None),
    };

    Ok(Json(VerifyFundingResponse {
        reference,
        status,
        amount_kobo,
    }))
}

/// Generate an unguessable funding reference.
fn new_funding_reference() -> String {
    let bytes: [u8; 12] = rand::random();
    format!("fund_{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::new_funding_reference;

    #[test]
    fn references_are_prefixed_and_unique() {
        let a = new_funding_reference();
        let b = new_funding_reference();
        assert!(a.starts_with("fund_"));
        assert_eq!(a.len(), "fund_".len() + 24);
        assert_ne!(a, b);
    }
}
