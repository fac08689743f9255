//! Inbound payment gateway webhook.
//!
//! The one unauthenticated mutation path in the system. Authentication is
//! the HMAC-SHA512 signature the gateway computes over the raw request
//! body; the signature is checked before the body is parsed and before any
//! state is read.

use crate::{
    error::AppError,
    services::settlement,
    state::AppState,
};
use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use serde::Deserialize;

/// Header the gateway sends its signature in.
const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Webhook envelope the gateway posts.
#[derive(Debug, Deserialize)]
struct GatewayEvent {
    event: String,
    data: GatewayEventData,
}

#[derive(Debug, Deserialize)]
struct GatewayEventData {
    reference: String,
    /// Settled amount in minor units, when the event carries one
    amount: Option<i64>,
}

/// Handle a gateway webhook delivery.
///
/// # Flow
///
/// 1. Verify the HMAC signature over the raw body; reject otherwise
/// 2. Parse the event envelope
/// 3. `charge.success` settles the funding; `charge.failed` marks it failed
/// 4. Anything else is logged and rejected without mutating state
///
/// # Idempotency
///
/// The gateway retries deliveries and may race the verification endpoint.
/// Settlement short-circuits replays as already-processed, so this handler
/// returns 200 for them and the gateway stops retrying.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let paystack = state.paystack()?;

    // Signature first: nothing is read or parsed until the sender proves
    // knowledge of the shared secret.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !paystack.verify_webhook_signature(&body, signature) {
        return Err(AppError::InvalidSignature);
    }

    let event: GatewayEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidRequest(format!("malformed webhook body: {e}")))?;

    let reference = event.data.reference.as_str();

    match event.event.as_str() {
        "charge.success" => {
            let outcome =
                settlement::settle_success(&state.pool, reference, event.data.amount).await?;
            tracing::info!(reference, ?outcome, "webhook settled funding");
            Ok(StatusCode::OK)
        }
        "charge.failed" => {
            let outcome = settlement::settle_failure(&state.pool, reference).await?;
            tracing::info!(reference, ?outcome, "webhook marked funding failed");
            Ok(StatusCode::OK)
        }
        other => {
            // Fail-safe default: unknown events mutate nothing.
            tracing::warn!(event = other, reference, "unhandled gateway webhook event");
            Err(AppError::InvalidRequest(format!(
                "unhandled webhook event \"{other}\""
            )))
        }
    }
}
