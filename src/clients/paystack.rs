//! Payment gateway client.
//!
//! Bridges the hosted checkout page with the internal wallet ledger:
//! initializes transactions, verifies them by reference, and authenticates
//! inbound webhooks via an HMAC-SHA512 signature over the raw request body.
//! Gateway statuses are normalized into [`GatewayVerification`] at the
//! boundary so settlement logic never branches on raw strings.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::AppError;

type HmacSha512 = Hmac<Sha512>;

/// Outbound requests are bounded so a hung gateway cannot pin a request
/// handler forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the payment gateway API.
#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Verification result for one payment reference, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerification {
    /// The gateway confirmed the charge; `amount_kobo` is what was settled.
    Success { amount_kobo: i64 },
    /// The charge failed or the customer abandoned the checkout page.
    Failed { reason: String },
    /// The charge has not reached a final state yet.
    Pending,
    /// A status this system does not recognize. Settlement refuses to act
    /// on it; the fail-safe default.
    Unknown { status: String },
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    /// Amount in minor units (kobo)
    amount: i64,
    reference: &'a str,
}

/// The gateway wraps every response in this envelope.
#[derive(Debug, Deserialize)]
struct GatewayEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    amount: Option<i64>,
    gateway_response: Option<String>,
}

impl PaystackClient {
    /// Build the client from configuration.
    ///
    /// Returns `Ok(None)` when no secret key is configured; funding and
    /// settlement flows then fail with a configuration error before
    /// touching any state.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(secret_key) = config.paystack_secret_key.clone() else {
            return Ok(None);
        };
        let base_url = Url::parse(&config.paystack_base_url)
            .map_err(|_| AppError::Configuration("PAYSTACK_BASE_URL is not a valid URL"))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|_| AppError::Configuration("failed to build gateway HTTP client"))?;
        Ok(Some(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            secret_key,
        }))
    }

    /// Initialize a hosted-checkout transaction.
    ///
    /// Returns the authorization URL the user should be redirected to.
    /// The gateway takes amounts in minor units; callers pass kobo.
    ///
    /// # Errors
    ///
    /// `GatewayUnavailable` on transport errors, non-JSON bodies, or a
    /// rejected initialization.
    pub async fn initialize(
        &self,
        email: &str,
        amount_kobo: i64,
        reference: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&InitializeRequest {
                email,
                amount: amount_kobo,
                reference,
            })
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("initialize failed: {e}")))?;

        let status = response.status();
        let envelope: GatewayEnvelope<InitializeData> = response.json().await.map_err(|e| {
            AppError::GatewayUnavailable(format!(
                "initialize response was not JSON (HTTP {status}): {e}"
            ))
        })?;

        if !envelope.status {
            return Err(AppError::GatewayUnavailable(format!(
                "initialize rejected: {}",
                envelope.message.unwrap_or_default()
            )));
        }

        envelope
            .data
            .map(|d| d.authorization_url)
            .ok_or_else(|| AppError::GatewayUnavailable("initialize response missing data".into()))
    }

    /// Verify a transaction by its reference.
    ///
    /// # Errors
    ///
    /// `GatewayUnavailable` on transport errors, non-JSON bodies, or an
    /// envelope the gateway itself flags as failed.
    pub async fn verify(&self, reference: &str) -> Result<GatewayVerification, AppError> {
        let response = self
            .http
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("verify failed: {e}")))?;

        let status = response.status();
        let envelope: GatewayEnvelope<VerifyData> = response.json().await.map_err(|e| {
            AppError::GatewayUnavailable(format!(
                "verify response was not JSON (HTTP {status}): {e}"
            ))
        })?;

        if !envelope.status {
            return Err(AppError::GatewayUnavailable(format!(
                "verify rejected: {}",
                envelope.message.unwrap_or_default()
            )));
        }

        let data = envelope
            .data
            .ok_or_else(|| AppError::GatewayUnavailable("verify response missing data".into()))?;

        Ok(classify_verification(
            &data.status,
            data.amount,
            data.gateway_response.as_deref(),
        ))
    }

    /// Check a webhook signature against the raw request body.
    ///
    /// Must be called before the body is parsed or any state is read; it is
    /// the sole authentication on the unauthenticated settlement path.
    pub fn verify_webhook_signature(&self, body: &[u8], signature_hex: &str) -> bool {
        verify_signature(&self.secret_key, body, signature_hex)
    }
}

/// Map a raw gateway status string to a typed verification result.
fn classify_verification(
    status: &str,
    amount_kobo: Option<i64>,
    gateway_response: Option<&str>,
) -> GatewayVerification {
    match status.to_ascii_lowercase().as_str() {
        "success" => GatewayVerification::Success {
            amount_kobo: amount_kobo.unwrap_or(0),
        },
        "failed" | "abandoned" => GatewayVerification::Failed {
            reason: gateway_response.unwrap_or(status).to_string(),
        },
        "pending" | "ongoing" | "processing" | "queued" => GatewayVerification::Pending,
        other => GatewayVerification::Unknown {
            status: other.to_string(),
        },
    }
}

/// HMAC-SHA512 webhook signature check.
///
/// The gateway signs the raw body with the shared secret and sends the hex
/// digest in a header. `Mac::verify_slice` does the comparison in constant
/// time.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Produce the hex signature the gateway would send.
    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_correctly_signed_body() {
        let body = br#"{"event":"charge.success","data":{"reference":"R1"}}"#;
        let signature = sign("sk_test_secret", body);
        assert!(verify_signature("sk_test_secret", body, &signature));
    }

    #[test]
    fn rejects_tampered_body() {
        let body = br#"{"event":"charge.success","data":{"reference":"R1","amount":100000}}"#;
        let signature = sign("sk_test_secret", body);
        let tampered = br#"{"event":"charge.success","data":{"reference":"R1","amount":999999}}"#;
        assert!(!verify_signature("sk_test_secret", tampered, &signature));
    }

    #[test]
    fn rejects_signature_from_wrong_secret() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign("sk_other_secret", body);
        assert!(!verify_signature("sk_test_secret", body, &signature));
    }

    #[test]
    fn rejects_garbage_signature_header() {
        assert!(!verify_signature("sk_test_secret", b"{}", "not-hex!"));
        assert!(!verify_signature("sk_test_secret", b"{}", ""));
    }

    #[test]
    fn classifies_success_with_settled_amount() {
        assert_eq!(
            classify_verification("success", Some(100_000), Some("Approved")),
            GatewayVerification::Success {
                amount_kobo: 100_000
            }
        );
    }

    #[test]
    fn classifies_failed_and_abandoned_as_failed() {
        assert_eq!(
            classify_verification("failed", None, Some("Declined")),
            GatewayVerification::Failed {
                reason: "Declined".to_string()
            }
        );
        assert_eq!(
            classify_verification("abandoned", None, None),
            GatewayVerification::Failed {
                reason: "abandoned".to_string()
            }
        );
    }

    #[test]
    fn classifies_in_flight_statuses_as_pending() {
        for status in ["pending", "ongoing", "processing", "queued", "PENDING"] {
            assert_eq!(
                classify_verification(status, None, None),
                GatewayVerification::Pending
            );
        }
    }

    #[test]
    fn unrecognized_statuses_are_not_acted_on() {
        assert_eq!(
            classify_verification("reversed", Some(5), None),
            GatewayVerification::Unknown {
                status: "reversed".to_string()
            }
        );
    }
}
