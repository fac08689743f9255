//! Data vendor API client.
//!
//! Talks to the VTU vendor that actually delivers data bundles. The vendor's
//! responses are duck-typed (the success field may be spelled `status` or
//! `Status`, the error may live in `error[0]` or `message`, prices arrive as
//! decimal-naira strings), so every response is normalized into a typed
//! `VendorOutcome` the moment it is received. Nothing outside this module
//! ever inspects a raw vendor payload.

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::AppError;
use crate::models::plan::VendorPlan;

/// Outbound requests are bounded so a hung vendor cannot pin a request
/// handler forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the data vendor API.
#[derive(Clone)]
pub struct VtuClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

/// Purchase request body the vendor expects.
///
/// The odd `Ported_number` capitalization is the vendor's, not ours.
#[derive(Debug, Serialize)]
pub struct VendorPurchase {
    pub network: i64,
    pub mobile_number: String,
    pub plan: i64,
    #[serde(rename = "Ported_number")]
    pub ported_number: bool,
}

/// A vendor response, normalized.
#[derive(Debug)]
pub enum VendorOutcome {
    /// The vendor confirmed delivery of the bundle.
    Delivered {
        /// Vendor-assigned transaction id, when present
        vendor_tx_id: Option<String>,
        /// Full payload, stored on the transaction row for audit
        raw: Value,
    },
    /// The vendor processed the request but reported a failure.
    Rejected {
        /// User-facing message, already passed through [`map_vendor_message`]
        message: String,
        /// Full payload, stored on the transaction row for audit
        raw: Value,
    },
}

impl VtuClient {
    /// Build the client from configuration.
    ///
    /// Returns `Ok(None)` when no API token is configured; purchase flows
    /// then fail with a configuration error before touching any state.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(api_token) = config.vtu_api_token.clone() else {
            return Ok(None);
        };
        let base_url = Url::parse(&config.vtu_base_url)
            .map_err(|_| AppError::Configuration("VTU_BASE_URL is not a valid URL"))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|_| AppError::Configuration("failed to build vendor HTTP client"))?;
        Ok(Some(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_token,
        }))
    }

    /// Fetch the vendor's data plan catalog.
    ///
    /// # Errors
    ///
    /// `VendorUnavailable` on transport errors, non-2xx responses, or
    /// bodies that don't parse as JSON.
    pub async fn fetch_catalog(&self) -> Result<Vec<VendorPlan>, AppError> {
        let response = self
            .http
            .get(format!("{}/api/user", self.base_url))
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .send()
            .await
            .map_err(|e| AppError::VendorUnavailable(format!("catalog request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::VendorUnavailable(format!(
                "catalog request returned HTTP {status}"
            )));
        }

        let raw: Value = response.json().await.map_err(|e| {
            AppError::VendorUnavailable(format!("catalog response was not JSON: {e}"))
        })?;

        Ok(parse_catalog(&raw))
    }

    /// Submit a data bundle purchase.
    ///
    /// The raw response is normalized into a [`VendorOutcome`] here; callers
    /// only ever see a tagged success/failure variant.
    ///
    /// # Errors
    ///
    /// `VendorUnavailable` on transport errors or bodies that don't parse
    /// as JSON. A non-2xx status with a JSON body is still classified, so
    /// vendor-reported failures keep their message.
    pub async fn purchase(&self, request: &VendorPurchase) -> Result<VendorOutcome, AppError> {
        let response = self
            .http
            .post(format!("{}/api/data/", self.base_url))
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::VendorUnavailable(format!("purchase request failed: {e}")))?;

        let status = response.status();
        let raw: Value = response.json().await.map_err(|e| {
            AppError::VendorUnavailable(format!(
                "purchase response was not JSON (HTTP {status}): {e}"
            ))
        })?;

        Ok(classify_outcome(raw))
    }
}

/// Decide whether a vendor payload is a delivery or a rejection.
///
/// Success is a case-insensitive `"successful"` under either the `status`
/// or the `Status` key; both spellings occur in the wild. Anything else is
/// a rejection carrying the best message we can extract.
fn classify_outcome(raw: Value) -> VendorOutcome {
    let delivered = raw
        .get("status")
        .or_else(|| raw.get("Status"))
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("successful"));

    if delivered {
        let vendor_tx_id = raw.get("id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        VendorOutcome::Delivered { vendor_tx_id, raw }
    } else {
        let message = map_vendor_message(
            vendor_error_message(&raw).as_deref().unwrap_or_default(),
        );
        VendorOutcome::Rejected { message, raw }
    }
}

/// Pull the failure text out of a vendor payload.
///
/// The vendor reports errors as either `error[0]` or `message`.
fn vendor_error_message(raw: &Value) -> Option<String> {
    if let Some(errors) = raw.get("error") {
        match errors {
            Value::Array(items) => {
                if let Some(first) = items.first().and_then(Value::as_str) {
                    return Some(first.to_string());
                }
            }
            Value::String(s) => return Some(s.clone()),
            _ => {}
        }
    }
    raw.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Translate a raw vendor failure into a short user-facing message.
///
/// Known failure substrings get a specific message; everything else falls
/// back to a generic one. The raw text is logged by the caller, never shown
/// to the user.
pub fn map_vendor_message(raw_message: &str) -> String {
    let lowered = raw_message.to_lowercase();

    if lowered.contains("invalid") && (lowered.contains("number") || lowered.contains("mobile")) {
        return "The phone number provided is invalid.".to_string();
    }
    // Vendor-side balance problems are ours to fix, not the user's.
    if lowered.contains("insufficient") {
        return "Service is temporarily unavailable. Please try again shortly.".to_string();
    }
    if lowered.contains("plan")
        && (lowered.contains("unavailable")
            || lowered.contains("not available")
            || lowered.contains("disabled"))
    {
        return "The selected plan is currently unavailable.".to_string();
    }

    "Your purchase could not be completed. Please try again or contact support.".to_string()
}

/// Parse the plan catalog out of the vendor's account payload.
///
/// The catalog lives under `Dataplans`, an object of per-network arrays.
/// Entries that don't carry the fields we need are skipped rather than
/// failing the whole catalog.
fn parse_catalog(raw: &Value) -> Vec<VendorPlan> {
    let Some(groups) = raw.get("Dataplans").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut plans: Vec<VendorPlan> = groups
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(parse_plan_entry)
        .collect();

    plans.sort_by(|a, b| (a.network.as_str(), a.plan_id).cmp(&(b.network.as_str(), b.plan_id)));
    plans
}

fn parse_plan_entry(entry: &Value) -> Option<VendorPlan> {
    let plan_id = entry.get("id").and_then(Value::as_i64)?;
    let network = entry
        .get("plan_network")
        .and_then(Value::as_str)?
        .trim()
        .to_string();
    let network_code = entry
        .get("network")
        .and_then(Value::as_i64)
        .or_else(|| network_code_for(&network))?;
    let data_size = entry.get("plan").and_then(Value::as_str)?.trim().to_string();
    let duration = entry
        .get("month_validate")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    let vendor_price_kobo = match entry.get("plan_amount")? {
        Value::String(s) => naira_str_to_kobo(s)?,
        Value::Number(n) => naira_str_to_kobo(&n.to_string())?,
        _ => return None,
    };

    Some(VendorPlan {
        plan_id,
        network,
        network_code,
        data_size,
        duration,
        vendor_price_kobo,
    })
}

/// Vendor network codes for catalog entries that only carry the name.
fn network_code_for(network: &str) -> Option<i64> {
    match network.to_ascii_uppercase().as_str() {
        "MTN" => Some(1),
        "GLO" => Some(2),
        "9MOBILE" | "ETISALAT" => Some(3),
        "AIRTEL" => Some(4),
        _ => None,
    }
}

/// Parse a decimal-naira string (e.g. `"241.0"`, `"1,000"`) into kobo
/// without going through floating point. Sub-kobo digits are dropped.
fn naira_str_to_kobo(s: &str) -> Option<i64> {
    let cleaned = s.trim().replace(',', "");
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let frac_kobo: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac[..2].parse().ok()?,
    };

    Some(whole * 100 + frac_kobo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_accepts_lowercase_status_key() {
        let outcome = classify_outcome(json!({"status": "successful", "id": 8841}));
        match outcome {
            VendorOutcome::Delivered { vendor_tx_id, .. } => {
                assert_eq!(vendor_tx_id.as_deref(), Some("8841"));
            }
            VendorOutcome::Rejected { .. } => panic!("expected delivery"),
        }
    }

    #[test]
    fn classify_accepts_capitalized_status_key_and_mixed_case_value() {
        let outcome = classify_outcome(json!({"Status": "Successful", "id": "TX-99"}));
        match outcome {
            VendorOutcome::Delivered { vendor_tx_id, .. } => {
                assert_eq!(vendor_tx_id.as_deref(), Some("TX-99"));
            }
            VendorOutcome::Rejected { .. } => panic!("expected delivery"),
        }
    }

    #[test]
    fn classify_rejects_anything_else() {
        let outcome = classify_outcome(json!({"status": "fail", "error": ["Invalid mobile number"]}));
        match outcome {
            VendorOutcome::Rejected { message, .. } => {
                assert_eq!(message, "The phone number provided is invalid.");
            }
            VendorOutcome::Delivered { .. } => panic!("expected rejection"),
        }
    }

    #[test]
    fn classify_handles_missing_status_field() {
        let outcome = classify_outcome(json!({"message": "something broke"}));
        assert!(matches!(outcome, VendorOutcome::Rejected { .. }));
    }

    #[test]
    fn error_message_prefers_error_array_then_message() {
        assert_eq!(
            vendor_error_message(&json!({"error": ["first", "second"], "message": "other"})),
            Some("first".to_string())
        );
        assert_eq!(
            vendor_error_message(&json!({"message": "plain message"})),
            Some("plain message".to_string())
        );
        assert_eq!(vendor_error_message(&json!({"status": "fail"})), None);
    }

    #[test]
    fn known_vendor_failures_map_to_specific_messages() {
        assert_eq!(
            map_vendor_message("INVALID MOBILE NUMBER"),
            "The phone number provided is invalid."
        );
        assert_eq!(
            map_vendor_message("insufficient account balance"),
            "Service is temporarily unavailable. Please try again shortly."
        );
        assert_eq!(
            map_vendor_message("This plan is currently unavailable"),
            "The selected plan is currently unavailable."
        );
    }

    #[test]
    fn unknown_vendor_failures_fall_back_to_generic_message() {
        assert_eq!(
            map_vendor_message("E_UNKNOWN_41"),
            "Your purchase could not be completed. Please try again or contact support."
        );
        assert_eq!(
            map_vendor_message(""),
            "Your purchase could not be completed. Please try again or contact support."
        );
    }

    #[test]
    fn parses_decimal_naira_strings_without_floats() {
        assert_eq!(naira_str_to_kobo("241"), Some(24_100));
        assert_eq!(naira_str_to_kobo("241.0"), Some(24_100));
        assert_eq!(naira_str_to_kobo("241.5"), Some(24_150));
        assert_eq!(naira_str_to_kobo("241.50"), Some(24_150));
        assert_eq!(naira_str_to_kobo("1,000.25"), Some(100_025));
        assert_eq!(naira_str_to_kobo(" 50 "), Some(5_000));
    }

    #[test]
    fn rejects_malformed_price_strings() {
        assert_eq!(naira_str_to_kobo(""), None);
        assert_eq!(naira_str_to_kobo("-241"), None);
        assert_eq!(naira_str_to_kobo("abc"), None);
        assert_eq!(naira_str_to_kobo("241.x"), None);
    }

    #[test]
    fn parses_catalog_entries_and_skips_malformed_ones() {
        let raw = json!({
            "user": {"username": "reseller"},
            "Dataplans": {
                "MTN_PLAN": [
                    {
                        "id": 7,
                        "network": 1,
                        "plan_network": "MTN",
                        "plan": "1.0 GB",
                        "month_validate": "30 days",
                        "plan_amount": "241.0"
                    },
                    {"id": 8, "plan_network": "MTN"}
                ],
                "GLO_PLAN": [
                    {
                        "id": 21,
                        "plan_network": "GLO",
                        "plan": "2.0 GB",
                        "month_validate": "14 days",
                        "plan_amount": "460"
                    }
                ]
            }
        });

        let plans = parse_catalog(&raw);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].network, "GLO");
        // GLO entry has no numeric network field; the name mapping fills it in.
        assert_eq!(plans[0].network_code, 2);
        assert_eq!(plans[0].vendor_price_kobo, 46_000);
        assert_eq!(plans[1].plan_id, 7);
        assert_eq!(plans[1].vendor_price_kobo, 24_100);
    }

    #[test]
    fn catalog_without_dataplans_is_empty() {
        assert!(parse_catalog(&json!({"user": {}})).is_empty());
    }
}
