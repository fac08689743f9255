//! Wallet funding models and API request/response types.
//!
//! A `WalletFunding` row reserves the handshake with the payment gateway.
//! It is created in `pending` status before the user is redirected to the
//! hosted payment page, and settled later by the webhook or a verification
//! call. Settlement also inserts the matching `wallet_funding` Transaction
//! and credits the wallet, all inside one database transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Minimum accepted funding amount, in naira.
pub const MIN_FUNDING_NAIRA: i64 = 100;

/// Maximum accepted funding amount, in naira.
pub const MAX_FUNDING_NAIRA: i64 = 500_000;

/// Funding attempt lifecycle, stored as a Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "funding_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FundingStatus {
    Pending,
    Completed,
    Failed,
}

/// Represents a wallet funding attempt from the database.
///
/// # Database Table
///
/// Maps to the `wallet_fundings` table. `payment_reference` is unique and
/// is the only key the gateway hands back, so all settlement paths are
/// driven off it.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WalletFunding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_kobo: i64,
    pub payment_method: String,
    pub status: FundingStatus,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to start funding the wallet.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount_naira": 1000,
///   "payment_method": "card"
/// }
/// ```
///
/// The amount is taken in whole naira at this one boundary and converted
/// to kobo before it is stored or sent to the gateway.
#[derive(Debug, Deserialize)]
pub struct InitiateFundingRequest {
    /// Amount to add to the wallet, in naira
    pub amount_naira: i64,

    /// Payment channel, defaults to "card"
    pub payment_method: Option<String>,
}

impl InitiateFundingRequest {
    /// Validate the requested amount and convert it to kobo.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when the amount is outside the accepted
    /// funding bounds.
    pub fn amount_kobo(&self) -> Result<i64, AppError> {
        if self.amount_naira < MIN_FUNDING_NAIRA || self.amount_naira > MAX_FUNDING_NAIRA {
            return Err(AppError::InvalidRequest(format!(
                "Amount must be between \u{20a6}{MIN_FUNDING_NAIRA} and \u{20a6}{MAX_FUNDING_NAIRA}"
            )));
        }
        Ok(self.amount_naira * 100)
    }
}

/// Response after initiating a funding.
///
/// # JSON Example
///
/// ```json
/// {
///   "reference": "fund_9f8a6c...",
///   "authorization_url": "https://checkout.paystack.com/abc123"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct InitiateFundingResponse {
    pub reference: String,
    pub authorization_url: String,
}

/// Request to verify (and settle) a funding by its gateway reference.
#[derive(Debug, Deserialize)]
pub struct VerifyFundingRequest {
    pub reference: String,
}

/// Funding shape returned in wallet listings.
#[derive(Debug, Serialize)]
pub struct FundingResponse {
    pub id: Uuid,
    pub amount_kobo: i64,
    pub payment_method: String,
    pub status: FundingStatus,
    pub payment_reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<WalletFunding> for FundingResponse {
    fn from(f: WalletFunding) -> Self {
        Self {
            id: f.id,
            amount_kobo: f.amount_kobo,
            payment_method: f.payment_method,
            status: f.status,
            payment_reference: f.payment_reference,
            created_at: f.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount_naira: i64) -> InitiateFundingRequest {
        InitiateFundingRequest {
            amount_naira,
            payment_method: None,
        }
    }

    #[test]
    fn converts_naira_to_kobo() {
        assert_eq!(request(1000).amount_kobo().unwrap(), 100_000);
        assert_eq!(request(MIN_FUNDING_NAIRA).amount_kobo().unwrap(), 10_000);
    }

    #[test]
    fn rejects_out_of_bounds_amounts() {
        assert!(request(MIN_FUNDING_NAIRA - 1).amount_kobo().is_err());
        assert!(request(0).amount_kobo().is_err());
        assert!(request(-50).amount_kobo().is_err());
        assert!(request(MAX_FUNDING_NAIRA + 1).amount_kobo().is_err());
    }

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(request(MIN_FUNDING_NAIRA).amount_kobo().is_ok());
        assert!(request(MAX_FUNDING_NAIRA).amount_kobo().is_ok());
    }
}
