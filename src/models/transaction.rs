//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Database entity representing a money movement
//! - `TransactionStatus`/`TransactionType`: Postgres enums with the
//!   allowed status transition graph
//! - Request types for data purchases and dispute filing/resolution
//! - `TransactionResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of money movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Wallet balance converted into a vendor-delivered data bundle
    DataPurchase,
    /// Gateway payment settled into the wallet
    WalletFunding,
}

/// Transaction lifecycle status, stored as a Postgres enum.
///
/// The allowed transitions form a small directed graph:
///
/// ```text
/// pending ──> completed ──> disputed ──> refunded
///    │                          │    └─> dispute_rejected
///    └──────> failed            └──────> under_review ──> refunded
///                                                     └─> dispute_rejected
/// ```
///
/// `failed`, `refunded`, and `dispute_rejected` are terminal; nothing moves
/// a transaction out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Disputed,
    UnderReview,
    Refunded,
    DisputeRejected,
}

impl TransactionStatus {
    /// Whether moving from `self` to `next` is an allowed transition.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Completed)
                | (Pending, Failed)
                | (Completed, Disputed)
                | (Disputed, Refunded)
                | (Disputed, DisputeRejected)
                | (Disputed, UnderReview)
                | (UnderReview, Refunded)
                | (UnderReview, DisputeRejected)
        )
    }

    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Failed
                | TransactionStatus::Refunded
                | TransactionStatus::DisputeRejected
        )
    }

    /// Wire/database spelling of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Disputed => "disputed",
            TransactionStatus::UnderReview => "under_review",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::DisputeRejected => "dispute_rejected",
        }
    }

    /// States an admin is allowed to resolve from.
    pub fn is_resolvable(self) -> bool {
        matches!(
            self,
            TransactionStatus::Disputed | TransactionStatus::UnderReview
        )
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Rows are created in `pending` status
/// immediately before money moves and are updated in place afterwards;
/// they are never deleted. Disputes mutate status and dispute fields on
/// the same row rather than creating new rows.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    /// Unique identifier for this transaction
    pub id: Uuid,

    /// Owner of the wallet this transaction moved money for
    pub user_id: Uuid,

    /// Data purchase or wallet funding
    pub transaction_type: TransactionType,

    /// Amount in kobo
    ///
    /// Must be positive (enforced by CHECK constraint)
    pub amount_kobo: i64,

    /// Current lifecycle status
    pub status: TransactionStatus,

    /// Mobile network the bundle was bought on (data purchases)
    pub network_code: Option<String>,

    /// Recipient phone number (data purchases)
    pub phone_number: Option<String>,

    /// Bundle size, e.g. "1.0 GB" (data purchases)
    pub data_size: Option<String>,

    /// Bundle validity, e.g. "30 days" (data purchases)
    pub duration: Option<String>,

    /// Vendor-assigned transaction id
    ///
    /// Unique where present; a duplicate vendor callback dedupes on it.
    pub vendor_transaction_id: Option<String>,

    /// Raw vendor payload, stored for audit/debugging
    pub vendor_response: Option<serde_json::Value>,

    /// Gateway payment reference (wallet fundings)
    ///
    /// Unique where present; a replayed webhook dedupes on it.
    pub payment_reference: Option<String>,

    /// Payment channel used for the funding (e.g. "card")
    pub payment_method: Option<String>,

    /// Back-reference to the WalletFunding row (wallet fundings)
    pub funding_id: Option<Uuid>,

    /// Category the user selected when filing a dispute
    pub dispute_type: Option<String>,

    /// Free-text note from the user's dispute
    pub dispute_note: Option<String>,

    /// Failure detail attached when a purchase goes wrong
    pub error_message: Option<String>,

    /// Admin's note when closing a dispute
    pub admin_resolution: Option<String>,

    /// Admin who resolved the dispute
    pub resolved_by: Option<Uuid>,

    /// When the dispute was resolved
    pub resolved_at: Option<DateTime<Utc>>,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Request to purchase a data bundle.
///
/// # JSON Example
///
/// ```json
/// {
///   "plan_id": 241,
///   "phone_number": "08031234567",
///   "ported_number": false
/// }
/// ```
///
/// The price is resolved server-side from the vendor catalog plus the
/// local markup; a client-supplied amount is never trusted.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Vendor catalog plan id
    pub plan_id: i64,

    /// Recipient phone number
    pub phone_number: String,

    /// Whether the number was ported between networks
    #[serde(default)]
    pub ported_number: bool,
}

/// Request to open a dispute on a completed transaction.
///
/// # JSON Example
///
/// ```json
/// {
///   "dispute_type": "not_delivered",
///   "note": "Bundle never arrived on my line"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct DisputeRequest {
    /// Category of the complaint
    pub dispute_type: String,

    /// Optional free-text detail
    pub note: Option<String>,
}

/// Explicit status override an admin may request instead of closing a
/// wallet-funding dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StatusOverride {
    /// Keep the case open for further review
    #[serde(rename = "pending_review", alias = "under_review")]
    PendingReview,
}

/// Request to resolve a dispute.
///
/// Exactly one of three outcomes is selected by the combination of
/// `refund` and `status_override`:
///
/// - `refund: true` - credit the user and mark the transaction `refunded`
/// - `refund: false, status_override: "pending_review"` - mark `under_review`
/// - `refund: false` - mark `dispute_rejected`
///
/// # JSON Example
///
/// ```json
/// {
///   "refund": true,
///   "refund_amount_kobo": 30000,
///   "note": "Partial refund, gateway settled short"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    /// Whether to credit money back to the user
    pub refund: bool,

    /// Optional partial amount; defaults to the full transaction amount.
    /// Only valid for wallet-funding disputes.
    pub refund_amount_kobo: Option<i64>,

    /// Optional admin note recorded on the transaction
    pub note: Option<String>,

    /// Optional explicit override instead of rejecting
    pub status_override: Option<StatusOverride>,
}

/// Response returned for transaction operations.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub amount_kobo: i64,
    pub status: TransactionStatus,
    pub network_code: Option<String>,
    pub phone_number: Option<String>,
    pub data_size: Option<String>,
    pub duration: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_method: Option<String>,
    pub dispute_type: Option<String>,
    pub dispute_note: Option<String>,
    pub error_message: Option<String>,
    pub admin_resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert database Transaction to API TransactionResponse.
///
/// This removes internal fields like the raw vendor payload and the
/// resolving admin's id that clients don't need to see.
impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            transaction_type: t.transaction_type,
            amount_kobo: t.amount_kobo,
            status: t.status,
            network_code: t.network_code,
            phone_number: t.phone_number,
            data_size: t.data_size,
            duration: t.duration,
            payment_reference: t.payment_reference,
            payment_method: t.payment_method,
            dispute_type: t.dispute_type,
            dispute_note: t.dispute_note,
            error_message: t.error_message,
            admin_resolution: t.admin_resolution,
            resolved_at: t.resolved_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionStatus::*;

    #[test]
    fn pending_resolves_to_completed_or_failed() {
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Disputed));
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn only_completed_transactions_can_be_disputed() {
        assert!(Completed.can_transition_to(Disputed));
        assert!(!Pending.can_transition_to(Disputed));
        assert!(!Failed.can_transition_to(Disputed));
        assert!(!Refunded.can_transition_to(Disputed));
    }

    #[test]
    fn disputed_has_three_outcomes() {
        assert!(Disputed.can_transition_to(Refunded));
        assert!(Disputed.can_transition_to(DisputeRejected));
        assert!(Disputed.can_transition_to(UnderReview));
        assert!(!Disputed.can_transition_to(Completed));
    }

    #[test]
    fn under_review_closes_but_never_reopens() {
        assert!(UnderReview.can_transition_to(Refunded));
        assert!(UnderReview.can_transition_to(DisputeRejected));
        assert!(!UnderReview.can_transition_to(Disputed));
        assert!(!UnderReview.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states_never_transition() {
        for terminal in [Failed, Refunded, DisputeRejected] {
            assert!(terminal.is_terminal());
            for next in [
                Pending,
                Completed,
                Failed,
                Disputed,
                UnderReview,
                Refunded,
                DisputeRejected,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn only_open_disputes_are_resolvable() {
        assert!(Disputed.is_resolvable());
        assert!(UnderReview.is_resolvable());
        assert!(!Completed.is_resolvable());
        assert!(!Refunded.is_resolvable());
        assert!(!DisputeRejected.is_resolvable());
    }

    #[test]
    fn no_transition_loops_back_into_itself() {
        for status in [
            Pending,
            Completed,
            Failed,
            Disputed,
            UnderReview,
            Refunded,
            DisputeRejected,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }
}
