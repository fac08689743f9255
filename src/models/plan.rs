//! Data plan models: the vendor catalog merged with local pricing overrides.
//!
//! The vendor owns the catalog; this platform only stores a per-plan markup
//! and an enabled flag. The merged, priced view is what users see and what
//! purchases are priced from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A plan as parsed out of the vendor catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPlan {
    /// Vendor catalog id, used in purchase calls
    pub plan_id: i64,
    /// Network name, e.g. "MTN"
    pub network: String,
    /// Vendor's numeric network code, sent in purchase calls
    pub network_code: i64,
    /// Bundle size, e.g. "1.0 GB"
    pub data_size: String,
    /// Validity, e.g. "30 days"
    pub duration: String,
    /// Vendor price in kobo
    pub vendor_price_kobo: i64,
}

/// Locally stored pricing override for one vendor plan.
///
/// # Database Table
///
/// Maps to the `plan_overrides` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PlanOverride {
    pub plan_id: i64,
    pub network: String,
    pub markup_kobo: i64,
    pub is_enabled: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// A vendor plan merged with its override: what the platform actually sells.
#[derive(Debug, Clone, Serialize)]
pub struct PricedPlan {
    pub plan_id: i64,
    pub network: String,
    pub data_size: String,
    pub duration: String,
    /// Selling price in kobo: vendor price plus markup
    pub price_kobo: i64,
    /// Local markup component of the price
    pub markup_kobo: i64,
    pub is_enabled: bool,
}

impl PricedPlan {
    pub fn merge(plan: &VendorPlan, override_row: Option<&PlanOverride>) -> Self {
        let markup_kobo = override_row.map(|o| o.markup_kobo).unwrap_or(0);
        let is_enabled = override_row.map(|o| o.is_enabled).unwrap_or(true);
        Self {
            plan_id: plan.plan_id,
            network: plan.network.clone(),
            data_size: plan.data_size.clone(),
            duration: plan.duration.clone(),
            price_kobo: plan.vendor_price_kobo + markup_kobo,
            markup_kobo,
            is_enabled,
        }
    }
}

/// Request to set or update a plan's override.
///
/// # JSON Example
///
/// ```json
/// {
///   "markup_kobo": 2000,
///   "is_enabled": true
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct UpsertPlanOverrideRequest {
    /// Markup added on top of the vendor price, in kobo (>= 0)
    pub markup_kobo: i64,

    /// Whether the plan is purchasable on this platform
    pub is_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_plan() -> VendorPlan {
        VendorPlan {
            plan_id: 7,
            network: "MTN".to_string(),
            network_code: 1,
            data_size: "1.0 GB".to_string(),
            duration: "30 days".to_string(),
            vendor_price_kobo: 24_100,
        }
    }

    #[test]
    fn merge_without_override_sells_at_vendor_price() {
        let priced = PricedPlan::merge(&vendor_plan(), None);
        assert_eq!(priced.price_kobo, 24_100);
        assert_eq!(priced.markup_kobo, 0);
        assert!(priced.is_enabled);
    }

    #[test]
    fn merge_adds_markup_and_carries_enabled_flag() {
        let override_row = PlanOverride {
            plan_id: 7,
            network: "MTN".to_string(),
            markup_kobo: 2_000,
            is_enabled: false,
            updated_by: None,
            updated_at: chrono::Utc::now(),
        };
        let priced = PricedPlan::merge(&vendor_plan(), Some(&override_row));
        assert_eq!(priced.price_kobo, 26_100);
        assert_eq!(priced.markup_kobo, 2_000);
        assert!(!priced.is_enabled);
    }
}
