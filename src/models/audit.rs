//! Admin activity audit trail model.
//!
//! Append-only from the application's perspective: rows are inserted by the
//! audit service and never updated or deleted by the core flows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One audited admin action.
///
/// # Database Table
///
/// Maps to the `audit_logs` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AuditLog {
    pub id: Uuid,

    /// Admin who performed the action
    pub admin_id: Uuid,

    /// Action name, e.g. "dispute_resolved" or "plan_override_set"
    pub action: String,

    /// Table the action targeted
    pub target_table: String,

    /// Primary key of the targeted row, stringified
    pub target_id: Option<String>,

    /// Structured action payload (previous/new status, amounts, notes)
    pub details: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}
