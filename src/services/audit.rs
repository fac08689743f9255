//! Append-only admin audit trail.
//!
//! Every admin action that changes money or configuration records an entry
//! here. Writes are best-effort on purpose: by the time the audit runs,
//! the financial action has already committed, so a logging failure is
//! warned about and swallowed rather than failing the request.

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::audit::AuditLog;

/// Record one admin action. Never fails the caller.
pub async fn record(
    pool: &DbPool,
    admin_id: Uuid,
    action: &str,
    target_table: &str,
    target_id: Option<String>,
    details: serde_json::Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (admin_id, action, target_table, target_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(admin_id)
    .bind(action)
    .bind(target_table)
    .bind(target_id)
    .bind(details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, action, target_table, "audit log write failed");
    }
}

/// Newest-first page of the audit trail.
pub async fn list(pool: &DbPool, limit: i64) -> Result<Vec<AuditLog>, AppError> {
    let logs = sqlx::query_as::<_, AuditLog>(
        "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(logs)
}
