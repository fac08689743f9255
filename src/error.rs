//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Configuration Errors**: A required external credential is missing
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Invalid or missing bearer tokens, bad webhook signatures
/// - **Resource Errors**: Requested resources not found
/// - **Business Logic Errors**: Operations that violate wallet or dispute rules
/// - **External Dependency Errors**: The data vendor or payment gateway misbehaving
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A required credential for an external collaborator is not configured.
    ///
    /// Surfaced before any state change so a half-configured deployment
    /// never moves money. Returns HTTP 503 Service Unavailable.
    #[error("Service not configured: {0}")]
    Configuration(&'static str),

    /// Bearer token is missing, invalid, or revoked.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid authentication token")]
    Unauthorized,

    /// Caller is authenticated but not allowed to perform this action
    /// (non-admin on an admin route, or a banned account).
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Webhook signature did not match the locally computed HMAC.
    ///
    /// Returns HTTP 401 Unauthorized. The request body is never parsed
    /// when this is returned.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Requested transaction does not exist or doesn't belong to the caller.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// No wallet funding matches the supplied payment reference.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Funding not found")]
    FundingNotFound,

    /// Requested data plan does not exist in the vendor catalog.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Data plan not found")]
    PlanNotFound,

    /// Requested user does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("User not found")]
    UserNotFound,

    /// Wallet balance is insufficient for the requested purchase.
    ///
    /// Returns HTTP 422 Unprocessable Entity. Nothing has been written
    /// when this is returned; no compensation is needed.
    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    /// The vendor accepted our request but reported the purchase failed.
    ///
    /// Returns HTTP 422 Unprocessable Entity. The String is already a
    /// user-facing message produced by the vendor message mapper; the raw
    /// vendor payload stays server-side.
    #[error("{0}")]
    VendorRejected(String),

    /// The vendor could not be reached or returned garbage (non-2xx,
    /// non-JSON body, timeout).
    ///
    /// Returns HTTP 502 Bad Gateway with a generic body; the detail
    /// is logged only.
    #[error("Vendor unavailable: {0}")]
    VendorUnavailable(String),

    /// The payment gateway could not be reached or returned an
    /// unrecognized response.
    ///
    /// Returns HTTP 502 Bad Gateway with a generic body; the detail
    /// is logged only.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The operation lost an optimistic-concurrency race or the record is
    /// no longer in a state that allows it (e.g., a dispute that another
    /// admin already resolved).
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Propagation Policy
///
/// Internal detail (sqlx errors, raw vendor/gateway payloads) is logged
/// server-side and replaced with a short generic message in the response
/// body. End users only ever see mapped strings.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::Configuration(detail) => {
                tracing::error!(%detail, "request rejected: missing configuration");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "not_configured",
                    "This service is not available right now".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                self.to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.to_string()),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                self.to_string(),
            ),
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::FundingNotFound => {
                (StatusCode::NOT_FOUND, "funding_not_found", self.to_string())
            }
            AppError::PlanNotFound => (StatusCode::NOT_FOUND, "plan_not_found", self.to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::VendorRejected(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "purchase_failed",
                msg.clone(),
            ),
            AppError::VendorUnavailable(ref detail) => {
                tracing::error!(%detail, "vendor request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "vendor_unavailable",
                    "The data vendor is unreachable. You have not been charged.".to_string(),
                )
            }
            AppError::GatewayUnavailable(ref detail) => {
                tracing::error!(%detail, "payment gateway request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "gateway_unavailable",
                    "The payment gateway is unreachable. Please try again later.".to_string(),
                )
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
