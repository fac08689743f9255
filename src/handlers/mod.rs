//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to the service layer for business logic
//! 3. Returns HTTP response (JSON, status code)

/// Admin user management and audit trail endpoints
pub mod admin;
/// Dispute filing and resolution endpoints
pub mod disputes;
/// Health check endpoint
pub mod health;
/// Data plan catalog and pricing endpoints
pub mod plans;
/// Data purchase and transaction history endpoints
pub mod transactions;
/// Wallet balance and funding endpoints
pub mod wallet;
/// Inbound payment gateway webhook
pub mod webhooks;
