//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They own the database transactions, the compensation steps, and the
//! idempotency guards around money movement.

/// Append-only admin audit trail
pub mod audit;
/// Dispute filing and admin resolution
pub mod dispute;
/// Vendor catalog merged with local pricing overrides
pub mod plans;
/// The synchronous data purchase saga
pub mod purchase;
/// Idempotent wallet funding settlement
pub mod settlement;
/// Atomic wallet ledger operations
pub mod wallet;
