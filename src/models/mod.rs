//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Append-only admin audit trail
pub mod audit;
/// Wallet funding attempts
pub mod funding;
/// Vendor data plans and local pricing overrides
pub mod plan;
/// Financial transaction records and their status machine
pub mod transaction;
/// User accounts and roles
pub mod user;
