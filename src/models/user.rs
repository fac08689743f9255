//! User account model.
//!
//! Users own a wallet balance, a role, and a ban state. The balance column
//! is only ever mutated by the atomic updates in the wallet service, never
//! read-then-written by handler code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role, stored as a Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Each user:
/// - Owns exactly one wallet balance, stored in kobo (never floats)
/// - Has a role gating access to the admin API surface
/// - Can be banned, which blocks authentication entirely
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    /// Unique identifier for this user
    pub id: Uuid,

    /// Login email, unique across the platform
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Contact phone number, if provided
    pub phone_number: Option<String>,

    /// Access role (`user` or `admin`)
    pub role: UserRole,

    /// Current wallet balance in kobo
    ///
    /// Must be >= 0 (enforced by database CHECK constraint).
    /// Mutated only through single-statement atomic increments/decrements.
    pub wallet_balance_kobo: i64,

    /// Banned users fail authentication on every request
    pub is_banned: bool,

    /// Timestamp when this user was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last profile or balance update
    pub updated_at: DateTime<Utc>,
}

/// User shape returned to admin listings.
///
/// Strips nothing today, but keeps the wire shape decoupled from the
/// database row.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub wallet_balance_kobo: i64,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            role: user.role,
            wallet_balance_kobo: user.wallet_balance_kobo,
            is_banned: user.is_banned,
            created_at: user.created_at,
        }
    }
}
