//! Bearer-token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the bearer token from the Authorization header
//! 2. Hash it and verify it exists in the database
//! 3. Reject banned accounts
//! 4. Inject the caller's identity into the request
//!
//! Admin routes additionally pass through [`require_admin`], which checks
//! the injected role before any handler runs.

use crate::{error::AppError, models::user::UserRole, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated user
    pub user_id: Uuid,

    /// The user's role; admin routes require [`UserRole::Admin`]
    pub role: UserRole,
}

impl AuthContext {
    /// Whether this caller may act on resources owned by `owner_id`.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.role == UserRole::Admin
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthRow {
    id: Uuid,
    role: UserRole,
    is_banned: bool,
}

/// Bearer-token authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query database for an active token with that hash, joined to its user
/// 4. If the user is banned: return 403 with no further processing
/// 5. Otherwise inject `AuthContext` and call the next handler
///
/// # Errors
///
/// - `Unauthorized` if the header is missing or no active token matches
/// - `Forbidden` if the account is banned
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Step 1: Extract Authorization header
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    // Step 2: Extract bearer token
    // Expected format: "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    // Step 3: Hash the token using SHA-256
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let token_hash = hex::encode(hasher.finalize());

    // Step 4: Look up the hashed token and its owner
    let row = sqlx::query_as::<_, AuthRow>(
        r#"
        SELECT u.id, u.role, u.is_banned
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1 AND t.is_active = true
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    // Step 5: Banned accounts are rejected on every request
    if row.is_banned {
        return Err(AppError::Forbidden("Account suspended"));
    }

    // Step 6: Inject context into request extensions
    request.extensions_mut().insert(AuthContext {
        user_id: row.id,
        role: row.role,
    });

    Ok(next.run(request).await)
}

/// Admin-only guard, layered on top of [`auth_middleware`].
///
/// Runs after authentication, so the context is already in the request
/// extensions; a missing context means the layering is wrong and is
/// treated as unauthorized.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::Unauthorized)?;

    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden("Administrator access required"));
    }

    Ok(next.run(request).await)
}
