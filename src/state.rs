//! Shared application state.
//!
//! Constructed once at bootstrap and cloned into every handler via Axum's
//! `State` extractor. Nothing here is ambient or global: the process owns
//! the lifecycle of the pool and both external clients.

use crate::clients::{PaystackClient, VtuClient};
use crate::db::DbPool;
use crate::error::AppError;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: DbPool,

    /// Data vendor client; `None` when VTU_API_TOKEN is not set
    pub vtu: Option<VtuClient>,

    /// Payment gateway client; `None` when PAYSTACK_SECRET_KEY is not set
    pub paystack: Option<PaystackClient>,
}

impl AppState {
    /// Data vendor client, or a configuration error before any state change.
    pub fn vtu(&self) -> Result<&VtuClient, AppError> {
        self.vtu
            .as_ref()
            .ok_or(AppError::Configuration("data vendor credentials are not set"))
    }

    /// Payment gateway client, or a configuration error before any state change.
    pub fn paystack(&self) -> Result<&PaystackClient, AppError> {
        self.paystack
            .as_ref()
            .ok_or(AppError::Configuration("payment gateway credentials are not set"))
    }
}
