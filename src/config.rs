//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `VTU_BASE_URL` (optional): Data vendor API base URL
/// - `VTU_API_TOKEN` (optional): Data vendor API token; data purchases are
///   rejected with a configuration error when absent
/// - `PAYSTACK_BASE_URL` (optional): Payment gateway API base URL
/// - `PAYSTACK_SECRET_KEY` (optional): Payment gateway secret key; wallet
///   funding and webhook settlement are rejected when absent
///
/// The vendor and gateway credentials are deliberately optional: the server
/// boots without them, and the flows that need them fail fast with a
/// configuration error before any state change.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_vtu_base_url")]
    pub vtu_base_url: String,

    pub vtu_api_token: Option<String>,

    #[serde(default = "default_paystack_base_url")]
    pub paystack_base_url: String,

    pub paystack_secret_key: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_vtu_base_url() -> String {
    "https://datastationapi.com".to_string()
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
