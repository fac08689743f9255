//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They authenticate requests, attach the caller's identity, and
//! short-circuit unauthorized requests.

/// Bearer-token authentication and the admin guard
pub mod auth;
