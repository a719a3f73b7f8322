//! ============================================================================
//! PUBLISHER-CORE: Facebook Graph API client
//! ============================================================================
//! This crate handles everything the publisher needs from the Graph API:
//! - OAuth authorization URLs, code exchange and long-lived tokens
//! - Discovery of the pages and groups the user administers
//! - Publishing text, image and link posts to pages and groups
//! ============================================================================

pub mod auth;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod publish;
pub mod types;

// Re-export main types for convenience
pub use auth::{calculate_token_expiry, is_token_expired};
pub use client::{client_from_env, init_tracing, GraphClient};
pub use config::{Endpoints, GraphConfig};
pub use error::GraphError;
pub use types::*;
