//! ============================================================================
//! Auth Module - OAuth and Token Lifecycle
//! ============================================================================
//! Handles the Facebook login flow for the publisher:
//! - Authorization URL with CSRF state
//! - Code exchange, long-lived upgrade and refresh
//! - Expiry timestamps with a proactive refresh buffer
//! ============================================================================

mod expiry;
mod oauth;

pub use expiry::{calculate_token_expiry, is_token_expired, DEFAULT_EXPIRY_BUFFER_MINUTES};
pub use oauth::generate_state;
