//! ============================================================================
//! Facebook OAuth - Authorization code flow
//! ============================================================================
//! Builds the dialog URL and trades codes and tokens at /oauth/access_token.
//! Failures here are returned as errors: a broken login must not go unnoticed.
//! ============================================================================

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tracing::{debug, info};

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::types::TokenResponse;

const TOKEN_PATH: &str = "oauth/access_token";

/// Bytes of entropy in a generated state value
const STATE_BYTES: usize = 32;

/// Generate a random URL-safe state parameter for CSRF protection
pub fn generate_state() -> String {
    let bytes: [u8; STATE_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

impl GraphClient {
    /// Get the authorization URL to open in the browser.
    /// Returns: (url, state). The caller keeps `state` to verify the callback.
    pub fn get_authorization_url(&self, state: Option<&str>) -> Result<(String, String), GraphError> {
        let state = match state {
            Some(s) => s.to_string(),
            None => generate_state(),
        };

        let scope = self.config.scope_param();
        let url = url::Url::parse_with_params(
            &self.endpoints.oauth_dialog,
            &[
                ("client_id", self.config.app_id()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("response_type", "code"),
                ("state", state.as_str()),
            ],
        )?;

        debug!("Generated Facebook auth URL");
        Ok((url.into(), state))
    }

    /// Exchange an authorization code for a short-lived user token
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenResponse, GraphError> {
        self.ensure_configured()?;
        info!("Exchanging Facebook authorization code for token");

        let params = [
            ("client_id", self.config.app_id()),
            ("client_secret", self.config.app_secret()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];

        let token: TokenResponse = self.get_json(TOKEN_PATH, &params).await?;
        info!("Obtained short-lived token (expires in {:?}s)", token.expires_in);
        Ok(token)
    }

    /// Exchange a short-lived (or long-lived) token for one valid ~60 days
    pub async fn get_long_lived_token(&self, short_lived_token: &str) -> Result<TokenResponse, GraphError> {
        self.ensure_configured()?;
        info!("Requesting long-lived Facebook token");

        let params = [
            ("grant_type", "fb_exchange_token"),
            ("client_id", self.config.app_id()),
            ("client_secret", self.config.app_secret()),
            ("fb_exchange_token", short_lived_token),
        ];

        let token: TokenResponse = self.get_json(TOKEN_PATH, &params).await?;
        info!("Obtained long-lived token (expires in {:?}s)", token.expires_in);
        Ok(token)
    }

    /// Long-lived tokens are refreshed by exchanging them again before they expire
    pub async fn refresh_access_token(&self, access_token: &str) -> Result<TokenResponse, GraphError> {
        self.get_long_lived_token(access_token).await
    }

    fn ensure_configured(&self) -> Result<(), GraphError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(GraphError::NotConfigured)
        }
    }
}
