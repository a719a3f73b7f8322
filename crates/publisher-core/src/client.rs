//! ============================================================================
//! Graph Client - Shared HTTP plumbing for the Graph API
//! ============================================================================
//! `GraphClient` holds read-only configuration plus a reqwest client. The
//! OAuth, discovery and publishing operations are implemented in their own
//! modules as further `impl GraphClient` blocks.
//! ============================================================================

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::{Endpoints, GraphConfig};
use crate::error::GraphError;

/// Timeout for token calls, discovery and feed posts
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Photo uploads make the server fetch the image first
pub(crate) const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Facebook Graph API
#[derive(Debug, Clone)]
pub struct GraphClient {
    pub(crate) config: GraphConfig,
    pub(crate) endpoints: Endpoints,
    pub(crate) http: reqwest::Client,
}

impl GraphClient {
    /// Create a client against the public Graph API
    pub fn new(config: GraphConfig) -> Self {
        Self::with_endpoints(config, Endpoints::default())
    }

    /// Create a client against custom endpoints (e.g. a mock server)
    pub fn with_endpoints(config: GraphConfig, endpoints: Endpoints) -> Self {
        Self {
            config,
            endpoints,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Whether OAuth flows can be attempted at all
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// GET returning decoded JSON; any non-2xx status is an error
    pub(crate) async fn get_json<T, P>(&self, path: &str, params: &P) -> Result<T, GraphError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.endpoints.api_url(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(params)
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Graph API GET {} failed: {} - {}", path, status, body);
            return Err(GraphError::Status { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))
    }
}

/// Load `.env`, read the environment and build a client
pub fn client_from_env() -> GraphClient {
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    let config = GraphConfig::from_env();
    if config.is_configured() {
        info!("Facebook client configured for redirect {}", config.redirect_uri);
    } else {
        info!("Facebook app id/secret missing, OAuth flows disabled");
    }

    GraphClient::new(config)
}

/// Install a fmt subscriber filtered by RUST_LOG (plus debug for this crate).
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "publisher_core=debug"
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::DEBUG.into()),
    );

    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        debug!("Tracing subscriber already installed: {}", e);
    }
}
