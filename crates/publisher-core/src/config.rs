//! ============================================================================
//! Configuration - App credentials, scopes and Graph API endpoints
//! ============================================================================
//! Credentials come from explicit arguments or the environment:
//! - FACEBOOK_APP_ID / FACEBOOK_APP_SECRET
//! - FACEBOOK_REDIRECT_URI (defaults to the local callback)
//! - FACEBOOK_SCOPES (comma-separated permission list)
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Graph API version segment used by every endpoint
macro_rules! graph_api_version {
    () => {
        "v21.0"
    };
}

pub const GRAPH_API_VERSION: &str = graph_api_version!();

/// Versioned Graph API base URL
pub const GRAPH_API_BASE: &str = concat!("https://graph.facebook.com/", graph_api_version!());

/// Browser-facing OAuth dialog
pub const FACEBOOK_OAUTH_URL: &str =
    concat!("https://www.facebook.com/", graph_api_version!(), "/dialog/oauth");

/// Public site used for permalinks
pub const FACEBOOK_WEB_BASE: &str = "https://www.facebook.com";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5001/facebook/callback";

/// Permissions requested when FACEBOOK_SCOPES is not set
pub const DEFAULT_SCOPES: &[&str] = &[
    "pages_manage_posts",
    "pages_read_engagement",
    "pages_show_list",
    "publish_to_groups",
];

pub const ENV_APP_ID: &str = "FACEBOOK_APP_ID";
pub const ENV_APP_SECRET: &str = "FACEBOOK_APP_SECRET";
pub const ENV_REDIRECT_URI: &str = "FACEBOOK_REDIRECT_URI";
pub const ENV_SCOPES: &str = "FACEBOOK_SCOPES";

/// Static application configuration, read once and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub app_id: Option<String>,
    #[serde(skip_serializing)]
    pub app_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: default_scopes(),
        }
    }
}

impl GraphConfig {
    /// Build a config from explicit values with the default scope list
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_secret: Some(app_secret.into()),
            redirect_uri: redirect_uri.into(),
            scopes: default_scopes(),
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            app_id: non_empty(ENV_APP_ID),
            app_secret: non_empty(ENV_APP_SECRET),
            redirect_uri: non_empty(ENV_REDIRECT_URI)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            scopes: non_empty(ENV_SCOPES)
                .map(|raw| parse_scopes(&raw))
                .unwrap_or_else(default_scopes),
        }
    }

    /// Explicit arguments win over whatever was loaded from the environment
    pub fn with_overrides(
        mut self,
        app_id: Option<String>,
        app_secret: Option<String>,
        redirect_uri: Option<String>,
    ) -> Self {
        if let Some(id) = app_id.filter(|v| !v.is_empty()) {
            self.app_id = Some(id);
        }
        if let Some(secret) = app_secret.filter(|v| !v.is_empty()) {
            self.app_secret = Some(secret);
        }
        if let Some(uri) = redirect_uri.filter(|v| !v.is_empty()) {
            self.redirect_uri = uri;
        }
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// True iff both the app id and the app secret are present and non-empty
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
        present(&self.app_id) && present(&self.app_secret)
    }

    /// Scope list in the comma-joined form the OAuth dialog expects
    pub fn scope_param(&self) -> String {
        self.scopes.join(",")
    }

    pub(crate) fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or_default()
    }

    pub(crate) fn app_secret(&self) -> &str {
        self.app_secret.as_deref().unwrap_or_default()
    }
}

/// Base URLs for the API, the OAuth dialog and permalinks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub oauth_dialog: String,
    pub web_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: GRAPH_API_BASE.to_string(),
            oauth_dialog: FACEBOOK_OAUTH_URL.to_string(),
            web_base: FACEBOOK_WEB_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point API calls somewhere else (e.g. a mock server), keeping the dialog and web URLs
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
