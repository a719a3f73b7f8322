//! ============================================================================
//! Core Types for the Graph Publisher
//! ============================================================================
//! Tokens, discovery records and publish outcomes. Records are immutable
//! snapshots of what the Graph API returned; nothing here is kept in sync.
//! ============================================================================

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::GraphError;

// ============================================================================
// OAuth Types
// ============================================================================

/// Decoded body of `/oauth/access_token`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime hint in seconds (absent for some long-lived tokens)
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Anything else the server sent along
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenResponse {
    /// Expiry timestamp to store next to the token, if the server gave a usable lifetime
    pub fn expires_at(&self) -> Option<String> {
        self.expires_in.and_then(crate::auth::calculate_token_expiry)
    }
}

// ============================================================================
// Discovery Types
// ============================================================================

/// Authenticated user's basic profile from `/me`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Picture envelope as returned (`{"data": {"url": ...}}`)
    #[serde(default)]
    pub picture: Option<serde_json::Value>,
}

impl UserProfile {
    pub fn picture_url(&self) -> Option<&str> {
        self.picture
            .as_ref()?
            .get("data")?
            .get("url")?
            .as_str()
    }
}

/// A page the user manages, with its page-scoped token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A group the user is an admin of
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub privacy: Option<String>,
}

/// Items collected across every cursor page, plus how the walk ended
#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub outcome: ListingOutcome,
}

#[derive(Debug)]
pub enum ListingOutcome {
    /// The last page had no `next` cursor
    Complete,
    /// A request failed; `items` holds whatever came before it
    Truncated(GraphError),
}

impl<T> Listing<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, ListingOutcome::Complete)
    }

    pub fn error(&self) -> Option<&GraphError> {
        match &self.outcome {
            ListingOutcome::Complete => None,
            ListingOutcome::Truncated(e) => Some(e),
        }
    }
}

// ============================================================================
// Publishing Types
// ============================================================================

/// Error body of a failed publish
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Body was not JSON; kept verbatim
    RawText { raw: String },
    /// No response at all (connection error, timeout)
    Transport { message: String },
    /// JSON error object as the API sent it
    Structured(serde_json::Value),
}

impl ErrorPayload {
    /// Best human-readable message in the payload
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorPayload::RawText { raw } => Some(raw),
            ErrorPayload::Transport { message } => Some(message),
            ErrorPayload::Structured(value) => value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str()),
        }
    }
}

/// Outcome of a single publish call
#[derive(Debug, Clone, PartialEq)]
pub enum PublishResult {
    Success {
        post_id: Option<String>,
        permalink: Option<String>,
        status_code: u16,
    },
    Failure {
        /// None when the request never got a response
        status_code: Option<u16>,
        error: ErrorPayload,
    },
}

impl PublishResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishResult::Success { .. })
    }

    pub fn post_id(&self) -> Option<&str> {
        match self {
            PublishResult::Success { post_id, .. } => post_id.as_deref(),
            PublishResult::Failure { .. } => None,
        }
    }

    pub fn permalink(&self) -> Option<&str> {
        match self {
            PublishResult::Success { permalink, .. } => permalink.as_deref(),
            PublishResult::Failure { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            PublishResult::Success { status_code, .. } => Some(*status_code),
            PublishResult::Failure { status_code, .. } => *status_code,
        }
    }

    pub(crate) fn transport_failure(message: impl Into<String>) -> Self {
        PublishResult::Failure {
            status_code: None,
            error: ErrorPayload::Transport {
                message: message.into(),
            },
        }
    }
}

/// Flat `{"success": .., ...}` shape callers persist or hand to a frontend
impl Serialize for PublishResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PublishResult::Success {
                post_id,
                permalink,
                status_code,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("post_id", post_id)?;
                map.serialize_entry("permalink", permalink)?;
                map.serialize_entry("status_code", status_code)?;
                map.end()
            }
            PublishResult::Failure { status_code, error } => {
                let len = if status_code.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("success", &false)?;
                if let Some(code) = status_code {
                    map.serialize_entry("status_code", code)?;
                }
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
