//! ============================================================================
//! Discovery - Profile, managed pages and admin groups
//! ============================================================================
//! Listings follow the `paging.next` cursor until it runs out. A failed
//! request stops the walk and keeps what was already collected. Entries that
//! do not decode are skipped one at a time. Nothing in this module returns an
//! error to the caller.
//! ============================================================================

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::{GraphClient, DEFAULT_TIMEOUT};
use crate::error::GraphError;
use crate::types::{GroupRecord, Listing, ListingOutcome, PageRecord, UserProfile};

const PROFILE_FIELDS: &str = "id,name,picture";
const PAGE_FIELDS: &str = "id,name,access_token,category";
const GROUP_FIELDS: &str = "id,name,privacy";

impl GraphClient {
    /// Fetch the authenticated user's basic profile; None on any failure
    pub async fn get_user_profile(&self, access_token: &str) -> Option<UserProfile> {
        let url = self.endpoints.api_url("me");
        let response = self
            .http
            .get(&url)
            .query(&[("fields", PROFILE_FIELDS), ("access_token", access_token)])
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await;

        match read_ok_json::<UserProfile>(response).await {
            Ok(profile) => {
                debug!("Fetched Facebook profile {}", profile.id);
                Some(profile)
            }
            Err(e) => {
                error!("Facebook profile fetch failed: {}", e);
                None
            }
        }
    }

    /// Pages the user manages, each with its own page access token
    pub async fn get_user_pages(&self, access_token: &str) -> Vec<PageRecord> {
        self.fetch_pages(access_token).await.items
    }

    /// Groups the user is an admin of
    pub async fn get_user_groups(&self, access_token: &str) -> Vec<GroupRecord> {
        self.fetch_groups(access_token).await.items
    }

    /// Like [`get_user_pages`](Self::get_user_pages) but reports whether the walk finished
    pub async fn fetch_pages(&self, access_token: &str) -> Listing<PageRecord> {
        let params = [("fields", PAGE_FIELDS), ("access_token", access_token)];
        let listing = self.collect_paginated("me/accounts", &params, "pages").await;
        info!("Discovered {} Facebook pages", listing.items.len());
        listing
    }

    /// Like [`get_user_groups`](Self::get_user_groups) but reports whether the walk finished
    pub async fn fetch_groups(&self, access_token: &str) -> Listing<GroupRecord> {
        let params = [
            ("fields", GROUP_FIELDS),
            ("admin_only", "true"),
            ("access_token", access_token),
        ];
        let listing = self.collect_paginated("me/groups", &params, "groups").await;
        info!("Discovered {} Facebook groups", listing.items.len());
        listing
    }

    /// Walk a cursor-paginated edge. Only the first request carries `params`;
    /// `next` URLs already embed their own query.
    async fn collect_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        label: &str,
    ) -> Listing<T> {
        let mut items = Vec::new();
        let mut next = Some(self.endpoints.api_url(path));
        let mut first = true;

        while let Some(url) = next.take() {
            let mut request = self.http.get(&url).timeout(DEFAULT_TIMEOUT);
            if first {
                request = request.query(params);
                first = false;
            } else {
                debug!("Following {} cursor", label);
            }

            match read_ok_json::<PagedResponse>(request.send().await).await {
                Ok(page) => {
                    items.extend(decode_entries::<T>(page.data, label));
                    next = page.paging.and_then(|p| p.next);
                }
                Err(e) => {
                    error!("Failed to fetch {}: {}", label, e);
                    return Listing {
                        items,
                        outcome: ListingOutcome::Truncated(e),
                    };
                }
            }
        }

        Listing {
            items,
            outcome: ListingOutcome::Complete,
        }
    }
}

/// Decode each listing entry on its own so one malformed record costs only itself
fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>, label: &str) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed {} entry: {}", label, e);
                None
            }
        })
        .collect()
}

/// Decode a 200 response; every other outcome becomes a `GraphError`
async fn read_ok_json<T: DeserializeOwned>(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, GraphError> {
    let response = response?;
    let status = response.status();

    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(GraphError::Status { status, body });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GraphError::Decode(e.to_string()))
}

// ============================================================================
// Graph API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagedResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}
