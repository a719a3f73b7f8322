//! ============================================================================
//! Publishing - Posts to pages and groups
//! ============================================================================
//! Handles posting through the Graph API feed and photos edges:
//! - Text, image and link posts to a page (page token)
//! - Text/link posts to a group (user token)
//! - Smart posts that pick the shape from the content
//!
//! Every call yields a `PublishResult`; nothing here returns an error, so a
//! batch of posts keeps going when one of them fails.
//! ============================================================================

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use crate::client::{GraphClient, DEFAULT_TIMEOUT, UPLOAD_TIMEOUT};
use crate::types::{ErrorPayload, PublishResult};

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<>"')\]]+"#).expect("URL_REGEX should compile - this is a bug")
});

/// Punctuation that ends a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Shape a smart post resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostShape {
    Image(String),
    Link(String),
    Text,
}

/// Pick the post shape: explicit image first, then the first URL in the text
pub fn choose_post_shape(text: &str, image_url: Option<&str>) -> PostShape {
    if let Some(image) = image_url.filter(|u| !u.is_empty()) {
        return PostShape::Image(image.to_string());
    }
    match extract_first_url(text) {
        Some(link) => PostShape::Link(link),
        None => PostShape::Text,
    }
}

/// First http(s) URL in `text`, minus trailing sentence punctuation
pub fn extract_first_url(text: &str) -> Option<String> {
    URL_REGEX
        .find(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// `pageId_postSuffix` -> `<web>/pageId/posts/postSuffix`
pub fn page_post_permalink(web_base: &str, post_id: &str) -> Option<String> {
    if post_id.is_empty() {
        return None;
    }
    Some(format!("{}/{}", web_base, post_id.replace('_', "/posts/")))
}

/// Group permalinks use the part of the id after the last underscore
pub fn group_post_permalink(web_base: &str, group_id: &str, post_id: &str) -> Option<String> {
    let suffix = post_id.rsplit('_').next().filter(|s| !s.is_empty())?;
    Some(format!("{}/groups/{}/posts/{}", web_base, group_id, suffix))
}

/// JSON error body if it parses, the raw text otherwise
pub fn decode_error_body(body: String) -> ErrorPayload {
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => ErrorPayload::Structured(value),
        Err(_) => ErrorPayload::RawText { raw: body },
    }
}

/// Where a post went, which decides how the id becomes a permalink
#[derive(Debug, Clone, Copy)]
enum PostTarget<'a> {
    PageFeed,
    PagePhoto,
    Group(&'a str),
}

impl GraphClient {
    /// Publish a text-only post to a page
    pub async fn publish_text_post(&self, page_access_token: &str, page_id: &str, text: &str) -> PublishResult {
        info!("Posting text to Facebook page {}", page_id);

        let form = [("message", text), ("access_token", page_access_token)];
        self.submit_post(page_id, "feed", &form, DEFAULT_TIMEOUT, PostTarget::PageFeed)
            .await
    }

    /// Publish a photo post; the Graph API fetches `image_url` itself
    pub async fn publish_image_post(
        &self,
        page_access_token: &str,
        page_id: &str,
        text: &str,
        image_url: &str,
    ) -> PublishResult {
        info!("Posting image to Facebook page {}", page_id);

        let form = [
            ("message", text),
            ("url", image_url),
            ("access_token", page_access_token),
        ];
        self.submit_post(page_id, "photos", &form, UPLOAD_TIMEOUT, PostTarget::PagePhoto)
            .await
    }

    /// Publish a post with a link preview to a page
    pub async fn publish_link_post(
        &self,
        page_access_token: &str,
        page_id: &str,
        text: &str,
        link: &str,
    ) -> PublishResult {
        info!("Posting link to Facebook page {}: {}", page_id, link);

        let form = [
            ("message", text),
            ("link", link),
            ("access_token", page_access_token),
        ];
        self.submit_post(page_id, "feed", &form, DEFAULT_TIMEOUT, PostTarget::PageFeed)
            .await
    }

    /// Publish to a group the user admins. Groups have no page token, so this
    /// takes the user's own token.
    pub async fn publish_group_post(
        &self,
        user_access_token: &str,
        group_id: &str,
        text: &str,
        link: Option<&str>,
    ) -> PublishResult {
        info!("Posting to Facebook group {}", group_id);

        let mut form = vec![("message", text), ("access_token", user_access_token)];
        if let Some(link) = link.filter(|l| !l.is_empty()) {
            form.push(("link", link));
        }

        self.submit_post(group_id, "feed", &form, DEFAULT_TIMEOUT, PostTarget::Group(group_id))
            .await
    }

    /// Post to a page, choosing image, link or text from the content
    pub async fn publish_smart_post(
        &self,
        page_access_token: &str,
        page_id: &str,
        text: &str,
        image_url: Option<&str>,
    ) -> PublishResult {
        match choose_post_shape(text, image_url) {
            PostShape::Image(image) => {
                self.publish_image_post(page_access_token, page_id, text, &image)
                    .await
            }
            PostShape::Link(link) => {
                self.publish_link_post(page_access_token, page_id, text, &link)
                    .await
            }
            PostShape::Text => self.publish_text_post(page_access_token, page_id, text).await,
        }
    }

    /// POST a form to `/<node>/<edge>` and fold every outcome into a `PublishResult`
    async fn submit_post(
        &self,
        node_id: &str,
        edge: &str,
        form: &[(&str, &str)],
        timeout: Duration,
        target: PostTarget<'_>,
    ) -> PublishResult {
        let url = self.endpoints.api_url(&format!("{}/{}", node_id, edge));

        let response = match self.http.post(&url).form(form).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Facebook {} request failed: {}", edge, e);
                return PublishResult::transport_failure(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read Facebook {} response: {}", edge, e);
                return PublishResult::transport_failure(e.to_string());
            }
        };

        if status != StatusCode::OK {
            let error = decode_error_body(body);
            error!("Facebook {} post failed: {} - {:?}", edge, status, error);
            return PublishResult::Failure {
                status_code: Some(status.as_u16()),
                error,
            };
        }

        let data: Value = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to parse Facebook {} response: {}", edge, e);
                return PublishResult::Failure {
                    status_code: Some(status.as_u16()),
                    error: ErrorPayload::RawText { raw: body },
                };
            }
        };

        let (post_id, permalink) = self.resolve_post(&data, target);
        info!("Published Facebook post {:?}", post_id);

        PublishResult::Success {
            post_id,
            permalink,
            status_code: status.as_u16(),
        }
    }

    fn resolve_post(&self, data: &Value, target: PostTarget<'_>) -> (Option<String>, Option<String>) {
        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let web = self.endpoints.web_base.as_str();

        match target {
            PostTarget::PageFeed => {
                let id = field("id");
                let link = id.as_deref().and_then(|id| page_post_permalink(web, id));
                (id, link)
            }
            // Photos answer with the photo id and, separately, the feed story id
            PostTarget::PagePhoto => {
                let id = field("post_id").or_else(|| field("id"));
                let link = id.as_deref().and_then(|id| page_post_permalink(web, id));
                (id, link)
            }
            PostTarget::Group(group_id) => {
                let id = field("id");
                let link = id
                    .as_deref()
                    .and_then(|id| group_post_permalink(web, group_id, id));
                (id, link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoints, GraphConfig, FACEBOOK_WEB_BASE};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GraphClient {
        GraphClient::with_endpoints(
            GraphConfig::new("app", "secret", "http://cb"),
            Endpoints::with_api_base(server.uri()),
        )
    }

    fn offline_client() -> GraphClient {
        GraphClient::with_endpoints(
            GraphConfig::new("app", "secret", "http://cb"),
            Endpoints::with_api_base("http://127.0.0.1:1"),
        )
    }

    #[test]
    fn test_page_permalink() {
        assert_eq!(
            page_post_permalink(FACEBOOK_WEB_BASE, "123_456").as_deref(),
            Some("https://www.facebook.com/123/posts/456")
        );
        assert_eq!(page_post_permalink(FACEBOOK_WEB_BASE, ""), None);
    }

    #[test]
    fn test_group_permalink() {
        assert_eq!(
            group_post_permalink(FACEBOOK_WEB_BASE, "789", "789_012").as_deref(),
            Some("https://www.facebook.com/groups/789/posts/012")
        );
        assert_eq!(
            group_post_permalink(FACEBOOK_WEB_BASE, "789", "555").as_deref(),
            Some("https://www.facebook.com/groups/789/posts/555")
        );
        assert_eq!(group_post_permalink(FACEBOOK_WEB_BASE, "789", ""), None);
    }

    #[test]
    fn test_extract_first_url() {
        assert_eq!(
            extract_first_url("check this http://example.com/x out").as_deref(),
            Some("http://example.com/x")
        );
        assert_eq!(
            extract_first_url("Read more: https://example.com/a?b=1!?").as_deref(),
            Some("https://example.com/a?b=1")
        );
        assert_eq!(
            extract_first_url("(see https://example.com/page) and http://other.example").as_deref(),
            Some("https://example.com/page")
        );
        assert_eq!(
            extract_first_url("<a href=\"https://example.com/q\">").as_deref(),
            Some("https://example.com/q")
        );
        assert_eq!(extract_first_url("no links here, ftp://nope"), None);
    }

    #[test]
    fn test_choose_post_shape() {
        assert_eq!(choose_post_shape("plain words", None), PostShape::Text);
        assert_eq!(
            choose_post_shape("check this http://example.com/x out", None),
            PostShape::Link("http://example.com/x".to_string())
        );
        assert_eq!(
            choose_post_shape("see https://example.com", Some("https://cdn.example/a.png")),
            PostShape::Image("https://cdn.example/a.png".to_string())
        );
        assert_eq!(choose_post_shape("plain", Some("")), PostShape::Text);
    }

    #[test]
    fn test_decode_error_body() {
        assert_eq!(
            decode_error_body(r#"{"error":{"message":"bad"}}"#.to_string()),
            ErrorPayload::Structured(json!({"error": {"message": "bad"}}))
        );
        assert_eq!(
            decode_error_body("<html>502</html>".to_string()),
            ErrorPayload::RawText {
                raw: "<html>502</html>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_text_post_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/feed"))
            .and(body_string_contains("message=hello+world"))
            .and(body_string_contains("access_token=page-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123_456"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_text_post("page-token", "123", "hello world")
            .await;

        assert_eq!(
            result,
            PublishResult::Success {
                post_id: Some("123_456".to_string()),
                permalink: Some("https://www.facebook.com/123/posts/456".to_string()),
                status_code: 200,
            }
        );
    }

    #[tokio::test]
    async fn test_text_post_structured_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/feed"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"message": "(#200) The user hasn't authorized the application", "code": 200}
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).publish_text_post("t", "123", "hi").await;
        match result {
            PublishResult::Failure { status_code, error } => {
                assert_eq!(status_code, Some(403));
                assert!(matches!(error, ErrorPayload::Structured(_)));
                assert!(error.message().unwrap().contains("(#200)"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_body_falls_back_to_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/feed"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_link_post("t", "123", "hi", "https://example.com")
            .await;
        assert_eq!(
            result,
            PublishResult::Failure {
                status_code: Some(502),
                error: ErrorPayload::RawText {
                    raw: "Bad Gateway".to_string()
                },
            }
        );
    }

    #[tokio::test]
    async fn test_image_post_prefers_post_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/photos"))
            .and(body_string_contains("url=https%3A%2F%2Fcdn.example%2Fa.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "999", "post_id": "123_777"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_image_post("t", "123", "pic", "https://cdn.example/a.png")
            .await;
        assert_eq!(result.post_id(), Some("123_777"));
        assert_eq!(result.permalink(), Some("https://www.facebook.com/123/posts/777"));
    }

    #[tokio::test]
    async fn test_image_post_without_ids_has_no_permalink() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_image_post("t", "123", "pic", "https://cdn.example/a.png")
            .await;
        assert!(result.is_success());
        assert_eq!(result.post_id(), None);
        assert_eq!(result.permalink(), None);
    }

    #[tokio::test]
    async fn test_group_post_with_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/789/feed"))
            .and(body_string_contains("access_token=user-token"))
            .and(body_string_contains("link=https%3A%2F%2Fexample.com%2Fnews"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "789_012"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_group_post("user-token", "789", "news", Some("https://example.com/news"))
            .await;
        assert_eq!(result.permalink(), Some("https://www.facebook.com/groups/789/posts/012"));
        assert_eq!(result.status_code(), Some(200));
    }

    #[tokio::test]
    async fn test_smart_post_dispatches_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/feed"))
            .and(body_string_contains("link=http%3A%2F%2Fexample.com%2Fx&"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_smart_post("t", "123", "check this http://example.com/x out", None)
            .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_smart_post_dispatches_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"post_id": "123_2"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .publish_smart_post(
                "t",
                "123",
                "see http://example.com/x",
                Some("https://cdn.example/a.png"),
            )
            .await;
        assert_eq!(result.post_id(), Some("123_2"));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_result() {
        let client = offline_client();

        let results = vec![
            client.publish_text_post("t", "123", "hi").await,
            client
                .publish_image_post("t", "123", "hi", "https://cdn.example/a.png")
                .await,
            client.publish_group_post("t", "789", "hi", None).await,
        ];

        for result in results {
            match result {
                PublishResult::Failure {
                    status_code: None,
                    error: ErrorPayload::Transport { message },
                } => assert!(!message.is_empty()),
                other => panic!("expected transport failure, got {:?}", other),
            }
        }
    }
}
