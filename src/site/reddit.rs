//! site::reddit
//!
//! Reddit implementation of the site traits using the OAuth JSON API.
//!
//! # Authentication
//!
//! Bearer tokens come from a [`TokenProvider`]. A 401/403 answer invalidates
//! the cached token and the request is retried once.
//!
//! # Endpoints
//!
//! | operation | request |
//! |-----------|---------|
//! | read | `GET /r/{sub}/wiki/{page}?raw_json=1` |
//! | write | `POST /r/{sub}/api/wiki/edit` |
//! | publish | `POST /api/submit` (`kind=self`) |
//! | distinguish | `POST /api/distinguish` |
//! | notify | `POST /api/compose` to `/r/{sub}` |
//!
//! `raw_json=1` keeps `&`, `<` and `>` unescaped in `content_md`; without it
//! the next write would store the entities literally.
//!
//! Rate limits are reported as [`SiteError::RateLimited`]; there is no
//! automatic retry.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use std::sync::Arc;

use super::traits::{DocumentStore, Notifier, Publisher, SiteError};
use crate::auth::TokenProvider;
use crate::core::types::ReferenceId;

/// Reddit client bound to one subreddit.
pub struct RedditClient {
    client: Client,
    api_base: String,
    subreddit: String,
    user_agent: String,
    tokens: Arc<dyn TokenProvider>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WikiPage {
    data: WikiPageData,
}

#[derive(Debug, Deserialize)]
struct WikiPageData {
    content_md: String,
}

/// `api_type=json` envelope: `{"json": {"errors": [...], "data": {...}}}`.
#[derive(Debug, Deserialize)]
struct JsonEnvelope<T> {
    json: JsonBody<T>,
}

#[derive(Debug, Deserialize)]
struct JsonBody<T> {
    #[serde(default)]
    errors: Vec<Vec<serde_json::Value>>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RedditErrorBody {
    message: Option<String>,
    reason: Option<String>,
}

impl RedditClient {
    pub fn new(
        api_base: impl Into<String>,
        subreddit: impl Into<String>,
        user_agent: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            subreddit: subreddit.into(),
            user_agent: user_agent.into(),
            tokens,
        }
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    async fn headers(&self) -> Result<HeaderMap, SiteError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| SiteError::AuthFailed(e.to_string()))?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| SiteError::AuthFailed("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| SiteError::ApiError {
                status: 0,
                message: format!("invalid user agent '{}'", self.user_agent),
            })?;
        headers.insert(USER_AGENT, agent);
        Ok(headers)
    }

    fn is_retryable_auth_error(err: &SiteError) -> bool {
        matches!(err, SiteError::AuthFailed(_))
    }

    fn subreddit_url(&self, path: &str) -> String {
        format!("{}/r/{}/{}", self.api_base, self.subreddit, path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_base, path)
    }

    /// Send a request, retrying once with a fresh token on auth failure.
    /// Returns the body of a successful response.
    async fn execute<F>(&self, build: F) -> Result<String, SiteError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        match self.execute_once(&build).await {
            Err(ref e) if Self::is_retryable_auth_error(e) => {
                tracing::debug!("request rejected as unauthorized, retrying with a new token");
                self.tokens.invalidate();
                self.execute_once(&build).await
            }
            other => other,
        }
    }

    async fn execute_once<F>(&self, build: &F) -> Result<String, SiteError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let response = build(&self.client)
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| SiteError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SiteError::NetworkError(e.without_url().to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(map_status(status, &body))
        }
    }

    /// Post a form with `api_type=json` and unwrap the envelope.
    async fn post_json_api<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>, SiteError> {
        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(form.len() + 1);
        fields.push(("api_type", "json"));
        fields.extend_from_slice(form);

        let body = self.execute(|client| client.post(url).form(&fields)).await?;
        let envelope: JsonEnvelope<T> = parse(&body)?;
        if let Some(message) = describe_errors(&envelope.json.errors) {
            return Err(SiteError::Rejected(message));
        }
        Ok(envelope.json.data)
    }
}

/// Map a non-success status to a `SiteError`.
fn map_status(status: StatusCode, body: &str) -> SiteError {
    let message = serde_json::from_str::<RedditErrorBody>(body)
        .ok()
        .and_then(|e| e.reason.or(e.message))
        .unwrap_or_else(|| "Unknown error".to_string());

    match status {
        StatusCode::UNAUTHORIZED => SiteError::AuthFailed("invalid or expired token".into()),
        StatusCode::FORBIDDEN => SiteError::AuthFailed(format!("permission denied: {}", message)),
        StatusCode::NOT_FOUND => SiteError::NotFound(message),
        StatusCode::CONFLICT => SiteError::Rejected(format!("edit conflict: {}", message)),
        StatusCode::TOO_MANY_REQUESTS => SiteError::RateLimited,
        _ if status.is_server_error() => SiteError::ApiError {
            status: status.as_u16(),
            message: format!("Reddit server error: {}", message),
        },
        _ => SiteError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, SiteError> {
    serde_json::from_str(body).map_err(|e| SiteError::ApiError {
        status: 200,
        message: format!("Failed to parse response: {}", e),
    })
}

/// Render `[[code, message, field], ...]` as `CODE: message (field)`.
fn describe_errors(errors: &[Vec<serde_json::Value>]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let parts: Vec<String> = errors
        .iter()
        .map(|entry| {
            let text: Vec<&str> = entry.iter().filter_map(|v| v.as_str()).collect();
            match text.as_slice() {
                [code, message, field] => format!("{}: {} ({})", code, message, field),
                [code, message] => format!("{}: {}", code, message),
                _ => text.join(": "),
            }
        })
        .collect();
    Some(parts.join("; "))
}

#[async_trait]
impl DocumentStore for RedditClient {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn read(&self, page: &str) -> Result<String, SiteError> {
        let url = self.subreddit_url(&format!("wiki/{}", page));
        tracing::debug!(subreddit = %self.subreddit, page, "reading wiki page");

        let body = self
            .execute(|client| client.get(&url).query(&[("raw_json", "1")]))
            .await
            .map_err(|e| match e {
                SiteError::NotFound(_) => SiteError::NotFound(format!("wiki page '{}'", page)),
                other => other,
            })?;

        let wiki: WikiPage = parse(&body)?;
        Ok(wiki.data.content_md)
    }

    async fn write(&self, page: &str, text: &str, reason: &str) -> Result<(), SiteError> {
        let url = self.subreddit_url("api/wiki/edit");
        tracing::debug!(subreddit = %self.subreddit, page, reason, "writing wiki page");

        self.execute(|client| {
            client
                .post(&url)
                .form(&[("page", page), ("content", text), ("reason", reason)])
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for RedditClient {
    async fn publish(&self, title: &str, body: &str) -> Result<ReferenceId, SiteError> {
        let url = self.api_url("submit");
        tracing::debug!(subreddit = %self.subreddit, title, "submitting post");

        let data: Option<SubmitData> = self
            .post_json_api(
                &url,
                &[
                    ("sr", self.subreddit.as_str()),
                    ("kind", "self"),
                    ("title", title),
                    ("text", body),
                ],
            )
            .await?;

        let id = data
            .map(|d| d.id)
            .ok_or_else(|| SiteError::ApiError {
                status: 200,
                message: "submit response has no post id".into(),
            })?;
        ReferenceId::new(id).map_err(|e| SiteError::ApiError {
            status: 200,
            message: e.to_string(),
        })
    }

    async fn distinguish(&self, id: &ReferenceId) -> Result<(), SiteError> {
        let url = self.api_url("distinguish");
        let fullname = format!("t3_{}", id);
        self.post_json_api::<IgnoredAny>(&url, &[("id", fullname.as_str()), ("how", "yes")])
            .await?;
        Ok(())
    }

    fn post_url(&self, id: &ReferenceId) -> String {
        format!("https://redd.it/{}", id)
    }
}

#[async_trait]
impl Notifier for RedditClient {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), SiteError> {
        let url = self.api_url("compose");
        let to = format!("/r/{}", self.subreddit);
        tracing::info!(to = %to, subject, "sending modmail");

        self.post_json_api::<IgnoredAny>(
            &url,
            &[("to", to.as_str()), ("subject", subject), ("text", body)],
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("api_base", &self.api_base)
            .field("subreddit", &self.subreddit)
            .field("user_agent", &self.user_agent)
            .field("authenticated", &self.tokens.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Status mapping
    // ==========================================================================

    mod status_mapping {
        use super::*;

        #[test]
        fn unauthorized_is_auth_failed() {
            let err = map_status(StatusCode::UNAUTHORIZED, "");
            assert!(RedditClient::is_retryable_auth_error(&err));
        }

        #[test]
        fn forbidden_carries_reason() {
            let err = map_status(
                StatusCode::FORBIDDEN,
                r#"{"reason": "MAY_NOT_EDIT", "message": "Forbidden"}"#,
            );
            match err {
                SiteError::AuthFailed(msg) => assert!(msg.contains("MAY_NOT_EDIT")),
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn not_found_uses_message() {
            let err = map_status(
                StatusCode::NOT_FOUND,
                r#"{"message": "Not Found", "error": 404}"#,
            );
            assert!(matches!(err, SiteError::NotFound(m) if m == "Not Found"));
        }

        #[test]
        fn rate_limited() {
            assert!(matches!(
                map_status(StatusCode::TOO_MANY_REQUESTS, ""),
                SiteError::RateLimited
            ));
        }

        #[test]
        fn server_error_without_json() {
            match map_status(StatusCode::BAD_GATEWAY, "<html>") {
                SiteError::ApiError { status, message } => {
                    assert_eq!(status, 502);
                    assert!(message.contains("Unknown error"));
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn other_errors_are_not_retried() {
            assert!(!RedditClient::is_retryable_auth_error(&SiteError::RateLimited));
            assert!(!RedditClient::is_retryable_auth_error(&SiteError::NotFound(
                "x".into()
            )));
        }
    }

    // ==========================================================================
    // Envelope errors
    // ==========================================================================

    mod envelope {
        use super::*;

        #[test]
        fn no_errors() {
            assert!(describe_errors(&[]).is_none());
        }

        #[test]
        fn formats_code_message_field() {
            let env: JsonEnvelope<SubmitData> = serde_json::from_str(
                r#"{"json": {"errors": [["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]]}}"#,
            )
            .unwrap();
            assert_eq!(
                describe_errors(&env.json.errors).unwrap(),
                "SUBREDDIT_NOEXIST: that subreddit doesn't exist (sr)"
            );
            assert!(env.json.data.is_none());
        }

        #[test]
        fn null_field_is_dropped() {
            let env: JsonEnvelope<IgnoredAny> = serde_json::from_str(
                r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", null]]}}"#,
            )
            .unwrap();
            assert_eq!(
                describe_errors(&env.json.errors).unwrap(),
                "RATELIMIT: you are doing that too much"
            );
        }

        #[test]
        fn submit_data() {
            let env: JsonEnvelope<SubmitData> = serde_json::from_str(
                r#"{"json": {"errors": [], "data": {"url": "https://www.reddit.com/r/boardgames/comments/abc123/x/", "id": "abc123", "name": "t3_abc123"}}}"#,
            )
            .unwrap();
            assert_eq!(env.json.data.unwrap().id, "abc123");
        }
    }
}
