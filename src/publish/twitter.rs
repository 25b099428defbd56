//! X (Twitter) API v2 publisher
//!
//! Creates posts through `POST /2/tweets` with OAuth 1.0a user-context
//! signing.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::publisher::{PostReceipt, Publisher};
use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use crate::signing::{OAuthCredentials, OAuthSigner};

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// X API client for creating posts
pub struct TwitterPublisher {
    client: Client,
    signer: OAuthSigner,
    endpoint: String,
}

impl TwitterPublisher {
    pub fn new(base_url: &str, credentials: OAuthCredentials, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            signer: OAuthSigner::new(credentials),
            endpoint: format!("{}/2/tweets", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(cfg: &PublishConfig) -> Result<Self> {
        Self::new(
            &cfg.base_url,
            OAuthCredentials::from_config(cfg),
            cfg.timeout_secs,
        )
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    async fn publish(&self, text: &str) -> std::result::Result<PostReceipt, PublishError> {
        let auth = self
            .signer
            .authorization_header("POST", &self.endpoint)
            .map_err(|e| PublishError::Signing(e.to_string()))?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .json(&CreatePost { text })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Post creation failed: {} - {}", status, body);
            return Err(classify_failure(status, body));
        }

        let created: CreatePostResponse = resp.json().await?;
        debug!("Post created: {}", created.data.id);
        Ok(PostReceipt {
            id: created.data.id,
        })
    }
}

/// A 403 about duplicate content means an identical post already exists
fn classify_failure(status: StatusCode, body: String) -> PublishError {
    if status == StatusCode::FORBIDDEN && body.to_ascii_lowercase().contains("duplicate") {
        PublishError::Duplicate(body)
    } else {
        PublishError::Api {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let creds = OAuthCredentials::new("k".into(), "s".into(), "t".into(), "ts".into());
        let publisher = TwitterPublisher::new("https://api.twitter.com/", creds, 5).unwrap();
        assert_eq!(publisher.endpoint, "https://api.twitter.com/2/tweets");
    }

    #[test]
    fn test_request_and_response_shapes() {
        let body = serde_json::to_string(&CreatePost { text: "hello" }).unwrap();
        assert_eq!(body, r#"{"text":"hello"}"#);

        let resp: CreatePostResponse =
            serde_json::from_str(r#"{"data":{"id":"1445880548472328192","text":"hello"}}"#)
                .unwrap();
        assert_eq!(resp.data.id, "1445880548472328192");
    }

    #[test]
    fn test_classify_failure() {
        let dup = classify_failure(
            StatusCode::FORBIDDEN,
            r#"{"detail":"You are not allowed to create a Tweet with duplicate content."}"#.into(),
        );
        assert!(matches!(dup, PublishError::Duplicate(_)));

        let limited = classify_failure(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests".into());
        assert!(matches!(limited, PublishError::Api { status: 429, .. }));
    }
}
