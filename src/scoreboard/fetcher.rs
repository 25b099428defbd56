//! Scoreboard page transport

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{FetchError, Result};

/// Source of raw scoreboard markup
#[async_trait]
pub trait ScoreboardSource: Send + Sync {
    async fn fetch(&self) -> std::result::Result<String, FetchError>;
}

/// Plain HTTP GET of the public scoreboard page
pub struct HttpScoreboard {
    http: Client,
    url: String,
}

impl HttpScoreboard {
    pub fn new(url: impl Into<String>, user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Self::new(
            cfg.scoreboard_url(),
            &cfg.scoreboard.user_agent,
            cfg.scoreboard.timeout_secs,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ScoreboardSource for HttpScoreboard {
    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        let resp = self.http.get(&self.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        debug!("Scoreboard: fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}
