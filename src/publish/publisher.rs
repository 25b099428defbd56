use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::error::PublishError;

/// Confirmation returned by a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    /// Backend id of the created post
    pub id: String,
}

/// Social posting backend
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PostReceipt, PublishError>;
}

/// Logs posts instead of sending them
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    sent: AtomicU64,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<PostReceipt, PublishError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[DRY RUN] post #{} ({} chars):\n{}", n, text.chars().count(), text);
        Ok(PostReceipt {
            id: format!("dry-run-{}", n),
        })
    }
}
