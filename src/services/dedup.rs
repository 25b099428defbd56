//! Publish-once bookkeeping
//!
//! Tracks which game identities have been posted during this process
//! lifetime. Entries are never evicted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{GameRecord, IdentityKind};

/// identity → time of the successful publish
pub type PublishedSet = HashMap<String, DateTime<Utc>>;

/// Default for `schedule.republish_window_secs`
pub const DEFAULT_REPUBLISH_WINDOW_SECS: u64 = 20 * 60 * 60;

/// Decides which records still need a post.
///
/// Event and dated identities are suppressed for good once published. A
/// team-pair identity only stays suppressed for the republish window, so the
/// same matchup on a later day can be posted again.
#[derive(Debug)]
pub struct Deduplicator {
    published: PublishedSet,
    republish_window_secs: u64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::with_window_secs(DEFAULT_REPUBLISH_WINDOW_SECS)
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_secs(republish_window_secs: u64) -> Self {
        Self {
            published: PublishedSet::new(),
            republish_window_secs,
        }
    }

    /// Final and not posted yet
    pub fn is_eligible(&self, record: &GameRecord) -> bool {
        self.is_eligible_at(record, Utc::now())
    }

    pub fn is_eligible_at(&self, record: &GameRecord, now: DateTime<Utc>) -> bool {
        if !record.is_final() {
            return false;
        }

        match self.published.get(&record.identity) {
            None => true,
            Some(at) => match record.identity_kind {
                IdentityKind::Event | IdentityKind::Dated => false,
                // a clock step backwards keeps the record suppressed
                IdentityKind::TeamPair => {
                    let elapsed = (now - *at).num_seconds();
                    elapsed >= 0 && elapsed as u64 >= self.republish_window_secs
                }
            },
        }
    }

    /// Record a confirmed publish. Only call after the backend accepted the
    /// post for this record.
    pub fn mark_published(&mut self, record: &GameRecord) {
        self.mark_published_at(record, Utc::now());
    }

    pub fn mark_published_at(&mut self, record: &GameRecord, at: DateTime<Utc>) {
        match record.identity_kind {
            // a later day's matchup restarts the window
            IdentityKind::TeamPair => {
                self.published.insert(record.identity.clone(), at);
            }
            // keep the first timestamp if somehow marked twice
            IdentityKind::Event | IdentityKind::Dated => {
                self.published.entry(record.identity.clone()).or_insert(at);
            }
        }
        debug!("Marked {} as published", record.identity);
    }

    pub fn published_at(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.published.get(identity).copied()
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}
