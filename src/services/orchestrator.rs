//! Poll → extract → filter → compose/format → publish → sleep
//!
//! One task drives every stage sequentially, so the published set needs no
//! locking. Nothing that happens inside a pass stops the loop: fetch and
//! publish failures are logged and absorbed, and a panic inside a pass turns
//! into an error cycle with the longer cooldown.

use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::commentary::{CommentaryComposer, TextGenerator};
use crate::config::{AppConfig, ScheduleConfig};
use crate::domain::{GameRecord, TeamDirectory};
use crate::error::{FetchError, PublishError, Result};
use crate::publish::{FormattedPost, PostFormatter, PostReceipt, Publisher};
use crate::scoreboard::{GameExtractor, ScoreboardSource};
use crate::services::Deduplicator;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Polling,
    Extracting,
    Filtering,
    ComposingAndFormatting,
    Publishing,
    Sleeping { after_error: bool },
}

/// Counters for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Containers found on the page
    pub seen: usize,
    /// Containers without teams or score
    pub invalid: usize,
    pub eligible: usize,
    pub published: usize,
    pub failed: usize,
    pub fetch_failed: bool,
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(PassReport),
    Failed(String),
}

/// Drives the scoreboard → post pipeline forever
pub struct Orchestrator {
    source: Arc<dyn ScoreboardSource>,
    extractor: GameExtractor,
    dedup: Deduplicator,
    composer: CommentaryComposer,
    formatter: PostFormatter,
    publisher: Arc<dyn Publisher>,
    schedule: ScheduleConfig,
    state: CycleState,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ScoreboardSource>,
        extractor: GameExtractor,
        composer: CommentaryComposer,
        formatter: PostFormatter,
        publisher: Arc<dyn Publisher>,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            dedup: Deduplicator::with_window_secs(schedule.republish_window_secs),
            composer,
            formatter,
            publisher,
            schedule,
            state: CycleState::Polling,
        }
    }

    /// Wire the pipeline from configuration and the three collaborators
    pub fn from_config(
        cfg: &AppConfig,
        source: Arc<dyn ScoreboardSource>,
        generator: Arc<dyn TextGenerator>,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self> {
        let teams = TeamDirectory::from_config(&cfg.teams);
        let extractor = GameExtractor::from_config(cfg)?;
        let composer = CommentaryComposer::new(
            generator,
            teams.clone(),
            cfg.commentary.fallback_policy,
            cfg.schedule.call_timeout(),
        );
        let formatter = PostFormatter::new(teams);

        Ok(Self::new(
            source,
            extractor,
            composer,
            formatter,
            publisher,
            cfg.schedule.clone(),
        ))
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Loop until the task is dropped
    pub async fn run(&mut self) {
        info!(
            "Scoreboard loop started (sleep {}s + {}s, error cooldown {}s)",
            self.schedule.short_interval_secs,
            self.schedule.long_interval_secs,
            self.schedule.error_cooldown_secs
        );

        loop {
            let outcome = self.run_cycle().await;
            for pause in self.sleep_plan(&outcome) {
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// One pass with panic isolation, leaving the machine in `Sleeping`
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let result = AssertUnwindSafe(self.run_pass()).catch_unwind().await;

        match result {
            Ok(report) => {
                info!(
                    "Cycle complete: seen={} invalid={} eligible={} published={} failed={} (total published {})",
                    report.seen,
                    report.invalid,
                    report.eligible,
                    report.published,
                    report.failed,
                    self.dedup.len()
                );
                self.transition(CycleState::Sleeping { after_error: false });
                CycleOutcome::Completed(report)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!("Cycle aborted: {}", reason);
                self.transition(CycleState::Sleeping { after_error: true });
                CycleOutcome::Failed(reason)
            }
        }
    }

    /// Pauses after a cycle: short then long normally, cooldown after errors
    pub fn sleep_plan(&self, outcome: &CycleOutcome) -> Vec<Duration> {
        let plan = match outcome {
            CycleOutcome::Completed(_) => {
                vec![self.schedule.short_interval(), self.schedule.long_interval()]
            }
            CycleOutcome::Failed(_) => vec![self.schedule.error_cooldown()],
        };
        plan.into_iter().filter(|d| !d.is_zero()).collect()
    }

    /// Process everything on the current scoreboard page once
    pub async fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();

        self.transition(CycleState::Polling);
        let html = match self.fetch().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Scoreboard fetch failed, treating as empty: {}", e);
                report.fetch_failed = true;
                return report;
            }
        };

        self.transition(CycleState::Extracting);
        let records = self.extract(&html, &mut report);

        self.transition(CycleState::Filtering);
        // the same identity can appear twice on one page
        let mut in_pass = HashSet::new();
        let eligible: Vec<GameRecord> = records
            .into_iter()
            .filter(|r| self.dedup.is_eligible(r) && in_pass.insert(r.identity.clone()))
            .collect();
        report.eligible = eligible.len();

        for record in eligible {
            self.transition(CycleState::ComposingAndFormatting);
            let commentary = self.composer.compose(&record).await;
            let post = self.formatter.format(&record, &commentary.text);

            self.transition(CycleState::Publishing);
            match self.publish(&post).await {
                Ok(receipt) => {
                    self.dedup.mark_published(&record);
                    report.published += 1;
                    info!(
                        "Published {} ({}) as post {}",
                        record.identity,
                        record.score_line(),
                        receipt.id
                    );
                }
                Err(PublishError::Duplicate(detail)) => {
                    // an earlier attempt went through even though we saw an error
                    self.dedup.mark_published(&record);
                    report.published += 1;
                    warn!(
                        "Post for {} already exists, marking published: {}",
                        record.identity, detail
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "Publish failed for {}, will retry next cycle: {}",
                        record.identity, e
                    );
                }
            }
        }

        report
    }

    fn transition(&mut self, next: CycleState) {
        if self.state != next {
            debug!("State: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        let limit = self.schedule.call_timeout();
        match tokio::time::timeout(limit, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                elapsed_secs: limit.as_secs(),
            }),
        }
    }

    /// Markup parsing stays synchronous so the parsed document never lives
    /// across an await point.
    fn extract(&self, html: &str, report: &mut PassReport) -> Vec<GameRecord> {
        let results = self.extractor.parse_page(html);
        report.seen = results.len();

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    report.invalid += 1;
                    debug!("Skipping game container: {}", e);
                }
            }
        }
        records
    }

    async fn publish(
        &self,
        post: &FormattedPost,
    ) -> std::result::Result<PostReceipt, PublishError> {
        let limit = self.schedule.call_timeout();
        match tokio::time::timeout(limit, self.publisher.publish(post.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout {
                elapsed_secs: limit.as_secs(),
            }),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
