//! Game commentary: one generation attempt, canned line on any failure

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FallbackPolicy;
use crate::domain::{GameRecord, Outcome, TeamDirectory};
use crate::error::GenerationError;

/// Fixed system persona sent with every generation request
pub const COMMENTATOR_PERSONA: &str =
    "You are a witty sports commentator who makes clever, good-natured jokes about games.";

/// Canned lines used when generation is unavailable
pub const FALLBACK_LINES: [&str; 3] = [
    "This game was so one-sided, the losing team's GPS kept saying 'make a U-turn'!",
    "The score was so lopsided, they had to check if gravity was working on both sides of the field!",
    "That wasn't a game, that was a live demonstration of social distancing!",
];

/// Stats worked into the prompt
const PROMPT_STAT_COUNT: usize = 2;

/// Text-generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Where a commentary line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentarySource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commentary {
    pub text: String,
    pub source: CommentarySource,
}

impl Commentary {
    pub fn is_fallback(&self) -> bool {
        self.source == CommentarySource::Fallback
    }
}

impl std::fmt::Display for Commentary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds commentary for finished games
pub struct CommentaryComposer {
    generator: Arc<dyn TextGenerator>,
    teams: TeamDirectory,
    policy: FallbackPolicy,
    timeout: Duration,
    next_fallback: AtomicUsize,
}

impl CommentaryComposer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        teams: TeamDirectory,
        policy: FallbackPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            teams,
            policy,
            timeout,
            next_fallback: AtomicUsize::new(0),
        }
    }

    /// Commentary for one game. Never fails: generation errors, timeouts and
    /// empty replies all fall back to a canned line.
    pub async fn compose(&self, record: &GameRecord) -> Commentary {
        let prompt = self.build_prompt(record);

        let generated =
            match tokio::time::timeout(self.timeout, self.generator.generate(COMMENTATOR_PERSONA, &prompt))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout {
                    elapsed_secs: self.timeout.as_secs(),
                }),
            };

        match generated.map(|text| clean_generated(&text)) {
            Ok(text) if !text.is_empty() => {
                debug!("Generated commentary for {}", record.identity);
                Commentary {
                    text,
                    source: CommentarySource::Generated,
                }
            }
            Ok(_) => {
                warn!(
                    "Commentary for {} failed: {}; using fallback",
                    record.identity,
                    GenerationError::EmptyResponse
                );
                self.fallback()
            }
            Err(e) => {
                warn!(
                    "Commentary for {} failed: {}; using fallback",
                    record.identity, e
                );
                self.fallback()
            }
        }
    }

    /// User prompt for a game: outcome, score and the top stats
    pub fn build_prompt(&self, record: &GameRecord) -> String {
        let mut prompt = match record.outcome() {
            Outcome::Decided {
                winner,
                winner_score,
                loser,
                loser_score,
            } => format!(
                "Create a short, funny joke about a game where {} beat {} with a score of {}-{}.",
                self.display_name(winner),
                self.display_name(loser),
                winner_score,
                loser_score
            ),
            Outcome::Draw { score } => format!(
                "Create a short, funny joke about a game between {} and {} that ended in a {}-{} tie.",
                self.display_name(&record.team_a),
                self.display_name(&record.team_b),
                score,
                score
            ),
        };

        let stats = record.top_stats(PROMPT_STAT_COUNT);
        if !stats.is_empty() {
            let listed: Vec<String> = stats
                .iter()
                .map(|s| format!("{}: {}", s.label, s.value))
                .collect();
            prompt.push_str(&format!(" Key stats: {}.", listed.join("; ")));
        }

        prompt.push_str(" Keep it to one sentence under 150 characters.");
        prompt
    }

    fn display_name(&self, team: &str) -> String {
        match self.teams.nickname(team) {
            Some(nick) => format!("{} ({})", team, nick),
            None => team.to_string(),
        }
    }

    /// Random by default; round-robin cycles the pool in order
    fn fallback(&self) -> Commentary {
        let text = match self.policy {
            FallbackPolicy::Random => FALLBACK_LINES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(FALLBACK_LINES[0]),
            FallbackPolicy::RoundRobin => {
                let idx = self.next_fallback.fetch_add(1, Ordering::Relaxed);
                FALLBACK_LINES[idx % FALLBACK_LINES.len()]
            }
        };

        Commentary {
            text: text.to_string(),
            source: CommentarySource::Fallback,
        }
    }
}

/// Trim whitespace and one layer of wrapping quotes
fn clean_generated(text: &str) -> String {
    let trimmed = text.trim();
    let unquoted = [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
        .unwrap_or(trimmed);
    unquoted.split_whitespace().collect::<Vec<_>>().join(" ")
}
