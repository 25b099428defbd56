use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Game status as shown on the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Final,
    Unknown,
}

impl GameStatus {
    /// Classify the free text of a status element.
    ///
    /// "Final", "FINAL/OT", "Final - 2OT" are final; any other text means the
    /// game is still being played (or not started). Missing text is unknown.
    pub fn from_status_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            None | Some("") => GameStatus::Unknown,
            Some(t) if t.to_ascii_lowercase().contains("final") => GameStatus::Final,
            Some(_) => GameStatus::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Final => "final",
            GameStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One labelled stat, e.g. `Points Leader: LeBron 34`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatLine {
    pub label: String,
    pub value: String,
}

impl StatLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Result of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Decided {
        winner: &'a str,
        winner_score: u32,
        loser: &'a str,
        loser_score: u32,
    },
    Draw {
        score: u32,
    },
}

/// What a game identity was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Event id from the markup
    Event,
    /// Game date from the markup plus team pair
    Dated,
    /// Team pair only; the same matchup on another day shares the key
    TeamPair,
}

/// A single game parsed from one scoreboard container.
///
/// Immutable once built; lives for one poll cycle. Only `identity` outlives
/// the cycle (in the published set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub identity: String,
    pub identity_kind: IdentityKind,
    pub team_a: String,
    pub team_b: String,
    pub score_a: u32,
    pub score_b: u32,
    /// Insertion order is display priority
    pub stats: Vec<StatLine>,
    pub injuries: Vec<String>,
    pub status: GameStatus,
}

impl GameRecord {
    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Final
    }

    /// Winner/loser split. Ties have no winner and come back as a draw.
    pub fn outcome(&self) -> Outcome<'_> {
        if self.score_a > self.score_b {
            Outcome::Decided {
                winner: &self.team_a,
                winner_score: self.score_a,
                loser: &self.team_b,
                loser_score: self.score_b,
            }
        } else if self.score_b > self.score_a {
            Outcome::Decided {
                winner: &self.team_b,
                winner_score: self.score_b,
                loser: &self.team_a,
                loser_score: self.score_a,
            }
        } else {
            Outcome::Draw {
                score: self.score_a,
            }
        }
    }

    /// Highest-priority stats, order preserved
    pub fn top_stats(&self, n: usize) -> &[StatLine] {
        &self.stats[..n.min(self.stats.len())]
    }

    pub fn first_injury(&self) -> Option<&str> {
        self.injuries.first().map(String::as_str)
    }

    /// `"Lakers 102 - Celtics 98"`
    pub fn score_line(&self) -> String {
        format!(
            "{} {} - {} {}",
            self.team_a, self.score_a, self.team_b, self.score_b
        )
    }
}

/// Build the deduplication key for a game.
///
/// An event id from the markup wins. Without one the key is sport + game date
/// + team pair when the markup carries a date, and sport + team pair
/// otherwise. The poll date is never part of the key: a finished game still
/// listed after midnight must keep the identity it was published under.
pub fn game_identity(
    sport: &str,
    event_id: Option<&str>,
    date: Option<NaiveDate>,
    team_a: &str,
    team_b: &str,
) -> (String, IdentityKind) {
    if let Some(id) = event_id.map(str::trim).filter(|id| !id.is_empty()) {
        return (format!("{}:{}", sport, id), IdentityKind::Event);
    }

    let pair = format!("{}-vs-{}", slug(team_a), slug(team_b));
    match date {
        Some(date) => (
            format!("{}:{}:{}", sport, date.format("%Y-%m-%d"), pair),
            IdentityKind::Dated,
        ),
        None => (format!("{}:{}", sport, pair), IdentityKind::TeamPair),
    }
}

fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
