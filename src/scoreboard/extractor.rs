//! Scoreboard markup → `GameRecord`
//!
//! Each game container is parsed independently. Teams and score are
//! required; stats, injuries and status degrade to empty/unknown when the
//! markup does not have them.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::{AppConfig, SelectorConfig};
use crate::domain::{game_identity, GameRecord, GameStatus, StatLine};
use crate::error::ExtractionError;

/// Compiled CSS selectors for one scoreboard layout
#[derive(Debug, Clone)]
pub struct ScoreboardSelectors {
    container: Selector,
    status: Selector,
    team_name: Selector,
    score: Selector,
    stat: Selector,
    stat_label: Selector,
    stat_value: Selector,
    injury: Selector,
    event_id_attr: String,
    date_attr: String,
}

impl ScoreboardSelectors {
    pub fn compile(cfg: &SelectorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            container: parse_selector(&cfg.container)?,
            status: parse_selector(&cfg.status)?,
            team_name: parse_selector(&cfg.team_name)?,
            score: parse_selector(&cfg.score)?,
            stat: parse_selector(&cfg.stat)?,
            stat_label: parse_selector(&cfg.stat_label)?,
            stat_value: parse_selector(&cfg.stat_value)?,
            injury: parse_selector(&cfg.injury)?,
            event_id_attr: cfg.event_id_attr.clone(),
            date_attr: cfg.date_attr.clone(),
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(raw).map_err(|e| ExtractionError::InvalidSelector {
        selector: raw.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Turns scoreboard markup into typed game records
#[derive(Debug, Clone)]
pub struct GameExtractor {
    sport: String,
    selectors: ScoreboardSelectors,
}

impl GameExtractor {
    pub fn new(sport: impl Into<String>, selectors: ScoreboardSelectors) -> Self {
        Self {
            sport: sport.into(),
            selectors,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, ExtractionError> {
        let selectors = ScoreboardSelectors::compile(&cfg.scoreboard.selectors)?;
        Ok(Self::new(cfg.sport.clone(), selectors))
    }

    /// Parse every game container on a page. One result per container.
    pub fn parse_page(&self, html: &str) -> Vec<Result<GameRecord, ExtractionError>> {
        let document = Html::parse_document(html);
        let results: Vec<_> = document
            .select(&self.selectors.container)
            .map(|container| self.extract(container))
            .collect();

        debug!("Scoreboard: parsed {} game containers", results.len());
        results
    }

    /// Parse one game container
    pub fn extract(
        &self,
        container: ElementRef<'_>,
    ) -> Result<GameRecord, ExtractionError> {
        let (team_a, team_b) = self.extract_teams(container)?;
        let (score_a, score_b) = match self.extract_scores(container) {
            Ok(scores) => scores,
            Err(found) => {
                return Err(ExtractionError::MissingScore {
                    team_a,
                    team_b,
                    found,
                })
            }
        };

        let status = GameStatus::from_status_text(self.extract_status(container).as_deref());
        let stats = self.extract_stats(container);
        let injuries = self.extract_injuries(container);

        let attrs = container.value();
        let date = attrs.attr(&self.selectors.date_attr).and_then(parse_date);
        let (identity, identity_kind) = game_identity(
            &self.sport,
            attrs.attr(&self.selectors.event_id_attr),
            date,
            &team_a,
            &team_b,
        );

        Ok(GameRecord {
            identity,
            identity_kind,
            team_a,
            team_b,
            score_a,
            score_b,
            stats,
            injuries,
            status,
        })
    }

    fn extract_teams(&self, container: ElementRef<'_>) -> Result<(String, String), ExtractionError> {
        let mut names = container
            .select(&self.selectors.team_name)
            .map(element_text)
            .filter(|name| !name.is_empty());

        match (names.next(), names.next()) {
            (Some(a), Some(b)) => Ok((a, b)),
            (Some(_), None) => Err(ExtractionError::MissingTeams { found: 1 }),
            _ => Err(ExtractionError::MissingTeams { found: 0 }),
        }
    }

    /// `Err` carries how many scores were found
    fn extract_scores(&self, container: ElementRef<'_>) -> Result<(u32, u32), usize> {
        let scores: Vec<u32> = container
            .select(&self.selectors.score)
            .filter_map(|el| parse_score(&element_text(el)))
            .take(2)
            .collect();

        match scores.as_slice() {
            [a, b] => Ok((*a, *b)),
            other => Err(other.len()),
        }
    }

    fn extract_status(&self, container: ElementRef<'_>) -> Option<String> {
        container
            .select(&self.selectors.status)
            .next()
            .map(element_text)
    }

    fn extract_stats(&self, container: ElementRef<'_>) -> Vec<StatLine> {
        let mut stats: Vec<StatLine> = Vec::new();
        for row in container.select(&self.selectors.stat) {
            let label = row.select(&self.selectors.stat_label).next().map(element_text);
            let value = row.select(&self.selectors.stat_value).next().map(element_text);

            let (Some(label), Some(value)) = (label, value) else {
                continue;
            };
            if label.is_empty() || value.is_empty() {
                continue;
            }
            // first occurrence keeps its priority slot
            if stats.iter().any(|s| s.label == label) {
                continue;
            }
            stats.push(StatLine { label, value });
        }
        stats
    }

    fn extract_injuries(&self, container: ElementRef<'_>) -> Vec<String> {
        container
            .select(&self.selectors.injury)
            .map(element_text)
            .filter(|note| !note.is_empty())
            .collect()
    }
}

/// Visible text of an element with whitespace collapsed
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First run of digits in the text, e.g. "102" or "102 (OT)"
fn parse_score(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
}
