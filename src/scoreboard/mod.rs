//! Scoreboard polling and parsing
//!
//! Fetches the public scoreboard page and turns each game container into a
//! `GameRecord`.

pub mod extractor;
pub mod fetcher;

pub use extractor::{GameExtractor, ScoreboardSelectors};
pub use fetcher::{HttpScoreboard, ScoreboardSource};
