pub mod cli;
pub mod commentary;
pub mod config;
pub mod domain;
pub mod error;
pub mod publish;
pub mod scoreboard;
pub mod services;
pub mod signing;

pub use commentary::{Commentary, CommentaryComposer, OpenAiClient, TextGenerator};
pub use config::AppConfig;
pub use domain::{GameRecord, GameStatus, TeamDirectory};
pub use error::{BotError, Result};
pub use publish::{DryRunPublisher, FormattedPost, PostFormatter, Publisher, TwitterPublisher};
pub use scoreboard::{GameExtractor, HttpScoreboard, ScoreboardSource};
pub use services::{CycleOutcome, Deduplicator, Orchestrator, PassReport};
