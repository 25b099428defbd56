use thiserror::Error;

/// Main error type for the scoreboard bot
#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Pipeline stage errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    // Crypto/signing errors
    #[error("Signature error: {0}")]
    Signature(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for BotError
pub type Result<T> = std::result::Result<T, BotError>;

/// Scoreboard transport failures. The orchestrator treats all of them as an
/// empty cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Scoreboard request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Scoreboard returned HTTP {status}")]
    Status { status: u16 },

    #[error("Scoreboard fetch timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
}

/// Markup problems that invalidate a whole game container.
///
/// Missing stats or injuries never produce one of these; they degrade to
/// empty values instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Team pair missing: found {found} team name(s)")]
    MissingTeams { found: usize },

    #[error("Score missing for {team_a} vs {team_b}: found {found} parseable score(s)")]
    MissingScore {
        team_a: String,
        team_b: String,
        found: usize,
    },

    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Text-generation failures. Always absorbed by the fallback pool.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation backend not configured")]
    NotConfigured,

    #[error("Generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Generation returned an empty response")]
    EmptyResponse,

    #[error("Generation timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
}

/// Social posting failures. Logged; the record stays eligible.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Publish request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Publish API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The backend already holds an identical post
    #[error("Duplicate post rejected: {0}")]
    Duplicate(String),

    #[error("Publish signing failed: {0}")]
    Signing(String),

    #[error("Publish timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
}
