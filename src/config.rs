use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::scoreboard::ScoreboardSelectors;
use crate::services::dedup::DEFAULT_REPUBLISH_WINDOW_SECS;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Sport path segment on the scoreboard site (e.g., "nba", "nfl")
    pub sport: String,
    #[serde(default)]
    pub scoreboard: ScoreboardConfig,
    #[serde(default)]
    pub teams: TeamsConfig,
    #[serde(default)]
    pub commentary: CommentaryConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardConfig {
    /// Full scoreboard URL; derived from `sport` when unset
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            url: None,
            user_agent: default_user_agent(),
            timeout_secs: default_http_timeout(),
            selectors: SelectorConfig::default(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

/// CSS selectors used to pull game data out of the scoreboard markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One match per game
    pub container: String,
    pub status: String,
    pub team_name: String,
    pub score: String,
    /// One match per stat row, holding a label and a value element
    pub stat: String,
    pub stat_label: String,
    pub stat_value: String,
    pub injury: String,
    /// Attribute on the container carrying a stable event id
    pub event_id_attr: String,
    /// Attribute on the container carrying the game date (YYYY-MM-DD or YYYYMMDD)
    pub date_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: "div.scoreboard".to_string(),
            status: ".game-status".to_string(),
            team_name: ".team-name".to_string(),
            score: ".score".to_string(),
            stat: ".stat".to_string(),
            stat_label: ".stat-label".to_string(),
            stat_value: ".stat-value".to_string(),
            injury: ".injury".to_string(),
            event_id_attr: "data-game-id".to_string(),
            date_attr: "data-date".to_string(),
        }
    }
}

/// Per-team lookup tables. Keys are team names as shown on the scoreboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamsConfig {
    #[serde(default)]
    pub nicknames: HashMap<String, String>,
    #[serde(default)]
    pub hashtags: HashMap<String, String>,
    #[serde(default)]
    pub arenas: HashMap<String, String>,
}

/// How a canned line is picked when generation fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    Random,
    RoundRobin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentaryConfig {
    /// API key for the chat completions endpoint; empty disables generation
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_commentary_base_url")]
    pub base_url: String,
    #[serde(default = "default_commentary_model")]
    pub model: String,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_commentary_base_url(),
            model: default_commentary_model(),
            timeout_secs: default_generation_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

fn default_commentary_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_commentary_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_generation_timeout() -> u64 {
    20
}

fn default_temperature() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Log posts instead of sending them
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_publish_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub access_token_secret: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            base_url: default_publish_base_url(),
            api_key: String::new(),
            api_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_publish_base_url() -> String {
    "https://api.twitter.com".to_string()
}

impl PublishConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
            && !self.api_secret.is_empty()
            && !self.access_token.is_empty()
            && !self.access_token_secret.is_empty()
    }
}

/// Loop timing. Normal cycles sleep short then long; failed cycles sleep the
/// cooldown.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_short_interval")]
    pub short_interval_secs: u64,
    #[serde(default = "default_long_interval")]
    pub long_interval_secs: u64,
    #[serde(default = "default_error_cooldown")]
    pub error_cooldown_secs: u64,
    /// Upper bound for any single external call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    /// How long a game keyed only by its team pair stays posted
    #[serde(default = "default_republish_window")]
    pub republish_window_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            short_interval_secs: default_short_interval(),
            long_interval_secs: default_long_interval(),
            error_cooldown_secs: default_error_cooldown(),
            call_timeout_secs: default_call_timeout(),
            republish_window_secs: default_republish_window(),
        }
    }
}

fn default_short_interval() -> u64 {
    60
}

fn default_long_interval() -> u64 {
    300
}

fn default_error_cooldown() -> u64 {
    300
}

fn default_call_timeout() -> u64 {
    30
}

fn default_republish_window() -> u64 {
    DEFAULT_REPUBLISH_WINDOW_SECS
}

impl ScheduleConfig {
    pub fn short_interval(&self) -> Duration {
        Duration::from_secs(self.short_interval_secs)
    }

    pub fn long_interval(&self) -> Duration {
        Duration::from_secs(self.long_interval_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the rolling log file
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("sport", "nba")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("publish.dry_run", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SCOREBOT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SCOREBOT_PUBLISH__API_KEY, etc.)
            .add_source(
                Environment::with_prefix("SCOREBOT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration with every default filled in, for the given sport
    pub fn default_config(sport: &str) -> Self {
        Self {
            sport: sport.to_string(),
            scoreboard: ScoreboardConfig::default(),
            teams: TeamsConfig::default(),
            commentary: CommentaryConfig::default(),
            publish: PublishConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Scoreboard page to poll
    pub fn scoreboard_url(&self) -> String {
        self.scoreboard
            .url
            .clone()
            .unwrap_or_else(|| format!("https://www.espn.com/{}/scoreboard", self.sport))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.sport.trim().is_empty() {
            errors.push("sport must not be empty".to_string());
        }

        if self.schedule.short_interval_secs == 0 && self.schedule.long_interval_secs == 0 {
            errors.push("at least one of short_interval_secs/long_interval_secs must be positive".to_string());
        }

        if self.schedule.error_cooldown_secs == 0 {
            errors.push("error_cooldown_secs must be positive".to_string());
        }

        if self.schedule.call_timeout_secs == 0 {
            errors.push("call_timeout_secs must be positive".to_string());
        }

        if self.schedule.republish_window_secs == 0 {
            errors.push("republish_window_secs must be positive".to_string());
        }

        if !self.publish.dry_run && !self.publish.has_credentials() {
            errors.push(
                "publish credentials (api_key, api_secret, access_token, access_token_secret) are required unless publish.dry_run is set"
                    .to_string(),
            );
        }

        if let Err(e) = ScoreboardSelectors::compile(&self.scoreboard.selectors) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
