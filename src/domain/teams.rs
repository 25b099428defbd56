use std::collections::HashMap;

use crate::config::TeamsConfig;

/// Per-team display lookups (nickname, hashtag, arena).
///
/// Keys are matched case-insensitively against the scraped team name.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    nicknames: HashMap<String, String>,
    hashtags: HashMap<String, String>,
    arenas: HashMap<String, String>,
}

impl TeamDirectory {
    pub fn from_config(cfg: &TeamsConfig) -> Self {
        Self {
            nicknames: normalize_keys(&cfg.nicknames),
            hashtags: normalize_keys(&cfg.hashtags),
            arenas: normalize_keys(&cfg.arenas),
        }
    }

    pub fn nickname(&self, team: &str) -> Option<&str> {
        self.nicknames.get(&key(team)).map(String::as_str)
    }

    /// Configured hashtag, or `#` + team name without whitespace
    pub fn hashtag(&self, team: &str) -> String {
        match self.hashtags.get(&key(team)) {
            Some(tag) if tag.starts_with('#') => tag.clone(),
            Some(tag) => format!("#{}", tag),
            None => format!("#{}", team.split_whitespace().collect::<String>()),
        }
    }

    pub fn arena(&self, team: &str) -> Option<&str> {
        self.arenas.get(&key(team)).map(String::as_str)
    }
}

fn key(team: &str) -> String {
    team.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_keys(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| (key(k), v.trim().to_string()))
        .collect()
}
