//! Post rendering under the 280-character limit
//!
//! Sections go in priority order: header, stats, injury, commentary, tags.
//! Each section is checked against the remaining budget before it is
//! appended, so a section is either complete or absent. The only text that is
//! ever shortened is the commentary line (at a word boundary). An oversized
//! header loses its arena suffix first and is only cut when the score line
//! alone cannot fit.

use crate::domain::{GameRecord, Outcome, TeamDirectory};

/// Hard limit for one post, in characters
pub const MAX_POST_CHARS: usize = 280;

/// Fixed tags closing every post
pub const FIXED_TAGS: &str = "#Sports #GameDay";

const SECTION_SEP: &str = "\n\n";
const MAX_STAT_LINES: usize = 2;
/// Shortened commentary below this size is dropped instead
const MIN_COMMENTARY_CHARS: usize = 24;
const ELLIPSIS: char = '…';

/// Post text, guaranteed to fit the character limit it was built with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPost(String);

impl FormattedPost {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FormattedPost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders game records into social posts
#[derive(Debug, Clone)]
pub struct PostFormatter {
    teams: TeamDirectory,
    max_chars: usize,
}

impl PostFormatter {
    pub fn new(teams: TeamDirectory) -> Self {
        Self {
            teams,
            max_chars: MAX_POST_CHARS,
        }
    }

    pub fn format(&self, record: &GameRecord, commentary: &str) -> FormattedPost {
        let mut header = self.header(record, true);
        if char_len(&header) > self.max_chars {
            // the arena suffix is the optional part of the header
            header = self.header(record, false);
        }
        if char_len(&header) > self.max_chars {
            return FormattedPost(shorten(&header, self.max_chars));
        }

        let mut post = Budget::new(header, self.max_chars);

        if let Some(stats) = self.stats_section(record, &post) {
            post.push_section(&stats);
        }

        if let Some(injury) = record.first_injury() {
            post.try_push_section(&format!("🏥 Injuries:\n• {}", injury));
        }

        let commentary = commentary.trim();
        if !commentary.is_empty() {
            let line = format!("😄 {}", commentary);
            if !post.try_push_section(&line) {
                let room = post.room_for_section();
                if room >= MIN_COMMENTARY_CHARS {
                    post.push_section(&shorten(&line, room));
                }
            }
        }

        let tags = format!(
            "{} {} {}",
            self.teams.hashtag(&record.team_a),
            self.teams.hashtag(&record.team_b),
            FIXED_TAGS
        );
        if !post.try_push_section(&tags) {
            post.try_push_section(FIXED_TAGS);
        }

        FormattedPost(post.text)
    }

    /// `🏁 FINAL SCORE at Arena:` + score line
    fn header(&self, record: &GameRecord, with_location: bool) -> String {
        let label = match record.outcome() {
            Outcome::Decided { .. } => "FINAL SCORE",
            Outcome::Draw { .. } => "FINAL SCORE (DRAW)",
        };
        let location = self
            .teams
            .arena(&record.team_a)
            .filter(|_| with_location)
            .map(|arena| format!(" at {}", arena))
            .unwrap_or_default();

        format!("🏁 {}{}:\n{}", label, location, record.score_line())
    }

    /// Stats heading plus as many leading stat lines as fit, or nothing
    fn stats_section(&self, record: &GameRecord, post: &Budget) -> Option<String> {
        let mut block = String::from("📊 Key Stats:");
        let mut lines = 0;

        for stat in record.top_stats(MAX_STAT_LINES) {
            let candidate = format!("{}\n• {}: {}", block, stat.label, stat.value);
            if !post.fits_section(&candidate) {
                break;
            }
            block = candidate;
            lines += 1;
        }

        (lines > 0).then_some(block)
    }
}

/// Running post text with its character count
struct Budget {
    text: String,
    used: usize,
    max: usize,
}

impl Budget {
    fn new(header: String, max: usize) -> Self {
        let used = char_len(&header);
        Self {
            text: header,
            used,
            max,
        }
    }

    fn fits_section(&self, section: &str) -> bool {
        self.used + char_len(SECTION_SEP) + char_len(section) <= self.max
    }

    /// Characters left for one more section after its separator
    fn room_for_section(&self) -> usize {
        self.max
            .saturating_sub(self.used + char_len(SECTION_SEP))
    }

    fn push_section(&mut self, section: &str) {
        self.text.push_str(SECTION_SEP);
        self.text.push_str(section);
        self.used += char_len(SECTION_SEP) + char_len(section);
    }

    fn try_push_section(&mut self, section: &str) -> bool {
        if self.fits_section(section) {
            self.push_section(section);
            true
        } else {
            false
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `text` to at most `max` characters, ending in an ellipsis.
///
/// Prefers the last word boundary in the second half of the allowance.
fn shorten(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let keep: Vec<char> = text.chars().take(max - 1).collect();
    let ends_on_word = text.chars().nth(max - 1).map_or(true, char::is_whitespace);
    let cut = if ends_on_word {
        keep.len()
    } else {
        keep.iter()
            .rposition(|c| c.is_whitespace())
            .filter(|&pos| pos >= keep.len() / 2)
            .unwrap_or(keep.len())
    };

    let mut out: String = keep[..cut].iter().collect();
    out.truncate(out.trim_end().len());
    out.push(ELLIPSIS);
    out
}
