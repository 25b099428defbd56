//! Commentary lines for finished games

pub mod composer;
pub mod openai;

pub use composer::{
    Commentary, CommentaryComposer, CommentarySource, TextGenerator, COMMENTATOR_PERSONA,
    FALLBACK_LINES,
};
pub use openai::{ChatMessage, OpenAiClient};
