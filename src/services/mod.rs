pub mod dedup;
pub mod orchestrator;

pub use dedup::{Deduplicator, PublishedSet};
pub use orchestrator::{CycleOutcome, CycleState, Orchestrator, PassReport};
