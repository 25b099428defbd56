//! Post formatting and social publishing

pub mod formatter;
pub mod publisher;
pub mod twitter;

pub use formatter::{FormattedPost, PostFormatter, FIXED_TAGS, MAX_POST_CHARS};
pub use publisher::{DryRunPublisher, PostReceipt, Publisher};
pub use twitter::TwitterPublisher;
