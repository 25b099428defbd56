pub mod game;
pub mod teams;

pub use game::*;
pub use teams::TeamDirectory;
