//! Running and ranking episodes.
mod runner;
mod selector;
pub use runner::EpisodeRunner;
pub use selector::EpisodeSelector;
