//! Core of borough-lens: the scroll breakout state machine, the
//! synchronized map and chart surfaces, dataset parsers and the cached
//! borough detail loader. Rendering goes through the protocol crate's
//! command list, so every front end shares the same views.

pub mod config;
pub mod detail;
pub mod explorer;
pub mod model;
pub mod parsers;
pub mod schedule;
pub mod scroll;
pub mod svg;
pub mod views;
pub mod viz;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ExplorerConfig};
pub use detail::{BoroughSource, DetailError, DetailLoader, DetailView, KeyValueStore, MemoryStore};
pub use explorer::Explorer;
pub use parsers::ParseError;
pub use schedule::{Scheduler, TaskKey};
