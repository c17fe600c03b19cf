//! Scroll-driven breakout of page sections into fullscreen overlays.

pub mod breakout;
pub mod progress;
pub mod relocate;
pub mod stage;

pub use breakout::{BreakoutController, BreakoutError, SectionStatus};
pub use progress::{ScrollGeometry, ScrollTracker, SectionGeometry, section_progress};
pub use stage::{StageClassifier, StageState, ease_in_out_quint};
