//! The synchronized map, line chart and rank chart.

pub mod projection;
pub mod scale;
pub mod surface;
pub mod sync;
pub mod timeline;
pub mod tooltip;

pub use projection::Mercator;
pub use scale::{ColorScale, NO_DATA, interpolate_blues};
pub use surface::{Emphasis, Surfaces};
pub use sync::{HoverRecord, SurfaceKind, SyncHub};
pub use timeline::TimelineController;
pub use tooltip::{Pointer, Tooltip, TooltipContent};
