//! Pure transforms from surface state to render commands.

pub mod line_chart;
pub mod map;
pub mod rank_chart;
pub mod tooltip;

pub use line_chart::render_line_chart;
pub use map::{render_legend, render_map};
pub use rank_chart::render_rank_chart;
pub use tooltip::render_tooltip;
