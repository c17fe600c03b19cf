pub mod commands;
pub mod style;
pub mod theme;
pub mod types;

pub use commands::{Paint, RenderCommand, TextAlign};
pub use style::{SlotStyle, StyleParams};
pub use theme::ThemeToken;
pub use types::{Color, Point, Rect, Viewport};
