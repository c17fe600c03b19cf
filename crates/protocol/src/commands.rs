use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Color, Point, Rect};

/// Fill or stroke source: a themed token or a data-driven color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Token(ThemeToken),
    Rgb(Color),
}

impl From<ThemeToken> for Paint {
    fn from(token: ThemeToken) -> Self {
        Paint::Token(token)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Rgb(color)
    }
}

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` for each surface. Renderers consume
/// this list sequentially; each command carries all the data it needs.
/// `key` fields carry the borough name so renderers can hit-test hover
/// targets back to the sync hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally with a text label.
    DrawRect {
        rect: Rect,
        color: Paint,
        border_color: Option<Paint>,
        label: Option<String>,
    },

    /// Fill a rectangle with a horizontal two-stop gradient.
    DrawGradient {
        rect: Rect,
        from: Color,
        to: Color,
        border_color: Option<Paint>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: Paint,
        width: f64,
    },

    /// Draw a polyline, or a polygon when `closed`.
    DrawPath {
        points: Vec<Point>,
        closed: bool,
        fill: Option<Paint>,
        stroke: Option<Paint>,
        stroke_width: f64,
        opacity: f64,
        key: Option<String>,
    },

    /// Draw a circle.
    DrawCircle {
        center: Point,
        radius: f64,
        fill: Paint,
        stroke: Option<Paint>,
        stroke_width: f64,
        opacity: f64,
        key: Option<String>,
    },

    /// Begin a logical group (e.g. a surface). Renderers may use this for
    /// batching, layer separation, or accessibility.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
