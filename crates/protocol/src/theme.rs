use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Surface,
    Border,

    TextPrimary,
    TextSecondary,
    TextMuted,

    // Map
    MapStroke,
    MapNoData,
    LegendBorder,

    /// Hovered borough on any surface.
    Highlight,

    // Charts
    AxisLine,
    LineSeries,
    RankSeries,
    RankDot,

    // Tooltip
    TooltipBackground,
    TooltipBorder,
    TooltipText,
}
