use serde::{Deserialize, Serialize};

/// Visual parameters of a breakout overlay for one frame.
///
/// The core computes these from the eased transition value; renderers
/// decide how to apply them (the browser writes them to CSS custom
/// properties, see [`StyleParams::custom_properties`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    pub scale: f64,
    /// Depth offset in px (`translateZ`).
    pub depth_offset: f64,
    /// Blur radius in px.
    pub blur: f64,
    pub opacity: f64,
}

impl StyleParams {
    /// Parameters of a fully hidden overlay.
    pub const HIDDEN: StyleParams = StyleParams {
        scale: 0.7,
        depth_offset: 200.0,
        blur: 15.0,
        opacity: 0.0,
    };

    pub fn from_eased(eased: f64) -> Self {
        Self {
            scale: 0.7 + 0.3 * eased,
            depth_offset: (1.0 - eased) * 200.0,
            blur: (1.0 - eased) * 15.0,
            opacity: eased,
        }
    }

    pub fn custom_properties(&self) -> [(&'static str, String); 4] {
        [
            ("--transition-scale", format!("{}", self.scale)),
            ("--transition-translateZ", format!("{}px", self.depth_offset)),
            ("--transition-blur", format!("{}px", self.blur)),
            ("--transition-opacity", format!("{}", self.opacity)),
        ]
    }
}

/// Staggered entrance of one named slot inside an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotStyle {
    /// Vertical offset in px.
    pub offset_y: f64,
    pub opacity: f64,
}

impl SlotStyle {
    pub fn custom_properties(&self) -> [(&'static str, String); 2] {
        [
            ("--element-y", format!("{}px", self.offset_y)),
            ("--element-opacity", format!("{}", self.opacity)),
        ]
    }
}
