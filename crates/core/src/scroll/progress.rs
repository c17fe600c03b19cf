use serde::{Deserialize, Serialize};

/// Window scroll state at the time of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollGeometry {
    pub scroll_y: f64,
    pub viewport_height: f64,
}

/// A section's bounding box as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    /// Top edge relative to the viewport (`getBoundingClientRect().top`).
    pub rect_top: f64,
    pub height: f64,
}

pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Normalized progress through a pinned section.
///
/// 0 until the section's top reaches the viewport top, then rises linearly
/// to 1 as the page scrolls through `height - viewport_height` more pixels.
/// A section no taller than the viewport jumps straight to 1 once pinned.
pub fn section_progress(scroll: &ScrollGeometry, section: &SectionGeometry) -> f64 {
    if section.rect_top > 0.0 {
        return 0.0;
    }
    let document_top = section.rect_top + scroll.scroll_y;
    let scrollable = section.height - scroll.viewport_height;
    if scrollable <= 0.0 {
        return 1.0;
    }
    clamp01((scroll.scroll_y - document_top) / scrollable)
}

/// Coalesces scroll bursts into one recompute per animation frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollTracker {
    ticking: bool,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll event. Returns `true` when the host must request an
    /// animation frame; `false` while one is already pending.
    pub fn on_scroll(&mut self) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    /// Called from the frame callback before recomputing. Returns whether a
    /// frame had been requested.
    pub fn on_frame(&mut self) -> bool {
        std::mem::replace(&mut self.ticking, false)
    }

    pub fn is_pending(&self) -> bool {
        self.ticking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: f64 = 800.0;

    fn progress_at(scroll_y: f64, doc_top: f64, height: f64) -> f64 {
        section_progress(
            &ScrollGeometry {
                scroll_y,
                viewport_height: VIEWPORT,
            },
            &SectionGeometry {
                rect_top: doc_top - scroll_y,
                height,
            },
        )
    }

    #[test]
    fn zero_before_pinning() {
        assert_eq!(progress_at(0.0, 1_000.0, 2_000.0), 0.0);
        assert_eq!(progress_at(999.0, 1_000.0, 2_000.0), 0.0);
    }

    #[test]
    fn linear_while_pinned() {
        // 2000px section in an 800px viewport: 1200px of travel.
        assert_eq!(progress_at(1_000.0, 1_000.0, 2_000.0), 0.0);
        assert_eq!(progress_at(1_600.0, 1_000.0, 2_000.0), 0.5);
        assert_eq!(progress_at(2_200.0, 1_000.0, 2_000.0), 1.0);
        assert_eq!(progress_at(9_000.0, 1_000.0, 2_000.0), 1.0);
    }

    #[test]
    fn short_section_is_complete_once_pinned() {
        assert_eq!(progress_at(1_000.0, 1_000.0, 600.0), 1.0);
    }

    #[test]
    fn coalesces_scroll_bursts() {
        let mut t = ScrollTracker::new();
        assert!(t.on_scroll());
        assert!(!t.on_scroll());
        assert!(!t.on_scroll());
        assert!(t.on_frame());
        assert!(!t.is_pending());
        assert!(t.on_scroll());
    }
}
