use borough_lens_protocol::StyleParams;
use serde::{Deserialize, Serialize};

use crate::model::scene::NodeId;

/// Which layout a scrollytelling section breaks out into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Map, line chart and rank chart with their controls.
    Compare,
    /// Suitability map and metrics.
    Find,
}

impl SectionKind {
    pub fn from_section_id(id: &str) -> Option<Self> {
        match id {
            "compare" => Some(Self::Compare),
            "find" => Some(Self::Find),
            _ => None,
        }
    }

    /// Class of the layout node inside the breakout container.
    pub fn layout_class(self) -> &'static str {
        match self {
            Self::Compare => "compare-fullscreen-layout",
            Self::Find => "find-fullscreen-layout",
        }
    }

    /// Whether the manual fullscreen mode plays enter and exit animations.
    pub fn animates_fullscreen(self) -> bool {
        matches!(self, Self::Compare)
    }

    /// Named slots of the fullscreen layout, in stagger order.
    pub fn slots(self) -> &'static [&'static str] {
        match self {
            Self::Compare => &[
                "controls-area",
                "insight-area",
                "map-area",
                "chart-top",
                "chart-bottom",
            ],
            Self::Find => &["map-area", "metrics-area"],
        }
    }
}

/// A relocatable piece of section content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentRole {
    TopControls,
    Insight,
    MapWrapper,
    LineChart,
    RankChart,
    SuitabilityMap,
    SuitabilityMetrics,
}

/// Discrete phase of a section's scroll transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Inactive,
    Active,
    Exiting,
}

/// Where relocatable content currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    #[default]
    Home,
    Breakout,
}

/// A tracked scrollytelling region and its overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub kind: SectionKind,
    /// The original `section#id` element.
    pub anchor: NodeId,
    pub sticky_wrapper: NodeId,
    /// Holds the section's real children while content is home.
    pub content_wrapper: NodeId,
    /// Fullscreen overlay attached to the body.
    pub breakout: NodeId,
    /// Layout node inside `breakout` that owns the named slots.
    pub layout: NodeId,
    pub progress: f64,
    pub stage: Stage,
    pub placement: Placement,
    /// Nodes currently parked in the overlay, by role.
    pub moved: Vec<(ContentRole, NodeId)>,
    pub overlay_visible: bool,
    pub overlay_exiting: bool,
    pub style: StyleParams,
    /// Manual fullscreen mode, toggled by the section's button.
    #[serde(default)]
    pub fullscreen: bool,
}

impl Section {
    pub fn is_relocated(&self) -> bool {
        self.placement == Placement::Breakout
    }

    pub fn moved_node(&self, role: ContentRole) -> Option<NodeId> {
        self.moved
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, id)| *id)
    }
}
