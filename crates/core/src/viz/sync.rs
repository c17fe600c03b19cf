//! Cross-surface highlighting.
//!
//! At most one borough is highlighted at a time. Every highlight is paired
//! with a reset; highlighting a second borough resets the first.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{RankEntry, TimeSeriesRecord, is_london_borough};
use crate::viz::surface::{Emphasis, Surfaces};
use crate::viz::tooltip::{Pointer, Tooltip, TooltipContent};

/// Which surface an interaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Map,
    Line,
    Rank,
}

/// Data behind a hover, used to fill the tooltip.
#[derive(Debug, Clone, Copy)]
pub enum HoverRecord<'a> {
    /// Map or line chart: the borough's observation for the shown date.
    Series {
        date: &'a str,
        record: Option<&'a TimeSeriesRecord>,
    },
    /// Rank chart: the borough's entry in the current snapshot.
    Rank(&'a RankEntry),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncHub {
    highlighted: Option<String>,
    tooltip: Tooltip,
}

impl SyncHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    /// Emphasize `borough` on every surface and, with a pointer and record,
    /// show the shared tooltip. Returns `false` (and changes nothing) for
    /// names outside the borough allow-list.
    pub fn highlight(
        &mut self,
        surfaces: &mut Surfaces,
        borough: &str,
        hover: Option<(Pointer, HoverRecord<'_>)>,
    ) -> bool {
        let borough = borough.trim();
        if !is_london_borough(borough) {
            debug!("ignoring highlight of unknown borough {borough:?}");
            return false;
        }
        if self.highlighted.is_some() {
            self.reset(surfaces);
        }

        apply_emphasis(surfaces, Some(borough));
        self.highlighted = Some(borough.to_string());

        if let Some((pointer, record)) = hover {
            let content = match record {
                HoverRecord::Series { date, record } => TooltipContent::Series {
                    name: borough.to_string(),
                    date: date.to_string(),
                    price: record.and_then(|r| r.average_price),
                    change_1m: record.and_then(|r| r.change_1m),
                    change_12m: record.and_then(|r| r.change_12m),
                },
                HoverRecord::Rank(entry) => TooltipContent::Rank {
                    name: borough.to_string(),
                    rank: entry.rank,
                    price: entry.price,
                },
            };
            self.tooltip.show(content, pointer);
        }
        true
    }

    /// Follow the pointer while the tooltip is showing.
    pub fn move_pointer(&mut self, pointer: Pointer) {
        if self.tooltip.visible {
            self.tooltip.move_to(pointer);
        }
    }

    /// Restore data-driven styling everywhere and hide the tooltip.
    pub fn reset(&mut self, surfaces: &mut Surfaces) {
        apply_emphasis(surfaces, None);
        self.highlighted = None;
        self.tooltip.hide();
    }

    /// Re-apply the current highlight after surfaces were rebuilt or
    /// re-joined (e.g. a timeline step while hovering).
    pub fn reapply(&self, surfaces: &mut Surfaces) {
        apply_emphasis(surfaces, self.highlighted.as_deref());
    }
}

fn emphasis(target: Option<&str>, key: &str) -> Emphasis {
    match target {
        None => Emphasis::Normal,
        Some(t) if t == key => Emphasis::Emphasized,
        Some(_) => Emphasis::Dimmed,
    }
}

fn apply_emphasis(surfaces: &mut Surfaces, target: Option<&str>) {
    for feature in &mut surfaces.map.features {
        feature.highlighted = target == Some(feature.name.as_str());
    }
    for path in &mut surfaces.line.paths {
        path.emphasis = emphasis(target, &path.borough);
    }
    for line in &mut surfaces.rank.lines {
        line.emphasis = emphasis(target, &line.borough);
    }
    for dot in &mut surfaces.rank.dots {
        dot.emphasis = emphasis(target, &dot.borough);
    }
}
