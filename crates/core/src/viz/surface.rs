//! Retained state of the three synchronized surfaces.
//!
//! Each element stores its data-driven values plus an [`Emphasis`]; the
//! rendered stroke width, opacity and radius are pure functions of the two.
//! Resetting every emphasis to `Normal` therefore restores the exact
//! pre-highlight state.

use std::collections::BTreeMap;

use borough_lens_protocol::{Color, Paint, ThemeToken};
use serde::Serialize;

use crate::model::{DateSlice, GeoFeature, HousingDataset, RankSnapshot};
use crate::viz::scale::{ColorScale, NO_DATA};

pub const LINE_STROKE: f64 = 1.5;
pub const LINE_STROKE_EMPHASIZED: f64 = 3.0;
pub const LINE_OPACITY: f64 = 0.7;
pub const RANK_STROKE: f64 = 1.5;
pub const RANK_STROKE_EMPHASIZED: f64 = 3.0;
pub const DOT_RADIUS: f64 = 5.0;
pub const DOT_RADIUS_EMPHASIZED: f64 = 8.0;
pub const DIMMED_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Emphasis {
    #[default]
    Normal,
    Emphasized,
    Dimmed,
}

/// A value animating linearly from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
}

impl Tween {
    pub fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            elapsed_ms: 0,
            duration_ms: 0,
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.duration_ms == 0 || self.elapsed_ms >= self.duration_ms {
            1.0
        } else {
            self.elapsed_ms as f64 / self.duration_ms as f64
        }
    }

    pub fn value(&self) -> f64 {
        self.from + (self.to - self.from) * self.fraction()
    }

    pub fn is_done(&self) -> bool {
        self.fraction() >= 1.0
    }

    /// Retarget from the current value.
    pub fn retarget(&mut self, to: f64, duration_ms: u64) {
        *self = Self {
            from: self.value(),
            to,
            elapsed_ms: 0,
            duration_ms,
        };
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
    }
}

// ---------------------------------------------------------------- map

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    pub name: String,
    #[serde(skip)]
    pub geometry: GeoFeature,
    /// Fill the transition started from.
    pub fill_from: Color,
    /// Data-driven fill for the current date.
    pub fill_to: Color,
    pub highlighted: bool,
}

impl MapFeature {
    /// Data-driven fill at the current point of the transition.
    pub fn data_fill(&self, fraction: f64) -> Color {
        self.fill_from.lerp(&self.fill_to, fraction)
    }

    pub fn paint(&self, fraction: f64) -> Paint {
        if self.highlighted {
            Paint::Token(ThemeToken::Highlight)
        } else {
            Paint::Rgb(self.data_fill(fraction))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSurface {
    pub features: Vec<MapFeature>,
    pub scale: ColorScale,
    /// Progress of the current fill transition.
    pub transition: Tween,
}

impl MapSurface {
    pub fn new(features: Vec<GeoFeature>, scale: ColorScale) -> Self {
        let features = features
            .into_iter()
            .map(|geometry| MapFeature {
                name: geometry.name.clone(),
                geometry,
                fill_from: NO_DATA,
                fill_to: NO_DATA,
                highlighted: false,
            })
            .collect();
        Self {
            features,
            scale,
            transition: Tween::settled(1.0),
        }
    }

    pub fn feature(&self, name: &str) -> Option<&MapFeature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Restyle every feature for `slice`, animating over `duration_ms`.
    pub fn set_slice(&mut self, slice: Option<&DateSlice>, duration_ms: u64) {
        let fraction = self.transition.fraction();
        for feature in &mut self.features {
            let price = slice.and_then(|s| s.price(&feature.name));
            feature.fill_from = feature.data_fill(fraction);
            feature.fill_to = self.scale.fill(price);
        }
        self.transition = Tween {
            from: 0.0,
            to: 1.0,
            elapsed_ms: 0,
            duration_ms,
        };
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        self.transition.advance(elapsed_ms);
    }

    pub fn fraction(&self) -> f64 {
        self.transition.fraction()
    }
}

// ---------------------------------------------------------------- line chart

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePath {
    pub borough: String,
    /// Price at each timeline index.
    pub values: Vec<Option<f64>>,
    pub emphasis: Emphasis,
}

impl LinePath {
    pub fn stroke_width(&self) -> f64 {
        match self.emphasis {
            Emphasis::Emphasized => LINE_STROKE_EMPHASIZED,
            _ => LINE_STROKE,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self.emphasis {
            Emphasis::Normal => LINE_OPACITY,
            Emphasis::Emphasized => 1.0,
            Emphasis::Dimmed => DIMMED_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSurface {
    pub paths: Vec<LinePath>,
    pub value_extent: (f64, f64),
    pub len: usize,
    /// Timeline index drawn as the cursor.
    pub cursor: usize,
}

impl LineSurface {
    pub fn from_dataset(dataset: &HousingDataset, boroughs: &[&str]) -> Self {
        let paths = boroughs
            .iter()
            .map(|b| LinePath {
                borough: (*b).to_string(),
                values: dataset.price_series(b),
                emphasis: Emphasis::Normal,
            })
            .collect();
        Self {
            paths,
            value_extent: dataset.price_extent(),
            len: dataset.timeline().len(),
            cursor: 0,
        }
    }

    pub fn path(&self, borough: &str) -> Option<&LinePath> {
        self.paths.iter().find(|p| p.borough == borough)
    }
}

// ---------------------------------------------------------------- rank chart

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankLine {
    pub borough: String,
    /// Rank at each timeline index.
    pub ranks: Vec<Option<usize>>,
    pub emphasis: Emphasis,
}

impl RankLine {
    pub fn stroke_width(&self) -> f64 {
        match self.emphasis {
            Emphasis::Emphasized => RANK_STROKE_EMPHASIZED,
            _ => RANK_STROKE,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self.emphasis {
            Emphasis::Dimmed => DIMMED_OPACITY,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DotPhase {
    Entering,
    Steady,
    Exiting,
}

/// One borough's dot at the current date; keyed by borough.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankDot {
    pub borough: String,
    pub rank: usize,
    pub price: f64,
    /// Vertical position in rank units (1 = top).
    pub position: Tween,
    /// Radius before emphasis is applied.
    pub size: Tween,
    pub phase: DotPhase,
    pub emphasis: Emphasis,
}

impl RankDot {
    pub fn radius(&self) -> f64 {
        let base = self.size.value();
        match self.emphasis {
            Emphasis::Emphasized if base > 0.0 => base * DOT_RADIUS_EMPHASIZED / DOT_RADIUS,
            _ => base,
        }
    }

    pub fn stroke_width(&self) -> f64 {
        match self.emphasis {
            Emphasis::Emphasized => 2.0,
            _ => 1.0,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self.emphasis {
            Emphasis::Dimmed => DIMMED_OPACITY,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankSurface {
    pub lines: Vec<RankLine>,
    pub dots: Vec<RankDot>,
    /// Number of ranked boroughs at the busiest date (vertical extent).
    pub max_rank: usize,
    pub len: usize,
    pub cursor: usize,
}

impl RankSurface {
    pub fn from_dataset(dataset: &HousingDataset) -> Self {
        let snapshots: Vec<RankSnapshot> = dataset.slices().iter().map(RankSnapshot::from_slice).collect();
        let mut ranks: BTreeMap<String, Vec<Option<usize>>> = BTreeMap::new();
        for (i, snapshot) in snapshots.iter().enumerate() {
            for entry in &snapshot.entries {
                ranks
                    .entry(entry.borough.clone())
                    .or_insert_with(|| vec![None; snapshots.len()])[i] = Some(entry.rank);
            }
        }
        let max_rank = snapshots.iter().map(RankSnapshot::len).max().unwrap_or(0);
        Self {
            lines: ranks
                .into_iter()
                .map(|(borough, ranks)| RankLine {
                    borough,
                    ranks,
                    emphasis: Emphasis::Normal,
                })
                .collect(),
            dots: Vec::new(),
            max_rank,
            len: snapshots.len(),
            cursor: 0,
        }
    }

    pub fn line(&self, borough: &str) -> Option<&RankLine> {
        self.lines.iter().find(|l| l.borough == borough)
    }

    pub fn dot(&self, borough: &str) -> Option<&RankDot> {
        self.dots.iter().find(|d| d.borough == borough)
    }

    /// Join `snapshot` into the dots by borough: new boroughs enter from
    /// radius 0, present ones move to their new rank, absent ones shrink
    /// away and are dropped by [`RankSurface::advance`].
    pub fn join(&mut self, snapshot: &RankSnapshot, duration_ms: u64) {
        for dot in &mut self.dots {
            if snapshot.entry(&dot.borough).is_none() && dot.phase != DotPhase::Exiting {
                dot.phase = DotPhase::Exiting;
                dot.size.retarget(0.0, duration_ms);
            }
        }
        for entry in &snapshot.entries {
            let rank = entry.rank as f64;
            match self.dots.iter_mut().find(|d| d.borough == entry.borough) {
                Some(dot) => {
                    dot.rank = entry.rank;
                    dot.price = entry.price;
                    dot.position.retarget(rank, duration_ms);
                    if dot.phase == DotPhase::Exiting {
                        dot.phase = DotPhase::Entering;
                        dot.size.retarget(DOT_RADIUS, duration_ms);
                    }
                }
                None => self.dots.push(RankDot {
                    borough: entry.borough.clone(),
                    rank: entry.rank,
                    price: entry.price,
                    position: Tween::settled(rank),
                    size: Tween {
                        from: 0.0,
                        to: DOT_RADIUS,
                        elapsed_ms: 0,
                        duration_ms,
                    },
                    phase: DotPhase::Entering,
                    emphasis: Emphasis::Normal,
                }),
            }
        }
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        for dot in &mut self.dots {
            dot.position.advance(elapsed_ms);
            dot.size.advance(elapsed_ms);
            if dot.phase == DotPhase::Entering && dot.size.is_done() {
                dot.phase = DotPhase::Steady;
            }
        }
        self.dots
            .retain(|d| !(d.phase == DotPhase::Exiting && d.size.is_done()));
    }

    /// Dots that are not on their way out.
    pub fn live_dots(&self) -> impl Iterator<Item = &RankDot> {
        self.dots.iter().filter(|d| d.phase != DotPhase::Exiting)
    }
}

/// The three surfaces kept in sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surfaces {
    pub map: MapSurface,
    pub line: LineSurface,
    pub rank: RankSurface,
}

impl Surfaces {
    pub fn new(dataset: &HousingDataset, features: Vec<GeoFeature>) -> Self {
        let (lo, hi) = dataset.all_regions_price_extent();
        let boroughs: Vec<&str> = crate::model::LONDON_BOROUGHS.to_vec();
        Self {
            map: MapSurface::new(features, ColorScale::new(lo, hi)),
            line: LineSurface::from_dataset(dataset, &boroughs),
            rank: RankSurface::from_dataset(dataset),
        }
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        self.map.advance(elapsed_ms);
        self.rank.advance(elapsed_ms);
    }
}
