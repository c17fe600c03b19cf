//! Page-level state: the scene tree, the breakout controller, the
//! scheduler and the synchronized visualization, driven by host events.
//!
//! The host forwards scroll, frame, pointer and slider events plus the
//! current time; nothing here reads a clock or touches globals.

use std::collections::BTreeMap;

use borough_lens_protocol::{RenderCommand, Viewport};
use log::{debug, error, info};

use crate::config::ExplorerConfig;
use crate::model::{GeoFeature, HousingDataset, RankSnapshot, SceneTree};
use crate::parsers::{self, ParseError};
use crate::schedule::Scheduler;
use crate::scroll::{BreakoutController, ScrollGeometry, SectionGeometry, SectionStatus};
use crate::svg::render_svg;
use crate::views;
use crate::viz::{HoverRecord, Pointer, SurfaceKind, Surfaces, SyncHub, TimelineController};

/// Dataset plus the surfaces derived from it.
#[derive(Debug, Clone)]
struct Visualization {
    dataset: HousingDataset,
    surfaces: Surfaces,
}

pub struct Explorer {
    tree: SceneTree,
    breakout: BreakoutController,
    scheduler: Scheduler,
    timeline: TimelineController,
    sync: SyncHub,
    viz: Option<Visualization>,
    now_ms: u64,
}

impl Explorer {
    /// Take ownership of the page tree and set up every configured section.
    /// The clock starts at 0.
    pub fn new(config: ExplorerConfig, tree: SceneTree) -> Self {
        Self::starting_at(config, tree, 0)
    }

    /// Like [`Explorer::new`], with the clock seeded from the host's
    /// current time so tasks scheduled before the first
    /// [`Explorer::advance_clock`] are not already overdue.
    pub fn starting_at(config: ExplorerConfig, mut tree: SceneTree, now_ms: u64) -> Self {
        let mut breakout = BreakoutController::new(config.breakout);
        breakout.setup(&mut tree);
        Self {
            tree,
            breakout,
            scheduler: Scheduler::new(),
            timeline: TimelineController::new(config.timeline),
            sync: SyncHub::new(),
            viz: None,
            now_ms,
        }
    }

    /// Parse the time series and the boundaries and build the surfaces at
    /// the first date. On failure the error is logged and the
    /// visualization stays unrendered.
    pub fn load_datasets(&mut self, csv: &[u8], topology: &[u8]) -> Result<(), ParseError> {
        let loaded = parsers::parse_dataset(csv)
            .and_then(|dataset| parsers::parse_boundaries(topology).map(|features| (dataset, features)));
        let (dataset, features) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("data load error: {e}");
                return Err(e);
            }
        };
        info!(
            "loaded {} dates and {} borough shapes",
            dataset.timeline().len(),
            features.len()
        );
        self.set_dataset(dataset, features);
        Ok(())
    }

    /// Install an already parsed dataset, replacing any previous one.
    pub fn set_dataset(&mut self, dataset: HousingDataset, features: Vec<GeoFeature>) {
        let mut surfaces = Surfaces::new(&dataset, features);
        self.timeline.pause(&mut self.scheduler);
        self.timeline.set_date(&dataset, &mut surfaces, 0);
        // First render is not animated.
        surfaces.advance(u64::MAX);
        self.sync = SyncHub::new();
        self.viz = Some(Visualization { dataset, surfaces });
    }

    pub fn is_rendered(&self) -> bool {
        self.viz.is_some()
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn breakout(&self) -> &BreakoutController {
        &self.breakout
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn sync(&self) -> &SyncHub {
        &self.sync
    }

    pub fn dataset(&self) -> Option<&HousingDataset> {
        self.viz.as_ref().map(|v| &v.dataset)
    }

    pub fn surfaces(&self) -> Option<&Surfaces> {
        self.viz.as_ref().map(|v| &v.surfaces)
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Debug view of every tracked section.
    pub fn status(&self) -> Vec<SectionStatus> {
        self.breakout.status()
    }

    /// Scroll event. `true` asks the host for an animation frame.
    pub fn scroll(&mut self) -> bool {
        self.breakout.on_scroll()
    }

    /// Animation frame with fresh geometry for the tracked sections.
    pub fn frame(&mut self, scroll: &ScrollGeometry, geometry: &BTreeMap<String, SectionGeometry>) {
        self.breakout
            .on_frame(&mut self.tree, &mut self.scheduler, scroll, geometry, self.now_ms);
    }

    /// Fullscreen button of section `id`. Returns whether it is now
    /// fullscreen, or `None` for an untracked section.
    pub fn toggle_fullscreen(&mut self, id: &str) -> Option<bool> {
        self.breakout
            .toggle_fullscreen(&mut self.tree, &mut self.scheduler, id, self.now_ms)
    }

    /// Escape key. Returns how many sections left fullscreen.
    pub fn escape(&mut self) -> usize {
        self.breakout.escape(&mut self.tree, &mut self.scheduler)
    }

    /// Move the virtual clock to `now_ms`, run every task that fell due and
    /// step running transitions. Time never goes backwards.
    pub fn advance_clock(&mut self, now_ms: u64) {
        if now_ms < self.now_ms {
            debug!("ignoring clock step back from {} to {now_ms}", self.now_ms);
            return;
        }
        let elapsed = now_ms - self.now_ms;
        self.now_ms = now_ms;

        for key in self.scheduler.take_due(now_ms) {
            if self.breakout.on_task(&mut self.tree, &key) {
                continue;
            }
            if let Some(viz) = &mut self.viz
                && self.timeline.on_task(&key, &viz.dataset, &mut viz.surfaces)
            {
                self.sync.reapply(&mut viz.surfaces);
                continue;
            }
            debug!("no handler for {key:?}");
        }

        if let Some(viz) = &mut self.viz {
            viz.surfaces.advance(elapsed);
        }
    }

    /// Slider input. Returns the index shown, or `None` before data loads.
    pub fn set_date(&mut self, index: usize) -> Option<usize> {
        let viz = self.viz.as_mut()?;
        let shown = self.timeline.set_date(&viz.dataset, &mut viz.surfaces, index);
        self.sync.reapply(&mut viz.surfaces);
        Some(shown)
    }

    pub fn date_label(&self) -> Option<&str> {
        self.dataset()?.timeline().label(self.timeline.index())
    }

    /// Play/pause button. Returns whether playback is now running.
    pub fn toggle_play(&mut self) -> bool {
        if self.viz.is_none() {
            return false;
        }
        self.timeline.toggle(&mut self.scheduler, self.now_ms)
    }

    pub fn pause(&mut self) {
        self.timeline.pause(&mut self.scheduler);
    }

    /// Pointer entered `borough` on `source`. The tooltip shows the
    /// borough's data for the current date.
    pub fn hover(&mut self, source: SurfaceKind, borough: &str, pointer: Pointer) -> bool {
        let Some(viz) = &mut self.viz else {
            return false;
        };
        let index = self.timeline.index();
        let slice = viz.dataset.slice(index);
        let name = borough.trim();
        match source {
            SurfaceKind::Map | SurfaceKind::Line => {
                let date = viz.dataset.timeline().label(index).unwrap_or_default();
                let record = HoverRecord::Series {
                    date,
                    record: slice.and_then(|s| s.get(name)),
                };
                self.sync
                    .highlight(&mut viz.surfaces, name, Some((pointer, record)))
            }
            SurfaceKind::Rank => {
                let snapshot = slice.map(RankSnapshot::from_slice);
                let hover = snapshot
                    .as_ref()
                    .and_then(|s| s.entry(name))
                    .map(|entry| (pointer, HoverRecord::Rank(entry)));
                self.sync.highlight(&mut viz.surfaces, name, hover)
            }
        }
    }

    pub fn pointer_move(&mut self, pointer: Pointer) {
        self.sync.move_pointer(pointer);
    }

    /// Pointer left whatever was highlighted.
    pub fn leave(&mut self) {
        if let Some(viz) = &mut self.viz {
            self.sync.reset(&mut viz.surfaces);
        }
    }

    pub fn render(&self, surface: SurfaceKind, viewport: &Viewport) -> Vec<RenderCommand> {
        let Some(viz) = &self.viz else {
            return Vec::new();
        };
        let timeline = viz.dataset.timeline();
        match surface {
            SurfaceKind::Map => views::render_map(&viz.surfaces.map, viewport),
            SurfaceKind::Line => views::render_line_chart(&viz.surfaces.line, timeline, viewport),
            SurfaceKind::Rank => views::render_rank_chart(&viz.surfaces.rank, timeline, viewport),
        }
    }

    pub fn render_tooltip(&self) -> Vec<RenderCommand> {
        views::render_tooltip(self.sync.tooltip())
    }

    /// One surface as a standalone SVG document, tooltip included.
    pub fn render_svg(&self, surface: SurfaceKind, viewport: &Viewport, dark: bool) -> String {
        let mut commands = self.render(surface, viewport);
        commands.extend(self.render_tooltip());
        render_svg(&commands, viewport.width, viewport.height, dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarDate, Stage, TimeSeriesRecord};
    use crate::schedule::TaskKey;
    use crate::testing::compare_page;
    use crate::viz::Emphasis;

    fn dataset() -> HousingDataset {
        let mut records = Vec::new();
        for month in 1..=3 {
            for (i, borough) in ["Camden", "Barnet", "Brent"].iter().enumerate() {
                records.push(TimeSeriesRecord {
                    region: borough.to_string(),
                    date: CalendarDate::new(2024, month, 1),
                    average_price: Some(500_000.0 - i as f64 * 50_000.0 + f64::from(month)),
                    change_1m: Some(0.1),
                    change_12m: None,
                });
            }
        }
        HousingDataset::from_records(records)
    }

    fn explorer() -> Explorer {
        let (tree, _) = compare_page();
        let mut explorer = Explorer::new(ExplorerConfig::default(), tree);
        explorer.set_dataset(dataset(), Vec::new());
        explorer
    }

    /// Geometry for `compare` at `progress`, with the section at the top of
    /// the document, 2000px tall in an 800px viewport.
    fn frame_at(explorer: &mut Explorer, progress: f64) {
        let scroll_y = progress * 1200.0;
        let geometry = BTreeMap::from([(
            "compare".to_string(),
            SectionGeometry {
                rect_top: -scroll_y,
                height: 2000.0,
            },
        )]);
        explorer.scroll();
        explorer.frame(
            &ScrollGeometry {
                scroll_y,
                viewport_height: 800.0,
            },
            &geometry,
        );
    }

    #[test]
    fn scroll_through_section() {
        let mut explorer = explorer();
        assert_eq!(explorer.status().len(), 1);

        frame_at(&mut explorer, 0.5);
        let section = explorer.breakout().section("compare").unwrap();
        assert_eq!(section.stage, Stage::Active);
        assert!(section.is_relocated());
        assert!(!explorer.breakout().is_frame_pending());

        explorer.advance_clock(1_000);
        frame_at(&mut explorer, 0.95);
        let section = explorer.breakout().section("compare").unwrap();
        assert_eq!(section.stage, Stage::Exiting);
        assert!(!section.is_relocated());
        assert!(section.overlay_visible);
        assert!(explorer.scheduler().is_scheduled(&TaskKey::HideOverlay("compare".into())));

        explorer.advance_clock(1_400);
        let section = explorer.breakout().section("compare").unwrap();
        assert!(!section.overlay_visible);
        assert_eq!(explorer.tree().style(section.breakout, "display"), Some("none"));
    }

    #[test]
    fn hover_and_leave() {
        let mut explorer = explorer();
        let before = explorer.surfaces().unwrap().clone();

        assert!(explorer.hover(SurfaceKind::Map, " Camden ", Pointer { x: 5.0, y: 50.0 }));
        assert_eq!(explorer.sync().highlighted(), Some("Camden"));
        let tooltip = explorer.sync().tooltip();
        assert!(tooltip.visible);
        assert_eq!(
            tooltip.content.as_ref().unwrap().lines()[0],
            "January 2024"
        );
        assert!(!explorer.render_tooltip().is_empty());

        explorer.leave();
        assert_eq!(explorer.surfaces().unwrap(), &before);
        assert!(explorer.render_tooltip().is_empty());
    }

    #[test]
    fn rank_hover_shows_rank() {
        let mut explorer = explorer();
        assert!(explorer.hover(SurfaceKind::Rank, "Barnet", Pointer { x: 0.0, y: 0.0 }));
        let lines = explorer.sync().tooltip().content.as_ref().unwrap().lines();
        assert_eq!(lines[0], "Rank: 2");
    }

    #[test]
    fn playback_keeps_highlight() {
        let mut explorer = explorer();
        explorer.hover(SurfaceKind::Line, "Camden", Pointer { x: 0.0, y: 0.0 });
        assert!(explorer.toggle_play());

        explorer.advance_clock(100);
        assert_eq!(explorer.timeline().index(), 1);
        assert_eq!(explorer.date_label(), Some("February 2024"));
        let rank = &explorer.surfaces().unwrap().rank;
        assert_eq!(rank.dot("Camden").unwrap().emphasis, Emphasis::Emphasized);
        assert_eq!(rank.dot("Brent").unwrap().emphasis, Emphasis::Dimmed);

        explorer.advance_clock(200);
        assert_eq!(explorer.timeline().index(), 2);
        // Wraps after the last date.
        explorer.advance_clock(300);
        assert_eq!(explorer.timeline().index(), 0);

        assert!(!explorer.toggle_play());
        explorer.advance_clock(1_000);
        assert_eq!(explorer.timeline().index(), 0);
        assert!(explorer.scheduler().is_empty());
    }

    #[test]
    fn long_gap_advances_playback_by_one_step() {
        let mut explorer = explorer();
        assert!(explorer.toggle_play());
        explorer.advance_clock(30_000);
        assert_eq!(explorer.timeline().index(), 1);
        explorer.advance_clock(30_050);
        assert_eq!(explorer.timeline().index(), 1);
        explorer.advance_clock(30_100);
        assert_eq!(explorer.timeline().index(), 2);
    }

    #[test]
    fn seeded_clock_schedules_from_host_time() {
        let (tree, _) = compare_page();
        let mut explorer = Explorer::starting_at(ExplorerConfig::default(), tree, 5_000_000);
        explorer.set_dataset(dataset(), Vec::new());
        assert_eq!(explorer.now_ms(), 5_000_000);
        assert!(explorer.toggle_play());
        assert_eq!(explorer.scheduler().next_due(), Some(5_000_100));

        explorer.advance_clock(5_000_099);
        assert_eq!(explorer.timeline().index(), 0);
        explorer.advance_clock(5_000_100);
        assert_eq!(explorer.timeline().index(), 1);
    }

    #[test]
    fn fullscreen_classes_expire_on_the_clock() {
        let mut explorer = explorer();
        explorer.advance_clock(1_000);
        let anchor = explorer.breakout().section("compare").unwrap().anchor;
        let has = |ex: &Explorer, class: &str| ex.tree().node(anchor).unwrap().has_class(class);

        assert_eq!(explorer.toggle_fullscreen("compare"), Some(true));
        assert!(explorer.scheduler().is_scheduled(&TaskKey::FullscreenEntered("compare".into())));
        explorer.advance_clock(1_500);
        assert!(!has(&explorer, "fullscreen-enter-animation"));
        assert!(has(&explorer, "fullscreen-mode"));

        assert_eq!(explorer.toggle_fullscreen("compare"), Some(false));
        explorer.advance_clock(1_600);
        assert!(!has(&explorer, "fullscreen-mode"));

        explorer.toggle_fullscreen("compare");
        assert_eq!(explorer.escape(), 1);
        assert!(!has(&explorer, "fullscreen-mode"));
        assert_eq!(explorer.toggle_fullscreen("about"), None);
    }

    #[test]
    fn clock_never_goes_back() {
        let mut explorer = explorer();
        explorer.advance_clock(500);
        explorer.advance_clock(100);
        assert_eq!(explorer.now_ms(), 500);
    }

    #[test]
    fn failed_load_leaves_visualization_unrendered() {
        let (tree, _) = compare_page();
        let mut explorer = Explorer::new(ExplorerConfig::default(), tree);
        assert!(explorer.load_datasets(b"", b"{}").is_err());
        assert!(!explorer.is_rendered());
        assert!(!explorer.toggle_play());
        assert_eq!(explorer.set_date(3), None);
        assert!(explorer.render(SurfaceKind::Map, &Viewport::new(960.0, 600.0)).is_empty());
    }

    #[test]
    fn svg_export_contains_every_borough_path() {
        let explorer = explorer();
        let svg = explorer.render_svg(SurfaceKind::Rank, &Viewport::new(472.0, 140.0), false);
        for borough in ["Camden", "Barnet", "Brent"] {
            assert!(svg.contains(&format!(r#"data-borough="{borough}""#)), "{borough}");
        }
    }
}
