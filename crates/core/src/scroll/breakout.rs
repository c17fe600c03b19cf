//! Per-section breakout state machine.
//!
//! Each frame the controller reclassifies every section and runs side
//! effects only on stage edges. Relocation is committed once per activation;
//! styles are refreshed every frame after any relocation.

use std::collections::BTreeMap;

use borough_lens_protocol::StyleParams;
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::BreakoutConfig;
use crate::model::{NodeId, Placement, SceneTree, Section, SectionKind, Stage};
use crate::schedule::{Scheduler, TaskKey};
use crate::scroll::progress::{ScrollGeometry, ScrollTracker, SectionGeometry, section_progress};
use crate::scroll::relocate::{build_overlay, move_back, move_to_breakout};
use crate::scroll::stage::{StageClassifier, StageState, slot_styles};

/// Eased transition above which the inline content is marked as broken out.
const HAS_BREAKOUT_THRESHOLD: f64 = 0.2;

const FULLSCREEN_MODE: &str = "fullscreen-mode";
const FULLSCREEN_ENTER: &str = "fullscreen-enter-animation";
const FULLSCREEN_EXIT: &str = "fullscreen-exit-animation";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakoutError {
    #[error("no breakout layout for section `{0}`")]
    UnknownKind(String),
    #[error("section `{0}` is already set up")]
    Duplicate(String),
}

/// Read-only view of one section, for hosts and debug panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStatus {
    pub id: String,
    pub progress: f64,
    pub stage: Stage,
    pub relocated: bool,
    pub overlay_visible: bool,
    pub overlay_exiting: bool,
    pub style: StyleParams,
    pub fullscreen: bool,
}

/// Wrap a section's children into `section-sticky-wrapper > section-content`,
/// build its overlay, and return the tracked record.
pub fn prepare_section(
    tree: &mut SceneTree,
    anchor: NodeId,
    id: &str,
    kind: SectionKind,
    scroll_height_multiplier: f64,
) -> Section {
    tree.toggle_class(anchor, "transition-section", true);
    tree.set_style(
        anchor,
        "min-height",
        format!("{}vh", scroll_height_multiplier * 100.0),
    );

    let sticky_wrapper = tree.create("div", None, &["section-sticky-wrapper"]);
    let content_wrapper = tree.create("div", None, &["section-content"]);
    let children = tree.children(anchor).to_vec();
    for child in children {
        let _ = tree.append_child(content_wrapper, child);
    }
    let _ = tree.append_child(sticky_wrapper, content_wrapper);
    let _ = tree.append_child(anchor, sticky_wrapper);

    let (breakout, layout) = build_overlay(tree, id, kind);

    Section {
        id: id.to_string(),
        kind,
        anchor,
        sticky_wrapper,
        content_wrapper,
        breakout,
        layout,
        progress: 0.0,
        stage: Stage::Inactive,
        placement: Placement::Home,
        moved: Vec::new(),
        overlay_visible: false,
        overlay_exiting: false,
        style: StyleParams::HIDDEN,
        fullscreen: false,
    }
}

#[derive(Debug)]
pub struct BreakoutController {
    config: BreakoutConfig,
    classifier: StageClassifier,
    tracker: ScrollTracker,
    sections: BTreeMap<String, Section>,
}

impl BreakoutController {
    pub fn new(config: BreakoutConfig) -> Self {
        Self {
            classifier: StageClassifier::from_config(&config),
            config,
            tracker: ScrollTracker::new(),
            sections: BTreeMap::new(),
        }
    }

    /// Set up every configured section found under the body. Missing
    /// sections are skipped. Returns how many were set up.
    pub fn setup(&mut self, tree: &mut SceneTree) -> usize {
        let ids = self.config.sections.clone();
        let mut count = 0;
        for id in &ids {
            let Some(anchor) = tree.query_selector(tree.body(), &format!("#{id}")) else {
                warn!("section #{id} not found");
                continue;
            };
            match self.setup_section(tree, anchor, id) {
                Ok(()) => count += 1,
                Err(e) => warn!("{e}"),
            }
        }
        info!("breakout ready for {count} section(s)");
        count
    }

    pub fn setup_section(
        &mut self,
        tree: &mut SceneTree,
        anchor: NodeId,
        id: &str,
    ) -> Result<(), BreakoutError> {
        let kind = SectionKind::from_section_id(id)
            .ok_or_else(|| BreakoutError::UnknownKind(id.to_string()))?;
        if self.sections.contains_key(id) {
            return Err(BreakoutError::Duplicate(id.to_string()));
        }
        let section = prepare_section(tree, anchor, id, kind, self.config.scroll_height_multiplier);
        self.sections.insert(id.to_string(), section);
        Ok(())
    }

    /// Record a scroll event; `true` means the host should request a frame.
    pub fn on_scroll(&mut self) -> bool {
        self.tracker.on_scroll()
    }

    /// Animation-frame callback: recompute progress for every section that
    /// has geometry and apply the result.
    pub fn on_frame(
        &mut self,
        tree: &mut SceneTree,
        scheduler: &mut Scheduler,
        scroll: &ScrollGeometry,
        geometry: &BTreeMap<String, SectionGeometry>,
        now_ms: u64,
    ) {
        self.tracker.on_frame();
        let ids: Vec<String> = self.sections.keys().cloned().collect();
        for id in ids {
            let Some(rect) = geometry.get(&id) else {
                continue;
            };
            let progress = section_progress(scroll, rect);
            self.apply_progress(tree, scheduler, &id, progress, now_ms);
        }
    }

    /// Classify `progress` for one section and run the resulting effects.
    pub fn apply_progress(
        &mut self,
        tree: &mut SceneTree,
        scheduler: &mut Scheduler,
        id: &str,
        progress: f64,
        now_ms: u64,
    ) {
        let state = self.classifier.classify(progress);
        let hide_delay = self.config.hide_delay_ms;
        let commit = self.config.commit;
        let Some(section) = self.sections.get_mut(id) else {
            debug!("progress for unknown section {id}");
            return;
        };
        section.progress = progress;

        if state.stage != section.stage {
            debug!("{id}: {:?} -> {:?} at {progress:.3}", section.stage, state.stage);
            section.stage = state.stage;
            tree.toggle_class(section.breakout, "active", state.stage == Stage::Active);
            match state.stage {
                Stage::Active => {
                    scheduler.cancel(&TaskKey::HideOverlay(id.to_string()));
                    set_overlay_visible(tree, section, true);
                    set_overlay_exiting(tree, section, false);
                }
                Stage::Exiting => {
                    move_back(tree, section);
                    if section.overlay_visible {
                        set_overlay_exiting(tree, section, true);
                        scheduler.schedule_once(TaskKey::HideOverlay(id.to_string()), now_ms, hide_delay);
                    }
                }
                Stage::Inactive => {
                    move_back(tree, section);
                    scheduler.cancel(&TaskKey::HideOverlay(id.to_string()));
                    set_overlay_exiting(tree, section, false);
                    set_overlay_visible(tree, section, false);
                }
            }
        }

        if section.stage == Stage::Active && !section.is_relocated() && progress > commit {
            let moved = move_to_breakout(tree, section);
            debug!("{id}: relocated {moved} node(s)");
        }

        apply_styles(tree, section, &state);
    }

    /// Run a fired scheduler task. Returns whether it belonged here.
    pub fn on_task(&mut self, tree: &mut SceneTree, key: &TaskKey) -> bool {
        let id = match key {
            TaskKey::HideOverlay(id) | TaskKey::FullscreenEntered(id) | TaskKey::FullscreenExited(id) => id,
            TaskKey::PlayTick => return false,
        };
        let Some(section) = self.sections.get_mut(id) else {
            return true;
        };
        match key {
            // A re-activated section keeps its overlay.
            TaskKey::HideOverlay(_) if section.stage == Stage::Active => {
                debug!("{id}: stale hide ignored");
            }
            TaskKey::HideOverlay(_) => {
                set_overlay_exiting(tree, section, false);
                set_overlay_visible(tree, section, false);
            }
            TaskKey::FullscreenEntered(_) => tree.toggle_class(section.anchor, FULLSCREEN_ENTER, false),
            // Re-entered before the exit animation finished.
            TaskKey::FullscreenExited(_) if section.fullscreen => {
                debug!("{id}: stale fullscreen exit ignored");
            }
            TaskKey::FullscreenExited(_) => {
                tree.toggle_class(section.anchor, FULLSCREEN_MODE, false);
                tree.toggle_class(section.anchor, FULLSCREEN_EXIT, false);
            }
            TaskKey::PlayTick => return false,
        }
        true
    }

    /// Fullscreen button of section `id`. Returns whether the section is
    /// now fullscreen, or `None` when `id` is not tracked.
    ///
    /// Animated sections keep `fullscreen-mode` through the exit animation;
    /// toggling again before it ends re-enters straight away.
    pub fn toggle_fullscreen(
        &mut self,
        tree: &mut SceneTree,
        scheduler: &mut Scheduler,
        id: &str,
        now_ms: u64,
    ) -> Option<bool> {
        let enter_ms = self.config.fullscreen_enter_ms;
        let exit_ms = self.config.fullscreen_exit_ms;
        let Some(section) = self.sections.get_mut(id) else {
            debug!("fullscreen toggle for unknown section {id}");
            return None;
        };
        let entered = !section.fullscreen;
        section.fullscreen = entered;
        cancel_fullscreen_tasks(scheduler, id);
        let anchor = section.anchor;
        tree.toggle_class(anchor, FULLSCREEN_ENTER, false);
        tree.toggle_class(anchor, FULLSCREEN_EXIT, false);

        let animated = section.kind.animates_fullscreen();
        if entered {
            tree.toggle_class(anchor, FULLSCREEN_MODE, true);
            if animated {
                tree.toggle_class(anchor, FULLSCREEN_ENTER, true);
                scheduler.schedule_once(TaskKey::FullscreenEntered(id.to_string()), now_ms, enter_ms);
            }
        } else if animated {
            tree.toggle_class(anchor, FULLSCREEN_EXIT, true);
            scheduler.schedule_once(TaskKey::FullscreenExited(id.to_string()), now_ms, exit_ms);
        } else {
            tree.toggle_class(anchor, FULLSCREEN_MODE, false);
        }
        debug!("{id}: fullscreen {}", if entered { "on" } else { "off" });
        Some(entered)
    }

    /// Escape key: drop fullscreen mode on every section at once, without
    /// exit animations. Returns how many sections left fullscreen.
    pub fn escape(&mut self, tree: &mut SceneTree, scheduler: &mut Scheduler) -> usize {
        let mut left = 0;
        for (id, section) in &mut self.sections {
            let anchor = section.anchor;
            let in_mode = tree.node(anchor).is_some_and(|n| n.has_class(FULLSCREEN_MODE));
            if !in_mode && !section.fullscreen {
                continue;
            }
            section.fullscreen = false;
            cancel_fullscreen_tasks(scheduler, id);
            for class in [FULLSCREEN_MODE, FULLSCREEN_ENTER, FULLSCREEN_EXIT] {
                tree.toggle_class(anchor, class, false);
            }
            left += 1;
        }
        if left > 0 {
            debug!("escape left fullscreen on {left} section(s)");
        }
        left
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn is_frame_pending(&self) -> bool {
        self.tracker.is_pending()
    }

    pub fn status(&self) -> Vec<SectionStatus> {
        self.sections
            .values()
            .map(|s| SectionStatus {
                id: s.id.clone(),
                progress: s.progress,
                stage: s.stage,
                relocated: s.is_relocated(),
                overlay_visible: s.overlay_visible,
                overlay_exiting: s.overlay_exiting,
                style: s.style,
                fullscreen: s.fullscreen,
            })
            .collect()
    }
}

fn cancel_fullscreen_tasks(scheduler: &mut Scheduler, id: &str) {
    scheduler.cancel(&TaskKey::FullscreenEntered(id.to_string()));
    scheduler.cancel(&TaskKey::FullscreenExited(id.to_string()));
}

fn set_overlay_visible(tree: &mut SceneTree, section: &mut Section, visible: bool) {
    section.overlay_visible = visible;
    tree.set_style(section.breakout, "display", if visible { "block" } else { "none" });
}

fn set_overlay_exiting(tree: &mut SceneTree, section: &mut Section, exiting: bool) {
    section.overlay_exiting = exiting;
    tree.toggle_class(section.breakout, "exiting", exiting);
}

fn apply_styles(tree: &mut SceneTree, section: &mut Section, state: &StageState) {
    section.style = state.style();
    for (name, value) in section.style.custom_properties() {
        tree.set_style(section.breakout, name, value);
    }

    let slots = tree.children(section.layout).to_vec();
    for (node, slot) in slots.iter().zip(slot_styles(state.transition, slots.len())) {
        for (name, value) in slot.custom_properties() {
            tree.set_style(*node, name, value);
        }
    }

    let has_breakout =
        section.is_relocated() && !section.overlay_exiting && state.eased > HAS_BREAKOUT_THRESHOLD;
    tree.toggle_class(section.content_wrapper, "has-breakout", has_breakout);
}
