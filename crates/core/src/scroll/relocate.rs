//! Moving section content between its inline home and the overlay.
//!
//! Nodes are reparented by id, never cloned, so whatever a node carries
//! (children, styles, listeners) comes along. Selectors that find nothing
//! are skipped: partial relocation is fine, a missing node is not an error.

use log::debug;

use crate::model::{ContentRole, NodeId, Placement, SceneTree, Section, SectionKind};

/// Where a role is found at home and which overlay slot it moves to.
struct Route {
    role: ContentRole,
    /// Optional container to search first (relative to the content wrapper).
    within: Option<&'static str>,
    selector: &'static str,
    slot: &'static str,
}

const COMPARE_ROUTES: &[Route] = &[
    Route {
        role: ContentRole::TopControls,
        within: None,
        selector: "#topControls",
        slot: "controls-area",
    },
    Route {
        role: ContentRole::Insight,
        within: None,
        selector: "#insightContainer",
        slot: "insight-area",
    },
    Route {
        role: ContentRole::MapWrapper,
        within: None,
        selector: "#mapWrapper",
        slot: "map-area",
    },
    Route {
        role: ContentRole::LineChart,
        within: Some("#chartsWrapper"),
        selector: ".chart-container:nth-child(1)",
        slot: "chart-top",
    },
    Route {
        role: ContentRole::RankChart,
        within: Some("#chartsWrapper"),
        selector: ".chart-container:nth-child(2)",
        slot: "chart-bottom",
    },
];

const FIND_ROUTES: &[Route] = &[
    Route {
        role: ContentRole::SuitabilityMap,
        within: None,
        selector: ".suitability-left",
        slot: "map-area",
    },
    Route {
        role: ContentRole::SuitabilityMetrics,
        within: None,
        selector: ".suitability-metrics-right",
        slot: "metrics-area",
    },
];

fn routes(kind: SectionKind) -> &'static [Route] {
    match kind {
        SectionKind::Compare => COMPARE_ROUTES,
        SectionKind::Find => FIND_ROUTES,
    }
}

/// Build the (hidden, detached-from-layout) fullscreen overlay for a
/// section and attach it to the body. Returns `(container, layout)`.
pub fn build_overlay(tree: &mut SceneTree, section_id: &str, kind: SectionKind) -> (NodeId, NodeId) {
    let container_id = format!("{section_id}-fullscreen");
    let container = tree.create("div", Some(&container_id), &["fullscreen-breakout"]);
    tree.set_style(container, "display", "none");

    let layout = tree.create("div", None, &[kind.layout_class()]);
    for slot in kind.slots() {
        let node = tree.create("div", None, &[slot]);
        // Fresh nodes: appends cannot fail.
        let _ = tree.append_child(layout, node);
    }
    let _ = tree.append_child(container, layout);
    let body = tree.body();
    let _ = tree.append_child(body, container);
    (container, layout)
}

/// Move the section's named content into the overlay slots.
///
/// Returns the number of nodes moved. No-op when already relocated.
pub fn move_to_breakout(tree: &mut SceneTree, section: &mut Section) -> usize {
    if section.placement == Placement::Breakout {
        return 0;
    }

    // Resolve every source before moving anything: nth-child positions
    // shift as soon as the first chart leaves its wrapper.
    let resolved: Vec<(ContentRole, NodeId, NodeId)> = routes(section.kind)
        .iter()
        .filter_map(|route| {
            let root = match route.within {
                Some(within) => tree.query_selector(section.content_wrapper, within),
                None => Some(section.content_wrapper),
            };
            let node = root.and_then(|r| tree.query_selector(r, route.selector));
            let slot = tree.query_selector(section.layout, &format!(".{}", route.slot));
            match (node, slot) {
                (Some(node), Some(slot)) => Some((route.role, node, slot)),
                _ => {
                    debug!(
                        "{}: skipping {:?} ({} -> .{})",
                        section.id, route.role, route.selector, route.slot
                    );
                    None
                }
            }
        })
        .collect();

    let mut moved = 0;
    for (role, node, slot) in resolved {
        match tree.append_child(slot, node) {
            Ok(()) => {
                section.moved.push((role, node));
                moved += 1;
            }
            Err(e) => debug!("{}: cannot move {:?}: {e}", section.id, role),
        }
    }
    section.placement = Placement::Breakout;
    moved
}

/// Return relocated content to its home position, rebuilding wrappers
/// that no longer exist. No-op when content is already home.
pub fn move_back(tree: &mut SceneTree, section: &mut Section) -> usize {
    if section.placement == Placement::Home {
        return 0;
    }
    let moved = section.moved.len();
    match section.kind {
        SectionKind::Compare => restore_compare(tree, section),
        SectionKind::Find => restore_find(tree, section),
    }
    section.moved.clear();
    section.placement = Placement::Home;
    moved
}

fn find_or_create(
    tree: &mut SceneTree,
    root: NodeId,
    selector: &str,
    id: Option<&str>,
    classes: &[&str],
) -> NodeId {
    match tree.query_selector(root, selector) {
        Some(node) => node,
        None => tree.create("div", id, classes),
    }
}

fn restore_compare(tree: &mut SceneTree, section: &Section) {
    let content = section.content_wrapper;
    let visual = find_or_create(tree, content, "#visualSection", Some("visualSection"), &["visual-section"]);
    let charts = find_or_create(tree, visual, "#chartsWrapper", Some("chartsWrapper"), &["charts-wrapper"]);

    // visual section: [map, charts, ..]; charts: [line, rank, ..]
    let _ = tree.prepend_child(visual, charts);
    if let Some(map) = section.moved_node(ContentRole::MapWrapper) {
        let _ = tree.prepend_child(visual, map);
    }
    if let Some(rank) = section.moved_node(ContentRole::RankChart) {
        let _ = tree.prepend_child(charts, rank);
    }
    if let Some(line) = section.moved_node(ContentRole::LineChart) {
        let _ = tree.prepend_child(charts, line);
    }

    // content wrapper: [.., controls, visual, insight, tooltip]
    let anchor = tree
        .query_selector(content, ".tooltip")
        .filter(|t| tree.parent(*t) == Some(content));
    let controls = section.moved_node(ContentRole::TopControls);
    let insight = section.moved_node(ContentRole::Insight);
    for node in [controls, Some(visual), insight].into_iter().flatten() {
        if let Err(e) = tree.insert_before(content, node, anchor) {
            debug!("{}: cannot restore node: {e}", section.id);
        }
    }
}

fn restore_find(tree: &mut SceneTree, section: &Section) {
    let content = section.content_wrapper;
    let container = match tree.query_selector(content, ".suitability-container") {
        Some(node) => node,
        None => {
            let node = tree.create("div", None, &["suitability-container"]);
            let _ = tree.append_child(content, node);
            node
        }
    };
    if let Some(metrics) = section.moved_node(ContentRole::SuitabilityMetrics) {
        let _ = tree.prepend_child(container, metrics);
    }
    if let Some(map) = section.moved_node(ContentRole::SuitabilityMap) {
        let _ = tree.prepend_child(container, map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compare_page, find_page, section_for};

    #[test]
    fn compare_round_trip_restores_structure() {
        let (mut tree, page) = compare_page();
        let mut section = section_for(&mut tree, "compare", SectionKind::Compare, page.section);

        assert_eq!(move_to_breakout(&mut tree, &mut section), 5);
        assert!(section.is_relocated());
        let chart_top = tree.query_selector(section.layout, ".chart-top").unwrap();
        let chart_bottom = tree.query_selector(section.layout, ".chart-bottom").unwrap();
        assert_eq!(tree.parent(page.line_chart), Some(chart_top));
        assert_eq!(tree.parent(page.rank_chart), Some(chart_bottom));
        assert!(tree.contains(section.breakout, page.map_wrapper));

        assert_eq!(move_back(&mut tree, &mut section), 5);
        let content = section.content_wrapper;
        assert_eq!(
            tree.children(content),
            &[page.top_controls, page.visual_section, page.insight, page.tooltip]
        );
        assert_eq!(tree.children(page.visual_section), &[page.map_wrapper, page.charts_wrapper]);
        assert_eq!(tree.children(page.charts_wrapper), &[page.line_chart, page.rank_chart]);
        assert!(tree.children(chart_top).is_empty());
    }

    #[test]
    fn relocation_is_idempotent() {
        let (mut tree, page) = compare_page();
        let mut section = section_for(&mut tree, "compare", SectionKind::Compare, page.section);
        assert_eq!(move_back(&mut tree, &mut section), 0);
        assert_eq!(move_to_breakout(&mut tree, &mut section), 5);
        assert_eq!(move_to_breakout(&mut tree, &mut section), 0);
        assert_eq!(section.moved.len(), 5);
        assert_eq!(move_back(&mut tree, &mut section), 5);
        assert_eq!(move_back(&mut tree, &mut section), 0);
    }

    #[test]
    fn listeners_survive_relocation() {
        let (mut tree, page) = compare_page();
        tree.add_listener(page.map_wrapper, "mouseover");
        let mut section = section_for(&mut tree, "compare", SectionKind::Compare, page.section);
        move_to_breakout(&mut tree, &mut section);
        move_back(&mut tree, &mut section);
        let node = tree.node(page.map_wrapper).unwrap();
        assert_eq!(node.listeners, vec!["mouseover".to_string()]);
    }

    #[test]
    fn missing_targets_are_skipped() {
        let (mut tree, page) = compare_page();
        tree.detach(page.insight);
        let mut section = section_for(&mut tree, "compare", SectionKind::Compare, page.section);
        assert_eq!(move_to_breakout(&mut tree, &mut section), 4);
        assert!(section.is_relocated());
        assert_eq!(move_back(&mut tree, &mut section), 4);
        assert!(!tree.is_attached(page.insight));
    }

    #[test]
    fn rebuilds_discarded_wrappers() {
        let (mut tree, page) = compare_page();
        let mut section = section_for(&mut tree, "compare", SectionKind::Compare, page.section);
        move_to_breakout(&mut tree, &mut section);
        // Someone re-rendered the inline area while content was away.
        tree.detach(page.visual_section);
        move_back(&mut tree, &mut section);

        let content = section.content_wrapper;
        let visual = tree.query_selector(content, "#visualSection").unwrap();
        assert_ne!(visual, page.visual_section);
        let charts = tree.query_selector(visual, "#chartsWrapper").unwrap();
        assert_eq!(tree.children(visual), &[page.map_wrapper, charts]);
        assert_eq!(tree.children(charts), &[page.line_chart, page.rank_chart]);
        assert_eq!(tree.children(content).last(), Some(&page.tooltip));
    }

    #[test]
    fn find_round_trip() {
        let (mut tree, page) = find_page();
        let mut section = section_for(&mut tree, "find", SectionKind::Find, page.section);
        assert_eq!(move_to_breakout(&mut tree, &mut section), 2);
        let map_area = tree.query_selector(section.layout, ".map-area").unwrap();
        assert_eq!(tree.parent(page.map), Some(map_area));
        move_back(&mut tree, &mut section);
        assert_eq!(tree.children(page.container), &[page.map, page.metrics]);
    }
}
