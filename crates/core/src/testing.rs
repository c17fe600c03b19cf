//! Scene fixtures shared by unit tests.

use crate::model::{NodeId, SceneTree, Section, SectionKind};
use crate::scroll::breakout::prepare_section;

pub struct ComparePage {
    pub section: NodeId,
    pub top_controls: NodeId,
    pub visual_section: NodeId,
    pub map_wrapper: NodeId,
    pub charts_wrapper: NodeId,
    pub line_chart: NodeId,
    pub rank_chart: NodeId,
    pub insight: NodeId,
    pub tooltip: NodeId,
}

pub struct FindPage {
    pub section: NodeId,
    pub container: NodeId,
    pub map: NodeId,
    pub metrics: NodeId,
}

fn child(tree: &mut SceneTree, parent: NodeId, id: Option<&str>, classes: &[&str]) -> NodeId {
    let node = tree.create("div", id, classes);
    tree.append_child(parent, node).unwrap();
    node
}

/// `section#compare` with controls, visual section (map + two charts),
/// insight panel and the tooltip anchor.
pub fn compare_page() -> (SceneTree, ComparePage) {
    let mut tree = SceneTree::new();
    let body = tree.body();
    let section = tree.create("section", Some("compare"), &[]);
    tree.append_child(body, section).unwrap();

    let top_controls = child(&mut tree, section, Some("topControls"), &["top-controls"]);
    let visual_section = child(&mut tree, section, Some("visualSection"), &["visual-section"]);
    let map_wrapper = child(&mut tree, visual_section, Some("mapWrapper"), &["map-wrapper"]);
    let charts_wrapper = child(&mut tree, visual_section, Some("chartsWrapper"), &["charts-wrapper"]);
    let line_chart = child(&mut tree, charts_wrapper, None, &["chart-container"]);
    let rank_chart = child(&mut tree, charts_wrapper, None, &["chart-container"]);
    let insight = child(&mut tree, section, Some("insightContainer"), &[]);
    let tooltip = child(&mut tree, section, None, &["tooltip"]);

    let page = ComparePage {
        section,
        top_controls,
        visual_section,
        map_wrapper,
        charts_wrapper,
        line_chart,
        rank_chart,
        insight,
        tooltip,
    };
    (tree, page)
}

pub fn find_page() -> (SceneTree, FindPage) {
    let mut tree = SceneTree::new();
    let body = tree.body();
    let section = tree.create("section", Some("find"), &[]);
    tree.append_child(body, section).unwrap();
    let container = child(&mut tree, section, None, &["suitability-container"]);
    let map = child(&mut tree, container, None, &["suitability-left"]);
    let metrics = child(&mut tree, container, None, &["suitability-metrics-right"]);
    (
        tree,
        FindPage {
            section,
            container,
            map,
            metrics,
        },
    )
}

pub fn section_for(tree: &mut SceneTree, id: &str, kind: SectionKind, anchor: NodeId) -> Section {
    prepare_section(tree, anchor, id, kind, 2.5)
}
