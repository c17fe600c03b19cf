use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable handle to a node in a [`SceneTree`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("moving {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("{anchor:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, anchor: NodeId },
    #[error("unsupported selector: {0}")]
    Selector(String),
}

/// One element of the retained tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Inline style properties, including CSS custom properties.
    pub style: BTreeMap<String, String>,
    /// Names of attached event listeners. They travel with the node.
    pub listeners: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The subset of CSS selectors the relocator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `.class:nth-child(n)`, 1-based position among all siblings.
    NthChild { class: String, n: usize },
}

impl Selector {
    pub fn parse(s: &str) -> Result<Self, SceneError> {
        let unsupported = || SceneError::Selector(s.to_string());
        if let Some(id) = s.strip_prefix('#') {
            if id.is_empty() {
                return Err(unsupported());
            }
            return Ok(Selector::Id(id.to_string()));
        }
        let Some(rest) = s.strip_prefix('.') else {
            return Err(unsupported());
        };
        match rest.split_once(":nth-child(") {
            Some((class, tail)) => {
                let n = tail
                    .strip_suffix(')')
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(unsupported)?;
                Ok(Selector::NthChild {
                    class: class.to_string(),
                    n,
                })
            }
            None if !rest.is_empty() => Ok(Selector::Class(rest.to_string())),
            None => Err(unsupported()),
        }
    }
}

/// Declarative element description a host sends to mirror its page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub listeners: Vec<String>,
    pub children: Vec<ElementSpec>,
}

/// Arena-backed element tree with stable node ids.
///
/// Moving a node (append, insert-before) reparents the same `NodeId`; its
/// subtree, styles and listeners are untouched. Nodes are never cloned and
/// never freed, so a detached node can always be re-attached later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneTree {
    nodes: Vec<Node>,
    body: NodeId,
}

impl SceneTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("body")],
            body: NodeId(0),
        }
    }

    /// A tree whose body holds `children`.
    pub fn from_elements(children: &[ElementSpec]) -> Self {
        let mut tree = Self::new();
        let body = tree.body;
        for spec in children {
            tree.build(body, spec);
        }
        tree
    }

    /// Create `spec` and its subtree as the last child of `parent`.
    pub fn build(&mut self, parent: NodeId, spec: &ElementSpec) -> NodeId {
        let tag = if spec.tag.is_empty() { "div" } else { spec.tag.as_str() };
        let classes: Vec<&str> = spec.classes.iter().map(String::as_str).collect();
        let id = self.create(tag, spec.id.as_deref(), &classes);
        for event in &spec.listeners {
            self.add_listener(id, event);
        }
        if let Err(e) = self.append_child(parent, id) {
            debug!("cannot attach {tag}: {e}");
        }
        for child in &spec.children {
            self.build(id, child);
        }
        id
    }

    /// The document body. Every attached node descends from it.
    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached element.
    pub fn create(&mut self, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeId {
        let mut node = Node::new(tag);
        node.id = id.map(str::to_string);
        node.classes = classes.iter().map(|c| (*c).to_string()).collect();
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// 0-based position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Whether `node` is `ancestor` or lies in its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether the node is reachable from the body.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    /// Remove a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_before(parent, child, None)
    }

    /// Move `child` into `parent` right before `anchor` (or at the end when
    /// `anchor` is `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if self.contains(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if let Some(anchor) = anchor {
            self.check(anchor)?;
            if self.parent(anchor) != Some(parent) {
                return Err(SceneError::NotAChild { parent, anchor });
            }
            if anchor == child {
                return Ok(());
            }
        }

        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let at = anchor
            .and_then(|a| siblings.iter().position(|c| *c == a))
            .unwrap_or(siblings.len());
        siblings.insert(at, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Move `child` to the front of `parent`'s children.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let first = self.children(parent).first().copied();
        self.insert_before(parent, child, first)
    }

    /// Detach every child of `parent`. The detached nodes stay valid.
    pub fn clear_children(&mut self, parent: NodeId) {
        let children = match self.node_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        match selector {
            Selector::Id(want) => node.id.as_deref() == Some(want.as_str()),
            Selector::Class(class) => node.has_class(class),
            Selector::NthChild { class, n } => {
                node.has_class(class) && self.index_in_parent(id) == Some(n - 1)
            }
        }
    }

    /// First descendant of `root` (excluding `root`) matching `selector`,
    /// in document order.
    pub fn query(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.matches(id, selector) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    /// Parse `selector` and run [`SceneTree::query`]. Unsupported selectors
    /// match nothing.
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector).ok()?;
        self.query(root, &selector)
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.style.insert(property.to_string(), value.into());
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.node(id)?.style.get(property).map(String::as_str)
    }

    /// Add or remove a class.
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let present = node.has_class(class);
        if on && !present {
            node.classes.push(class.to_string());
        } else if !on && present {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn add_listener(&mut self, id: NodeId, event: &str) {
        if let Some(node) = self.node_mut(id) {
            node.listeners.push(event.to_string());
        }
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}
