//! A small in-memory page: elements, shadow roots, classes, text and the
//! playback properties of media elements.

use std::collections::HashMap;

use anyhow::{anyhow, Context};

use crate::{
    id_type,
    media::MediaProps,
    traversal::{self, TreeWalk},
};

id_type!(NodeId);

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub text: String,
    pub content_editable: bool,
    pub shadow_root: Option<NodeId>,
    pub media: Option<MediaProps>,
}

impl Element {
    fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let media = matches!(tag.as_str(), "video" | "audio").then(MediaProps::default);
        Self {
            tag,
            media,
            ..Self::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    ShadowRoot { host: NodeId },
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    root: NodeId,
    body: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = NodeId::new();
        let body = NodeId::new();
        let mut root_node = Node::new(NodeKind::Document);
        root_node.children.push(body);
        let mut body_node = Node::new(NodeKind::Element(Element::new("body")));
        body_node.parent = Some(root);
        Self {
            root,
            body,
            nodes: HashMap::from([(root, root_node), (body, body_node)]),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new();
        self.nodes
            .insert(id, Node::new(NodeKind::Element(Element::new(tag))));
        id
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|n| &n.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(&node)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn media(&self, node: NodeId) -> Option<&MediaProps> {
        self.element(node)?.media.as_ref()
    }

    pub fn media_mut(&mut self, node: NodeId) -> Option<&mut MediaProps> {
        self.element_mut(node)?.media.as_mut()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> anyhow::Result<()> {
        let index = self.children(parent).len();
        self.insert_at(parent, child, index)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> anyhow::Result<()> {
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .ok_or_else(|| anyhow!("Node {reference} is not a child of {parent}"))?;
        self.insert_at(parent, child, index)
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> anyhow::Result<()> {
        if !self.nodes.contains_key(&parent) {
            return Err(anyhow!("Unknown parent node {parent}"));
        }
        match self.kind(child) {
            None => return Err(anyhow!("Unknown node {child}")),
            Some(NodeKind::Element(_)) => (),
            Some(_) => return Err(anyhow!("Only elements can be inserted into the tree")),
        }
        if traversal::is_composed_inclusive_ancestor(self, child, parent) {
            return Err(anyhow!("Inserting {child} into {parent} would create a cycle"));
        }

        self.remove(child);
        let index = index.min(self.children(parent).len());
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.insert(index, child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detaches `node` from its parent. The node and its subtree stay usable and may be
    /// inserted again.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|&c| c != node);
        }
    }

    pub fn attach_shadow(&mut self, host: NodeId) -> anyhow::Result<NodeId> {
        let element = self
            .element(host)
            .with_context(|| format!("Cannot attach a shadow root to {host}"))?;
        if element.shadow_root.is_some() {
            return Err(anyhow!("Element {host} already has a shadow root"));
        }

        let root = NodeId::new();
        self.nodes
            .insert(root, Node::new(NodeKind::ShadowRoot { host }));
        if let Some(element) = self.element_mut(host) {
            element.shadow_root = Some(root);
        }
        Ok(root)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node) && traversal::composed_root(self, node) == self.root
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|e| e.has_class(class))
    }

    pub fn set_class(&mut self, node: NodeId, class: &str, enabled: bool) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        match (enabled, element.has_class(class)) {
            (true, false) => element.classes.push(class.to_string()),
            (false, true) => element.classes.retain(|c| c != class),
            _ => (),
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(element) = self.element_mut(node) {
            element.text = text.into();
        }
    }

    /// Text fields and anything inside a `contenteditable` subtree. Editing hosts do not
    /// reach across shadow boundaries.
    pub fn is_editable(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(element) = self.element(id) else {
                return false;
            };
            if id == node && matches!(element.tag.as_str(), "input" | "textarea") {
                return true;
            }
            if element.content_editable {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

impl TreeWalk for Document {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(node)? {
            NodeKind::ShadowRoot { host } => Some(*host),
            _ => None,
        }
    }
}
