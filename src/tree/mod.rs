//! Arena-backed visual tree. The tree is the only client-side record of
//! entity state, so every mutation here mirrors a confirmed server change
//! or an in-progress edit.

pub mod style;

use std::collections::BTreeMap;

use slab::Slab;
use thiserror::Error;

use crate::geometry::Rect;
use crate::icon::IconFile;

pub use style::{Length, Style, TextStyle, WhiteSpace};

pub type NodeId = usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node {0} has no parent")]
    Detached(NodeId),
    #[error("cannot move node {node} into its own subtree at {destination}")]
    Cycle { node: NodeId, destination: NodeId },
}

pub type TreeResult<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    files: Vec<IconFile>,
    pub style: Style,
    rect: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: None,
            files: Vec::new(),
            style: Style::default(),
            rect: Rect::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }

    pub fn set_class_name(&mut self, class_name: &str) {
        self.classes = class_name.split_whitespace().map(str::to_string).collect();
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|existing| existing != class);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.remove(name);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn files(&self) -> &[IconFile] {
        &self.files
    }

    pub fn set_files(&mut self, files: Vec<IconFile>) {
        self.files = files;
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Slab<Node>,
    root: NodeId,
    focused: Option<NodeId>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = nodes.insert(Node::new("body"));
        Self {
            nodes,
            root,
            focused: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&Node> {
        self.nodes.get(id).ok_or(TreeError::MissingNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.nodes.get_mut(id).ok_or(TreeError::MissingNode(id))
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(Node::new(tag))
    }

    /// Creates a detached element with the given class list and own text.
    pub fn create_text_element(&mut self, tag: &str, class_name: &str, text: &str) -> NodeId {
        let mut node = Node::new(tag);
        node.set_class_name(class_name);
        node.text = text.to_string();
        self.nodes.insert(node)
    }

    /// Copies a subtree. The copy is detached and keeps every attribute,
    /// including `id`, which callers usually strip.
    pub fn deep_clone(&mut self, id: NodeId) -> TreeResult<NodeId> {
        let source = self.node(id)?;
        let mut copy = source.clone();
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        let copy_id = self.nodes.insert(copy);

        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.nodes[child_copy].parent = Some(copy_id);
            self.nodes[copy_id].children.push(child_copy);
        }
        Ok(copy_id)
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return true;
            }
            current = self.nodes.get(node_id).and_then(|node| node.parent);
        }
        false
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(node_id).and_then(|node| node.parent);
        }
        false
    }

    fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.nodes[parent].children.retain(|child| *child != id);
            self.nodes[id].parent = None;
        }
        Ok(())
    }

    /// Moves `child` to the end of `parent`. The same node is re-parented,
    /// so anything keyed by its handle stays valid.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.insert_before(parent, child, None)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> TreeResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle {
                node: child,
                destination: parent,
            });
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(TreeError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(child)?;
        let siblings = &mut self.nodes[parent].children;
        let index = reference
            .and_then(|reference| siblings.iter().position(|id| *id == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Puts `replacement` in the slot of `target` and drops `target`'s subtree.
    pub fn replace_node(&mut self, target: NodeId, replacement: NodeId) -> TreeResult<()> {
        let parent = self.node(target)?.parent.ok_or(TreeError::Detached(target))?;
        self.insert_before(parent, replacement, Some(target))?;
        self.remove(target)
    }

    /// Removes a node and all of its descendants from the arena.
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(node_id) = pending.pop() {
            if let Some(node) = self.nodes.try_remove(node_id) {
                pending.extend(node.children);
            }
            if self.focused == Some(node_id) {
                self.focused = None;
            }
        }
        Ok(())
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.nodes[*id].attr("id") == Some(element_id))
    }

    /// Pre-order list of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            order.push(node_id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// First strict descendant, in document order, matching `predicate`.
    pub fn find_descendant(&self, id: NodeId, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .find(|node_id| predicate(&self.nodes[*node_id]))
    }

    pub fn find_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.find_descendant(id, |node| node.tag.eq_ignore_ascii_case(tag))
    }

    pub fn find_by_attr(&self, id: NodeId, attr: &str) -> Option<NodeId> {
        self.find_descendant(id, |node| node.attrs.contains_key(attr))
    }

    pub fn find_by_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.find_descendant(id, |node| node.has_class(class))
    }

    /// Nearest ancestor-or-self carrying `class`.
    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.nodes.get(node_id)?;
            if node.has_class(class) {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    fn sibling_at(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.nodes.get(id)?.parent?;
        let siblings = &self.nodes[parent].children;
        let index = siblings.iter().position(|child| *child == id)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling_at(id, -1)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling_at(id, 1)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.children.last().copied()
    }

    pub fn text_content(&self, id: NodeId) -> TreeResult<String> {
        self.node(id)?;
        Ok(self
            .descendants(id)
            .into_iter()
            .map(|node_id| self.nodes[node_id].text.as_str())
            .collect())
    }

    /// Replaces every child with plain text.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> TreeResult<()> {
        let children = self.node(id)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        self.nodes[id].text = text.to_string();
        Ok(())
    }

    pub fn rect(&self, id: NodeId) -> TreeResult<Rect> {
        Ok(self.node(id)?.rect)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, id: NodeId) -> TreeResult<()> {
        self.node(id)?;
        self.focused = Some(id);
        Ok(())
    }
}
