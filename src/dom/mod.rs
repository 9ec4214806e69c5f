//! 文档树
//!
//! - Document: slotmap arena，NodeId 在拆分/包裹过程中保持稳定
//! - mutate: 拆分文本、包裹标记、拆除标记、合并相邻文本
//! - walk: 按文档顺序枚举文本单元（排除子树、块级边界）
//! - html: tree-sitter-html 解析与序列化
//! - subtree: 外部子树的异步加载

pub mod html;
mod mutate;
mod selector;
pub mod subtree;
pub mod walk;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::fmt;

pub use mutate::{MarkerTemplate, WrapSplit, MARKER_ATTR};
pub use selector::Selector;

new_key_type! { pub struct NodeId; }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomError {
    InvalidNodeId,
    NotText,
    NotElement,
    Detached,
    OutOfBounds,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::InvalidNodeId => write!(f, "invalid node id"),
            DomError::NotText => write!(f, "node is not a text node"),
            DomError::NotElement => write!(f, "node is not an element"),
            DomError::Detached => write!(f, "node has no parent"),
            DomError::OutOfBounds => write!(f, "offset outside of node text"),
        }
    }
}

impl std::error::Error for DomError {}

/// Load state of a host element whose content comes from outside.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: CompactString,
    pub attrs: Vec<(CompactString, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: CompactString::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((CompactString::new(name), value.to_string())),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
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
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    load_states: FxHashMap<NodeId, LoadState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(NodeKind::Document));
        Self {
            arena,
            root,
            load_states: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.arena.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.arena.get_mut(id)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn load_state(&self, id: NodeId) -> Option<LoadState> {
        self.load_states.get(&id).copied()
    }

    pub fn set_load_state(&mut self, id: NodeId, state: LoadState) {
        self.load_states.insert(id, state);
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.arena.insert(Node::new(NodeKind::Element(element)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.insert(Node::new(NodeKind::Text(text.into())))
    }

    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.arena.insert(Node::new(kind))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_at(parent, usize::MAX, child)
    }

    /// Inserts `child` at `index` (clamped) among `parent`'s children,
    /// detaching it from its current parent first.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), DomError> {
        if !self.arena.contains_key(parent) || !self.arena.contains_key(child) {
            return Err(DomError::InvalidNodeId);
        }
        self.detach(child);
        let node = self.arena.get_mut(parent).ok_or(DomError::InvalidNodeId)?;
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(child_node) = self.arena.get_mut(child) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached)?;
        self.detach(child);
        let index = self.index_in_parent(reference).ok_or(DomError::Detached)?;
        self.insert_at(parent, index + 1, child)
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Removes `id` from its parent's child list; the node stays alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
    }

    /// Removes `id` and its whole subtree from the arena.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if let Some(node) = self.arena.remove(node_id) {
                stack.extend(node.children);
            }
            self.load_states.remove(&node_id);
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Pre-order traversal of `id` and its descendants.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            if !self.arena.contains_key(node_id) {
                continue;
            }
            out.push(node_id);
            stack.extend(self.children(node_id).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node_id in self.descendants(id) {
            if let Some(text) = self.text(node_id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Elements under `id` (inclusive) matching `selector`, in document order.
    pub fn select(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|el| selector.matches(el)))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dom/document.rs"]
mod tests;
