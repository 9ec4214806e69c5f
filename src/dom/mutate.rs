use compact_str::CompactString;

use super::{Document, DomError, Element, NodeId, NodeKind};

/// Attribute carried by every marker element.
pub const MARKER_ATTR: &str = "data-markjs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTemplate {
    pub tag: CompactString,
    pub class_name: Option<String>,
}

impl MarkerTemplate {
    pub fn new(tag: &str, class_name: Option<&str>) -> Self {
        Self {
            tag: CompactString::new(tag.to_ascii_lowercase()),
            class_name: class_name.map(str::to_string),
        }
    }

    fn build(&self) -> Element {
        let mut element = Element::new(&self.tag);
        if let Some(class) = &self.class_name {
            element.set_attr("class", class);
        }
        element.set_attr(MARKER_ATTR, "true");
        element
    }

    /// Whether `element` is a marker produced from this template.
    pub fn matches(&self, element: &Element) -> bool {
        element.tag.eq_ignore_ascii_case(&self.tag)
            && element.attr(MARKER_ATTR) == Some("true")
            && self
                .class_name
                .as_deref()
                .map_or(true, |class| element.has_class(class))
    }
}

/// Units produced by wrapping part of a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapSplit {
    /// The original node, now holding the text before the match.
    pub before: Option<NodeId>,
    /// Text node inside the marker.
    pub marked: NodeId,
    pub marker: NodeId,
    pub after: Option<NodeId>,
}

impl Document {
    /// Splits text node `id` at byte offset `at`; `id` keeps `[..at]` and the
    /// returned sibling takes `[at..]`.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached)?;
        let node = self.arena.get_mut(id).ok_or(DomError::InvalidNodeId)?;
        let NodeKind::Text(text) = &mut node.kind else {
            return Err(DomError::NotText);
        };
        if at > text.len() || !text.is_char_boundary(at) {
            return Err(DomError::OutOfBounds);
        }
        let tail = text.split_off(at);
        let index = self.index_in_parent(id).ok_or(DomError::Detached)?;
        let sibling = self.create_text(tail);
        self.insert_at(parent, index + 1, sibling)?;
        Ok(sibling)
    }

    /// Moves `[start, end)` of text node `id` into a new marker element.
    pub fn wrap_text(
        &mut self,
        id: NodeId,
        start: usize,
        end: usize,
        template: &MarkerTemplate,
    ) -> Result<WrapSplit, DomError> {
        let len = self.text(id).ok_or(DomError::NotText)?.len();
        if start >= end || end > len {
            return Err(DomError::OutOfBounds);
        }

        let mut marked = id;
        let mut before = None;
        if start > 0 {
            marked = self.split_text(id, start)?;
            before = Some(id);
        }
        let after = if end < len {
            Some(self.split_text(marked, end - start)?)
        } else {
            None
        };

        let parent = self.parent(marked).ok_or(DomError::Detached)?;
        let index = self.index_in_parent(marked).ok_or(DomError::Detached)?;
        let marker = self.create_element(template.build());
        self.insert_at(parent, index, marker)?;
        self.append_child(marker, marked)?;

        Ok(WrapSplit {
            before,
            marked,
            marker,
            after,
        })
    }

    /// Replaces element `id` with its children and merges the text runs
    /// that become adjacent.
    pub fn unwrap_element(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.element(id).is_none() {
            return Err(DomError::NotElement);
        }
        let parent = self.parent(id).ok_or(DomError::Detached)?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached)?;
        let children = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_at(parent, index + offset, child)?;
        }
        self.remove(id);
        self.normalize(parent);
        Ok(())
    }

    /// Merges adjacent text nodes and drops empty ones among the children
    /// of `id` (not recursive).
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            let Some(text) = self.text(child).map(str::to_string) else {
                previous_text = None;
                continue;
            };
            if text.is_empty() {
                self.remove(child);
                continue;
            }
            match previous_text {
                Some(prev) => {
                    if let Some(NodeKind::Text(prev_text)) =
                        self.arena.get_mut(prev).map(|n| &mut n.kind)
                    {
                        prev_text.push_str(&text);
                    }
                    self.remove(child);
                }
                None => previous_text = Some(child),
            }
        }
    }

    /// Copies the children of `other`'s root under `host`.
    pub fn graft(&mut self, host: NodeId, other: &Document) -> Result<(), DomError> {
        if !self.contains(host) {
            return Err(DomError::InvalidNodeId);
        }
        let mut stack: Vec<(NodeId, NodeId)> = other
            .children(other.root())
            .iter()
            .rev()
            .map(|&child| (child, host))
            .collect();
        while let Some((source, target_parent)) = stack.pop() {
            let Some(kind) = other.kind(source) else {
                continue;
            };
            let copy = self.create_node(kind.clone());
            self.append_child(target_parent, copy)?;
            for &child in other.children(source).iter().rev() {
                stack.push((child, copy));
            }
        }
        Ok(())
    }
}
