use super::{Document, Element, NodeId, NodeKind, Selector};
use crate::config::BlockBoundary;

/// Sub-trees that never contribute text.
const ALWAYS_EXCLUDED: &[&str] = &["script", "style", "title", "head"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextUnit {
    pub node: NodeId,
    /// A block-level element was entered, left or passed since the
    /// previous unit.
    pub boundary_before: bool,
}

pub struct WalkFilter<'a> {
    pub exclude: &'a [Selector],
    pub block: Option<&'a BlockBoundary>,
    pub skip: Option<&'a dyn Fn(&Document, NodeId) -> bool>,
}

impl<'a> WalkFilter<'a> {
    pub fn new(exclude: &'a [Selector]) -> Self {
        Self {
            exclude,
            block: None,
            skip: None,
        }
    }

    pub fn excludes(&self, doc: &Document, id: NodeId, element: &Element) -> bool {
        ALWAYS_EXCLUDED
            .iter()
            .any(|tag| element.tag.eq_ignore_ascii_case(tag))
            || self.exclude.iter().any(|s| s.matches(element))
            || self.skip.is_some_and(|skip| skip(doc, id))
    }

    fn is_block(&self, element: &Element) -> bool {
        self.block.is_some_and(|b| b.is_block(&element.tag))
    }
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Non-empty text nodes under `root` in document order.
pub fn text_units(doc: &Document, root: NodeId, filter: &WalkFilter<'_>) -> Vec<TextUnit> {
    let mut units = Vec::new();
    let mut stack = vec![Step::Enter(root)];
    let mut pending_boundary = false;

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => match doc.kind(id) {
                Some(NodeKind::Text(text)) => {
                    if text.is_empty() || parent_is_html(doc, id) {
                        continue;
                    }
                    units.push(TextUnit {
                        node: id,
                        boundary_before: pending_boundary,
                    });
                    pending_boundary = false;
                }
                Some(NodeKind::Element(element)) => {
                    pending_boundary |= filter.is_block(element);
                    if id != root && filter.excludes(doc, id, element) {
                        continue;
                    }
                    stack.push(Step::Leave(id));
                    stack.extend(doc.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
                Some(NodeKind::Document) => {
                    stack.extend(doc.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
                _ => {}
            },
            Step::Leave(id) => {
                if doc.element(id).is_some_and(|el| filter.is_block(el)) {
                    pending_boundary = true;
                }
            }
        }
    }

    units
}

/// Whether `id` or one of its ancestors matches an exclusion.
pub fn is_excluded(doc: &Document, id: NodeId, filter: &WalkFilter<'_>) -> bool {
    let mut current = Some(id);
    while let Some(node) = current {
        if let Some(element) = doc.element(node) {
            if filter.excludes(doc, node, element) {
                return true;
            }
        }
        current = doc.parent(node);
    }
    false
}

fn parent_is_html(doc: &Document, id: NodeId) -> bool {
    doc.parent(id)
        .and_then(|p| doc.tag(p))
        .is_some_and(|tag| tag == "html")
}

#[cfg(test)]
#[path = "../../tests/unit/dom/walk.rs"]
mod tests;
