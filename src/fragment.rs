//! 文本片段与缓存
//!
//! 片段记录每个文本单元在虚拟串中的绝对位置 [start, end)。包裹时用 splice
//! 把一个片段替换为前/中/后三段，位置不变，所以虚拟串在整个调用期间保持不变，
//! 缓存可以跨词复用。

use crate::dom::walk::TextUnit;
use crate::dom::{Document, MarkerTemplate, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Length of the boundary string inserted before this fragment.
    pub boundary_offset: usize,
    pub owner: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Fragments concatenated into one virtual string.
    Across,
    /// Each fragment searched on its own.
    PerFragment,
}

#[derive(Debug, Clone)]
pub struct FragmentCache {
    /// Concatenated text; empty in per-fragment mode.
    pub value: String,
    pub fragments: Vec<Fragment>,
    pub kind: FragmentKind,
    pub boundary: Option<char>,
    /// Projection hint: index of the fragment last wrapped into.
    pub last_fragment: usize,
    /// Projection hint: virtual offset where the last wrap ended.
    pub last_offset: usize,
}

impl FragmentCache {
    pub fn collect(
        doc: &Document,
        units: &[TextUnit],
        kind: FragmentKind,
        boundary: Option<char>,
    ) -> Self {
        let mut value = String::new();
        let mut fragments = Vec::with_capacity(units.len());
        let mut position = 0usize;
        let mut previous_ends_blank = true;

        for unit in units {
            let Some(text) = doc.text(unit.node) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let mut boundary_offset = 0;
            if let (Some(ch), true, FragmentKind::Across) = (boundary, unit.boundary_before, kind) {
                if position > 0 {
                    let next_blank = text.starts_with(char::is_whitespace);
                    let mut inserted = String::from(ch);
                    if !previous_ends_blank && !next_blank {
                        inserted.push(' ');
                    }
                    value.push_str(&inserted);
                    position += inserted.len();
                    boundary_offset = inserted.len();
                }
            }

            if kind == FragmentKind::Across {
                value.push_str(text);
            }
            fragments.push(Fragment {
                text: text.to_string(),
                start: position,
                end: position + text.len(),
                boundary_offset,
                owner: unit.node,
            });
            position += text.len();
            previous_ends_blank = text.ends_with(char::is_whitespace);
        }

        tracing::debug!(
            fragments = fragments.len(),
            len = position,
            kind = ?kind,
            "collected text fragments"
        );

        Self {
            value,
            fragments,
            kind,
            boundary,
            last_fragment: 0,
            last_offset: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total virtual length.
    pub fn len(&self) -> usize {
        self.fragments.last().map_or(0, |f| f.end)
    }

    pub fn reset_hints(&mut self) {
        self.last_fragment = 0;
        self.last_offset = 0;
    }

    /// Index of the first fragment ending after `offset`.
    fn seek(&self, offset: usize) -> usize {
        let hint = self.last_fragment;
        match self.fragments.get(hint) {
            Some(f) if f.start - f.boundary_offset <= offset => {
                let mut i = hint;
                while i < self.fragments.len() && self.fragments[i].end <= offset {
                    i += 1;
                }
                i
            }
            _ => self.fragments.partition_point(|f| f.end <= offset),
        }
    }

    /// Owner of the first fragment sharing text with `[start, end)`.
    pub fn owner_at(&self, start: usize, end: usize) -> Option<NodeId> {
        let i = self.seek(start);
        self.fragments[i..]
            .iter()
            .take_while(|f| f.start < end)
            .find(|f| start.max(f.start) < end.min(f.end))
            .map(|f| f.owner)
    }

    /// Wraps virtual range `[start, end)`, producing one marker per
    /// fragment it touches. Boundary characters are never wrapped.
    pub fn wrap_span(
        &mut self,
        doc: &mut Document,
        start: usize,
        end: usize,
        template: &MarkerTemplate,
    ) -> Vec<NodeId> {
        let mut markers = Vec::new();
        if start >= end {
            return markers;
        }

        let mut i = self.seek(start);
        while i < self.fragments.len() && self.fragments[i].start < end {
            let fragment = &self.fragments[i];
            let s = start.max(fragment.start);
            let e = end.min(fragment.end);
            if s >= e {
                i += 1;
                continue;
            }
            let (local_start, local_end) = (s - fragment.start, e - fragment.start);

            let split = match doc.wrap_text(fragment.owner, local_start, local_end, template) {
                Ok(split) => split,
                Err(err) => {
                    tracing::warn!(error = %err, start = s, end = e, "fragment out of sync with document");
                    i += 1;
                    continue;
                }
            };

            let fragment = self.fragments[i].clone();
            let mut pieces = Vec::with_capacity(3);
            if let Some(before) = split.before {
                pieces.push(Fragment {
                    text: fragment.text[..local_start].to_string(),
                    start: fragment.start,
                    end: s,
                    boundary_offset: fragment.boundary_offset,
                    owner: before,
                });
            }
            pieces.push(Fragment {
                text: fragment.text[local_start..local_end].to_string(),
                start: s,
                end: e,
                boundary_offset: if split.before.is_some() {
                    0
                } else {
                    fragment.boundary_offset
                },
                owner: split.marked,
            });
            if let Some(after) = split.after {
                pieces.push(Fragment {
                    text: fragment.text[local_end..].to_string(),
                    start: e,
                    end: fragment.end,
                    boundary_offset: 0,
                    owner: after,
                });
            }

            let marked_index = i + usize::from(split.before.is_some());
            self.fragments.splice(i..=i, pieces);
            markers.push(split.marker);
            self.last_fragment = marked_index;
            self.last_offset = e;
            i = marked_index + 1;
        }

        markers
    }
}

#[cfg(test)]
#[path = "../tests/unit/fragment.rs"]
mod tests;
