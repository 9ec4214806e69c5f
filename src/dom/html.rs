//! HTML 解析与序列化
//!
//! 解析基于 tree-sitter-html：子节点之间的源码空隙按文本保留，保证
//! parse -> serialize 不改变空白。script/style 内容保持原样，不做实体解码。

use std::borrow::Cow;

use tree_sitter::{Node as TsNode, Parser};

use super::{Document, Element, NodeId, NodeKind};
use crate::error::MarkError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| tag.eq_ignore_ascii_case(v))
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| tag.eq_ignore_ascii_case(v))
}

pub fn parse(source: &str) -> Result<Document, MarkError> {
    let mut parser = Parser::new();
    parser
        .set_language(tree_sitter_html::language())
        .map_err(|e| MarkError::Parse(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| MarkError::Parse("parser produced no tree".to_string()))?;

    let mut builder = Builder {
        source,
        doc: Document::new(),
    };
    let root = builder.doc.root();
    builder.content(tree.root_node(), root, 0, source.len());
    Ok(builder.doc)
}

struct Builder<'s> {
    source: &'s str,
    doc: Document,
}

impl Builder<'_> {
    /// Builds children of `parent` from the child nodes of `ts` lying in
    /// `[from, to)`. Source between structural nodes becomes text.
    fn content(&mut self, ts: TsNode<'_>, parent: NodeId, from: usize, to: usize) {
        let mut text_from = from;
        let mut cursor = ts.walk();
        for child in ts.children(&mut cursor) {
            if child.start_byte() < from || child.end_byte() > to {
                continue;
            }
            match child.kind() {
                "element" | "script_element" | "style_element" => {
                    self.text(parent, text_from, child.start_byte());
                    self.element(child, parent);
                    text_from = child.end_byte();
                }
                "comment" => {
                    self.text(parent, text_from, child.start_byte());
                    let raw = self.slice(child).to_string();
                    self.raw(parent, NodeKind::Comment(raw));
                    text_from = child.end_byte();
                }
                "doctype" => {
                    self.text(parent, text_from, child.start_byte());
                    let raw = self.slice(child).to_string();
                    self.raw(parent, NodeKind::Doctype(raw));
                    text_from = child.end_byte();
                }
                "erroneous_end_tag" => {
                    self.text(parent, text_from, child.start_byte());
                    text_from = child.end_byte();
                }
                _ => {}
            }
        }
        self.text(parent, text_from, to);
    }

    fn element(&mut self, ts: TsNode<'_>, parent: NodeId) {
        let mut cursor = ts.walk();
        let children: Vec<TsNode<'_>> = ts.children(&mut cursor).collect();

        let Some(start) = children
            .iter()
            .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))
            .copied()
        else {
            // No usable start tag: keep the source as text.
            self.text(parent, ts.start_byte(), ts.end_byte());
            return;
        };

        let element = self.start_tag(start);
        let tag = element.tag.clone();
        let id = self.doc.create_element(element);
        self.attach(parent, id);

        let end = children
            .iter()
            .rev()
            .find(|c| c.kind() == "end_tag")
            .map_or(ts.end_byte(), |c| c.start_byte())
            .max(start.end_byte());

        // A void element's node may span the siblings that follow it; they
        // belong to the parent.
        let owner = if start.kind() == "self_closing_tag" || is_void(&tag) {
            parent
        } else {
            id
        };
        self.content(ts, owner, start.end_byte(), end);
    }

    fn start_tag(&self, ts: TsNode<'_>) -> Element {
        let mut cursor = ts.walk();
        let mut element = Element::new("");
        for child in ts.children(&mut cursor) {
            match child.kind() {
                "tag_name" => element = Element::new(self.slice(child)),
                "attribute" => {
                    if let Some((name, value)) = self.attribute(child) {
                        element.attrs.push((name.to_ascii_lowercase().into(), value));
                    }
                }
                _ => {}
            }
        }
        element
    }

    fn attribute(&self, ts: TsNode<'_>) -> Option<(String, String)> {
        let mut cursor = ts.walk();
        let mut name = None;
        let mut value = String::new();
        for child in ts.children(&mut cursor) {
            match child.kind() {
                "attribute_name" => name = Some(self.slice(child).to_string()),
                "attribute_value" => value = decode_entities(self.slice(child)).into_owned(),
                "quoted_attribute_value" => {
                    let raw = self.slice(child);
                    let inner = raw
                        .get(1..raw.len().saturating_sub(1))
                        .unwrap_or_default();
                    value = decode_entities(inner).into_owned();
                }
                _ => {}
            }
        }
        name.map(|n| (n, value))
    }

    fn text(&mut self, parent: NodeId, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let Some(raw) = self.source.get(from..to) else {
            return;
        };
        let text = if self.doc.tag(parent).is_some_and(is_raw_text) {
            Cow::Borrowed(raw)
        } else {
            decode_entities(raw)
        };

        // Adjacent text pieces merge into one node.
        if let Some(&last) = self.doc.children(parent).last() {
            if let Some(NodeKind::Text(existing)) = self.doc.arena.get_mut(last).map(|n| &mut n.kind) {
                existing.push_str(&text);
                return;
            }
        }
        let id = self.doc.create_text(text.into_owned());
        self.attach(parent, id);
    }

    fn raw(&mut self, parent: NodeId, kind: NodeKind) {
        let id = self.doc.create_node(kind);
        self.attach(parent, id);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Err(e) = self.doc.append_child(parent, child) {
            tracing::warn!(error = %e, "dropping node while building document");
        }
    }

    fn slice(&self, ts: TsNode<'_>) -> &str {
        self.source.get(ts.byte_range()).unwrap_or_default()
    }
}

/// Decodes the character references that commonly appear in text.
/// Unknown references are kept literally.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "shy" => '\u{ad}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        _ => return None,
    })
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

pub fn serialize(doc: &Document) -> String {
    serialize_node(doc, doc.root())
}

enum Emit {
    Open(NodeId),
    Close(NodeId),
}

/// Serializes `id` and its subtree. The document root serializes to its
/// children only.
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![Emit::Open(id)];

    while let Some(step) = stack.pop() {
        match step {
            Emit::Open(node) => match doc.kind(node) {
                Some(NodeKind::Document) => {
                    stack.extend(doc.children(node).iter().rev().map(|&c| Emit::Open(c)));
                }
                Some(NodeKind::Element(element)) => {
                    out.push('<');
                    out.push_str(&element.tag);
                    for (name, value) in &element.attrs {
                        out.push(' ');
                        out.push_str(name);
                        if !value.is_empty() {
                            out.push_str("=\"");
                            escape_attr(value, &mut out);
                            out.push('"');
                        }
                    }
                    out.push('>');
                    if is_void(&element.tag) {
                        continue;
                    }
                    stack.push(Emit::Close(node));
                    stack.extend(doc.children(node).iter().rev().map(|&c| Emit::Open(c)));
                }
                Some(NodeKind::Text(text)) => {
                    let raw = doc
                        .parent(node)
                        .and_then(|p| doc.tag(p))
                        .is_some_and(is_raw_text);
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text(text, &mut out);
                    }
                }
                Some(NodeKind::Comment(raw)) | Some(NodeKind::Doctype(raw)) => out.push_str(raw),
                None => {}
            },
            Emit::Close(node) => {
                if let Some(tag) = doc.tag(node) {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
    }

    out
}

#[cfg(test)]
#[path = "../../tests/unit/dom/html.rs"]
mod tests;
