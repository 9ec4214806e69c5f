use super::*;

fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
    let p = doc.create_element(Element::new("p"));
    let root = doc.root();
    doc.append_child(root, p).unwrap();
    let t = doc.create_text(text);
    doc.append_child(p, t).unwrap();
    (p, t)
}

#[test]
fn test_new_document() {
    let doc = Document::new();
    assert_eq!(doc.kind(doc.root()), Some(&NodeKind::Document));
    assert!(doc.children(doc.root()).is_empty());
    assert_eq!(doc.node_count(), 1);
}

#[test]
fn test_insert_and_siblings() {
    let mut doc = Document::new();
    let root = doc.root();
    let a = doc.create_text("a");
    let b = doc.create_text("b");
    let c = doc.create_text("c");
    doc.append_child(root, a).unwrap();
    doc.append_child(root, c).unwrap();
    doc.insert_after(a, b).unwrap();

    assert_eq!(doc.children(root), &[a, b, c]);
    assert_eq!(doc.next_sibling(a), Some(b));
    assert_eq!(doc.previous_sibling(c), Some(b));
    assert_eq!(doc.previous_sibling(a), None);
    assert_eq!(doc.text_content(root), "abc");
}

#[test]
fn test_reparent_detaches() {
    let mut doc = Document::new();
    let (p, t) = paragraph(&mut doc, "x");
    let root = doc.root();
    doc.append_child(root, t).unwrap();

    assert!(doc.children(p).is_empty());
    assert_eq!(doc.parent(t), Some(root));
}

#[test]
fn test_remove_drops_subtree() {
    let mut doc = Document::new();
    let (p, t) = paragraph(&mut doc, "gone");
    doc.remove(p);

    assert!(!doc.contains(p));
    assert!(!doc.contains(t));
    assert_eq!(doc.node_count(), 1);
}

#[test]
fn test_split_text() {
    let mut doc = Document::new();
    let (p, t) = paragraph(&mut doc, "héllo");
    let tail = doc.split_text(t, 3).unwrap();

    assert_eq!(doc.text(t), Some("hé"));
    assert_eq!(doc.text(tail), Some("llo"));
    assert_eq!(doc.children(p), &[t, tail]);
    assert_eq!(doc.split_text(t, 2), Err(DomError::OutOfBounds));
}

#[test]
fn test_wrap_text_middle() {
    let mut doc = Document::new();
    let (p, t) = paragraph(&mut doc, "Hello world");
    let template = MarkerTemplate::new("mark", Some("hit"));
    let split = doc.wrap_text(t, 6, 9, &template).unwrap();

    assert_eq!(split.before, Some(t));
    assert_eq!(doc.text(t), Some("Hello "));
    assert_eq!(doc.text(split.marked), Some("wor"));
    assert_eq!(doc.text(split.after.unwrap()), Some("ld"));
    assert_eq!(doc.children(p).len(), 3);
    assert_eq!(doc.parent(split.marked), Some(split.marker));

    let marker = doc.element(split.marker).unwrap();
    assert!(template.matches(marker));
    assert_eq!(marker.attr(MARKER_ATTR), Some("true"));
    assert!(marker.has_class("hit"));
}

#[test]
fn test_wrap_whole_text_keeps_node() {
    let mut doc = Document::new();
    let (_, t) = paragraph(&mut doc, "all");
    let split = doc
        .wrap_text(t, 0, 3, &MarkerTemplate::new("mark", None))
        .unwrap();

    assert_eq!(split.before, None);
    assert_eq!(split.after, None);
    assert_eq!(split.marked, t);
}

#[test]
fn test_wrap_rejects_empty_span() {
    let mut doc = Document::new();
    let (_, t) = paragraph(&mut doc, "abc");
    let template = MarkerTemplate::new("mark", None);
    assert_eq!(doc.wrap_text(t, 1, 1, &template), Err(DomError::OutOfBounds));
    assert_eq!(doc.wrap_text(t, 1, 9, &template), Err(DomError::OutOfBounds));
}

#[test]
fn test_unwrap_restores_single_text() {
    let mut doc = Document::new();
    let (p, t) = paragraph(&mut doc, "Hello world");
    let split = doc
        .wrap_text(t, 6, 9, &MarkerTemplate::new("mark", None))
        .unwrap();
    doc.unwrap_element(split.marker).unwrap();

    assert_eq!(doc.children(p), &[t]);
    assert_eq!(doc.text(t), Some("Hello world"));
    assert!(!doc.contains(split.marker));
}

#[test]
fn test_unwrap_text_is_error() {
    let mut doc = Document::new();
    let (_, t) = paragraph(&mut doc, "x");
    assert_eq!(doc.unwrap_element(t), Err(DomError::NotElement));
}

#[test]
fn test_template_requires_marker_attr() {
    let template = MarkerTemplate::new("mark", None);
    let plain = Element::new("mark");
    assert!(!template.matches(&plain));

    let classed = MarkerTemplate::new("mark", Some("hit"));
    let mut el = Element::new("MARK");
    el.set_attr(MARKER_ATTR, "true");
    assert!(template.matches(&el));
    assert!(!classed.matches(&el));
}

#[test]
fn test_graft_copies_tree() {
    let mut other = Document::new();
    let (_, _) = paragraph(&mut other, "inner");

    let mut doc = Document::new();
    let host = doc.create_element(Element::new("iframe"));
    let root = doc.root();
    doc.append_child(root, host).unwrap();
    doc.graft(host, &other).unwrap();

    let p = doc.children(host)[0];
    assert_eq!(doc.tag(p), Some("p"));
    assert_eq!(doc.text_content(host), "inner");
}

#[test]
fn test_selector_parse_and_match() {
    let mut el = Element::new("div");
    el.set_attr("class", "note wide");
    el.set_attr("id", "main");
    el.set_attr("data-skip", "");

    for source in ["div", "*", ".note", "div.note.wide", "#main", "[data-skip]", "div#main[data-skip]"] {
        let selector = Selector::parse(source).unwrap();
        assert!(selector.matches(&el), "{source} should match");
    }
    for source in ["span", ".other", "#side", "[title]"] {
        let selector = Selector::parse(source).unwrap();
        assert!(!selector.matches(&el), "{source} should not match");
    }
    assert!(Selector::parse("").is_none());
    assert!(Selector::parse("div.").is_none());
    assert!(Selector::parse("div[unclosed").is_none());
}

#[test]
fn test_select_in_document_order() {
    let mut doc = Document::new();
    let (p1, _) = paragraph(&mut doc, "a");
    let (p2, _) = paragraph(&mut doc, "b");
    let selector = Selector::parse("p").unwrap();
    assert_eq!(doc.select(doc.root(), &selector), vec![p1, p2]);
}
