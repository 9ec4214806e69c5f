use super::*;
use crate::dom::html;

fn texts(doc: &Document, units: &[TextUnit]) -> Vec<String> {
    units
        .iter()
        .map(|u| doc.text(u.node).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_units_in_document_order() {
    let doc = html::parse("<p>Hello <b>wor</b>ld</p>").unwrap();
    let units = text_units(&doc, doc.root(), &WalkFilter::new(&[]));
    assert_eq!(texts(&doc, &units), vec!["Hello ", "wor", "ld"]);
    assert!(units.iter().all(|u| !u.boundary_before));
}

#[test]
fn test_script_and_style_skipped() {
    let doc = html::parse("<div>a<script>var b;</script><style>p{}</style>c</div>").unwrap();
    let units = text_units(&doc, doc.root(), &WalkFilter::new(&[]));
    assert_eq!(texts(&doc, &units), vec!["a", "c"]);
}

#[test]
fn test_exclude_selectors() {
    let doc = html::parse("<div>keep <span class=\"skip\">drop <b>me</b></span> too</div>").unwrap();
    let exclude = vec![Selector::parse(".skip").unwrap()];
    let units = text_units(&doc, doc.root(), &WalkFilter::new(&exclude));
    assert_eq!(texts(&doc, &units), vec!["keep ", " too"]);
}

#[test]
fn test_skip_predicate() {
    let doc = html::parse("<p>a</p><aside>b</aside><p>c</p>").unwrap();
    let skip = |d: &Document, id: NodeId| d.tag(id) == Some("aside");
    let filter = WalkFilter {
        exclude: &[],
        block: None,
        skip: Some(&skip),
    };
    let units = text_units(&doc, doc.root(), &filter);
    assert_eq!(texts(&doc, &units), vec!["a", "c"]);
}

#[test]
fn test_block_boundaries_flagged() {
    let doc = html::parse("<div><p>one</p><p>two <i>three</i></p></div>").unwrap();
    let block = BlockBoundary::default();
    let filter = WalkFilter {
        exclude: &[],
        block: Some(&block),
        skip: None,
    };
    let units = text_units(&doc, doc.root(), &filter);
    assert_eq!(texts(&doc, &units), vec!["one", "two ", "three"]);
    let flags: Vec<bool> = units.iter().map(|u| u.boundary_before).collect();
    assert_eq!(flags, vec![true, true, false]);
}

#[test]
fn test_void_block_counts_as_boundary() {
    let doc = html::parse("<span>left<br>right</span>").unwrap();
    let block = BlockBoundary::default();
    let filter = WalkFilter {
        exclude: &[],
        block: Some(&block),
        skip: None,
    };
    let units = text_units(&doc, doc.root(), &filter);
    assert_eq!(texts(&doc, &units), vec!["left", "right"]);
    assert!(units[1].boundary_before);
}

#[test]
fn test_is_excluded_checks_ancestors() {
    let doc = html::parse("<div class=\"skip\"><p>x</p></div>").unwrap();
    let exclude = vec![Selector::parse(".skip").unwrap()];
    let filter = WalkFilter::new(&exclude);
    let p = doc.select(doc.root(), &Selector::parse("p").unwrap())[0];
    assert!(is_excluded(&doc, p, &filter));
    assert!(!is_excluded(&doc, p, &WalkFilter::new(&[])));
}
