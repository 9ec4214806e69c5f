use super::*;
use crate::dom::html;
use crate::dom::walk::{text_units, WalkFilter};
use crate::dom::MarkerTemplate;
use crate::fragment::{FragmentCache, FragmentKind};
use crate::matcher::MarkHandler;

#[derive(Default)]
struct Rejections(Vec<(RangeSpec, RangeRejection)>);

impl MarkHandler for Rejections {
    fn range_rejected(&mut self, range: &RangeSpec, reason: RangeRejection) {
        self.0.push((*range, reason));
    }
}

fn wrap(source: &str, ranges: &[RangeSpec], run: RangeRun) -> (String, RunStats, Rejections) {
    let mut doc = html::parse(source).unwrap();
    let units = text_units(&doc, doc.root(), &WalkFilter::new(&[]));
    let mut cache = FragmentCache::collect(&doc, &units, FragmentKind::Across, None);
    let template = MarkerTemplate::new("mark", None);
    let mut handler = Rejections::default();
    let stats = Matcher::new(&mut doc, &mut cache, &template, &mut handler).wrap_ranges(ranges, run);
    (html::serialize(&doc), stats, handler)
}

const M: &str = "<mark data-markjs=\"true\">";

#[test]
fn test_wrap_sorted_ranges() {
    let (out, stats, rejected) = wrap(
        "<p>Hello <b>wor</b>ld</p>",
        &[RangeSpec::new(6, 5), RangeSpec::new(0, 2)],
        RangeRun::default(),
    );
    assert!(rejected.0.is_empty());
    assert_eq!(stats.matches, 2);
    assert_eq!(stats.marked, 3);
    assert_eq!(
        out,
        format!("<p>{M}He</mark>llo <b>{M}wor</mark></b>{M}ld</mark></p>")
    );
}

#[test]
fn test_negative_length_rejected() {
    let range = RangeSpec::new(5, -1);
    let (out, stats, rejected) = wrap("<p>Hello world</p>", &[range], RangeRun::default());
    assert_eq!(stats.matches, 0);
    assert_eq!(rejected.0, vec![(range, RangeRejection::BadBounds)]);
    assert_eq!(out, "<p>Hello world</p>");
}

#[test]
fn test_whitespace_only_rejected() {
    let range = RangeSpec::new(5, 1);
    let (_, stats, rejected) = wrap("<p>Hello world</p>", &[range], RangeRun::default());
    assert_eq!(stats.matches, 0);
    assert_eq!(rejected.0, vec![(range, RangeRejection::WhitespaceOnly)]);
}

#[test]
fn test_overlap_rejected_unless_wrap_all() {
    let ranges = [RangeSpec::new(0, 5), RangeSpec::new(2, 2)];
    let (_, stats, rejected) = wrap("<p>Hello world</p>", &ranges, RangeRun::default());
    assert_eq!(stats.matches, 1);
    assert_eq!(rejected.0, vec![(ranges[1], RangeRejection::Overlap)]);

    let run = RangeRun {
        wrap_all: true,
        ..RangeRun::default()
    };
    let (out, stats, _) = wrap("<p>Hello world</p>", &ranges, run);
    assert_eq!(stats.matches, 2);
    assert_eq!(
        out,
        format!("<p>{M}He{M}ll</mark>o</mark> world</p>")
    );
}

#[test]
fn test_clipped_and_out_of_bounds() {
    let ranges = [RangeSpec::new(6, 100), RangeSpec::new(40, 2)];
    let (out, stats, rejected) = wrap("<p>Hello world</p>", &ranges, RangeRun::default());
    assert_eq!(stats.matches, 1);
    assert_eq!(rejected.0, vec![(ranges[1], RangeRejection::OutOfBounds)]);
    assert_eq!(out, format!("<p>Hello {M}world</mark></p>"));
}

#[test]
fn test_char_offsets() {
    let (out, _, _) = wrap("<p>héllo</p>", &[RangeSpec::new(1, 2)], RangeRun::default());
    assert_eq!(out, format!("<p>h{M}él</mark>lo</p>"));
}

#[test]
fn test_authored_length_reprojects() {
    // Authored against "xx Hello", current text lost the "xx " prefix.
    let run = RangeRun {
        authored_length: Some(8),
        ..RangeRun::default()
    };
    let (out, _, _) = wrap("<p>Hello</p>", &[RangeSpec::new(3, 2)], run);
    assert_eq!(out, format!("<p>{M}He</mark>llo</p>"));
}

#[test]
fn test_reprojection_saturates_huge_start() {
    let run = RangeRun {
        authored_length: Some(0),
        ..RangeRun::default()
    };
    let (out, stats, rejected) = wrap("<p>Hello</p>", &[RangeSpec::new(i64::MAX - 1, 1)], run);
    assert_eq!(out, "<p>Hello</p>");
    assert_eq!(stats.matches, 0);
    assert_eq!(rejected.0[0].1, RangeRejection::OutOfBounds);
}

#[test]
fn test_parse_ranges_lenient_values() {
    let value = serde_json::json!([
        {"start": 1, "length": "3"},
        {"start": "x", "length": 2},
        {"start": 2.9}
    ]);
    let ranges = parse_ranges(&value).unwrap();
    assert_eq!(ranges[0], RangeSpec::new(1, 3));
    assert_eq!(ranges[1].start, None);
    assert_eq!(ranges[2], RangeSpec { start: Some(2), length: None });
}

#[test]
fn test_parse_ranges_shape_errors() {
    assert!(matches!(
        parse_ranges(&serde_json::json!({"start": 1})),
        Err(MarkError::ConfigurationInvalid(_))
    ));
    assert!(matches!(
        parse_ranges(&serde_json::json!([1, 2])),
        Err(MarkError::ConfigurationInvalid(_))
    ));
    assert!(parse_ranges(&serde_json::json!([])).unwrap().is_empty());
}
