use super::*;
use crate::config::{BlockBoundary, RuleConfig, Wildcards};
use crate::dom::html;
use crate::dom::walk::{text_units, WalkFilter};
use crate::pattern::Synthesizer;

#[derive(Default)]
struct Recorder {
    marks: Vec<(String, bool)>,
    filtered: Vec<String>,
    skip: Vec<&'static str>,
    abort_after: Option<usize>,
}

impl MarkHandler for Recorder {
    fn filter(
        &mut self,
        _doc: &Document,
        _unit: NodeId,
        candidate: &str,
        _info: &FilterInfo<'_>,
    ) -> Verdict {
        self.filtered.push(candidate.to_string());
        if self.abort_after.is_some_and(|n| self.filtered.len() > n) {
            return Verdict::Abort;
        }
        if self.skip.iter().any(|s| *s == candidate) {
            return Verdict::Skip;
        }
        Verdict::Mark
    }

    fn each(&mut self, doc: &Document, marker: NodeId, info: &EachInfo<'_>) {
        self.marks.push((doc.text_content(marker), info.match_start));
    }
}

fn setup(source: &str, kind: FragmentKind, block: Option<&BlockBoundary>) -> (Document, FragmentCache) {
    let doc = html::parse(source).unwrap();
    let filter = WalkFilter {
        exclude: &[],
        block,
        skip: None,
    };
    let units = text_units(&doc, doc.root(), &filter);
    let cache = FragmentCache::collect(&doc, &units, kind, block.map(|b| b.char));
    (doc, cache)
}

fn mark_term(
    source: &str,
    term: &str,
    rules: &RuleConfig,
    kind: FragmentKind,
    handler: &mut dyn MarkHandler,
) -> (String, RunStats) {
    let (mut doc, mut cache) = setup(source, kind, rules.block_boundary.as_ref());
    let synth = Synthesizer::new(rules).unwrap();
    let pattern = synth.compile(term).unwrap();
    let terms = vec![term.to_string()];
    let template = MarkerTemplate::new("mark", None);
    let stats = Matcher::new(&mut doc, &mut cache, &template, handler).run(&Target::Terms {
        pattern: &pattern,
        terms: &terms,
    });
    (html::serialize(&doc), stats)
}

const M: &str = "<mark data-markjs=\"true\">";

#[test]
fn test_advance() {
    assert_eq!(advance("abc", 0, 2), 2);
    assert_eq!(advance("abc", 1, 1), 2);
    assert_eq!(advance("éa", 0, 0), 2);
    assert_eq!(advance("abc", 3, 3), 4);
}

#[test]
fn test_partial_wraps_inside_word() {
    let mut handler = NoopHandler;
    let (out, stats) = mark_term("<p>lorem</p>", "lor", &RuleConfig::default(), FragmentKind::PerFragment, &mut handler);
    assert_eq!(out, format!("<p>{M}lor</mark>em</p>"));
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.per_term, vec![1]);
}

#[test]
fn test_exact_requires_whole_word() {
    let rules = RuleConfig {
        accuracy: crate::config::Accuracy::Exact(Vec::new()),
        ..RuleConfig::default()
    };
    let mut handler = NoopHandler;
    let (_, stats) = mark_term("<p>lorem ipsum</p>", "lor", &rules, FragmentKind::Across, &mut handler);
    assert_eq!(stats.matches, 0);

    let (out, stats) = mark_term("<p>lorem lorem</p>", "lorem", &rules, FragmentKind::Across, &mut handler);
    assert_eq!(stats.matches, 2);
    assert_eq!(out, format!("<p>{M}lorem</mark> {M}lorem</mark></p>"));
}

#[test]
fn test_cross_fragment_match_start_flags() {
    let mut handler = Recorder::default();
    let (out, stats) = mark_term(
        "<p>Hello <b>wor</b>ld</p>",
        "world",
        &RuleConfig::default(),
        FragmentKind::Across,
        &mut handler,
    );
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.marked, 2);
    assert_eq!(
        handler.marks,
        vec![("wor".to_string(), true), ("ld".to_string(), false)]
    );
    assert_eq!(out, format!("<p>Hello <b>{M}wor</mark></b>{M}ld</mark></p>"));
}

#[test]
fn test_per_fragment_does_not_cross() {
    let mut handler = NoopHandler;
    let (_, stats) = mark_term(
        "<p>Hello <b>wor</b>ld</p>",
        "world",
        &RuleConfig::default(),
        FragmentKind::PerFragment,
        &mut handler,
    );
    assert_eq!(stats.matches, 0);
}

#[test]
fn test_block_boundary_blocks_match() {
    let rules = RuleConfig {
        block_boundary: Some(BlockBoundary::default()),
        ..RuleConfig::default()
    };
    let mut handler = NoopHandler;
    let (_, stats) = mark_term("<div>wor</div><div>ld</div>", "world", &rules, FragmentKind::Across, &mut handler);
    assert_eq!(stats.matches, 0);

    let (_, stats) = mark_term("<div>wor<i>ld</i></div>", "world", &rules, FragmentKind::Across, &mut handler);
    assert_eq!(stats.matches, 1);
}

#[test]
fn test_filter_skip_continues_scan() {
    let mut handler = Recorder {
        skip: vec!["b"],
        ..Recorder::default()
    };
    let (doc_html, stats) = {
        let (mut doc, mut cache) = setup("<p>a b c</p>", FragmentKind::Across, None);
        let regex = Regex::new("[abc]").unwrap();
        let template = MarkerTemplate::new("mark", None);
        let stats = Matcher::new(&mut doc, &mut cache, &template, &mut handler)
            .run(&Target::Regex { regex: &regex, group: 0 });
        (html::serialize(&doc), stats)
    };
    assert_eq!(handler.filtered, vec!["a", "b", "c"]);
    assert_eq!(stats.matches, 2);
    assert_eq!(doc_html, format!("<p>{M}a</mark> b {M}c</mark></p>"));
}

#[test]
fn test_filter_abort_keeps_counts() {
    let mut handler = Recorder {
        abort_after: Some(1),
        ..Recorder::default()
    };
    let (mut doc, mut cache) = setup("<p>x x x</p>", FragmentKind::Across, None);
    let regex = Regex::new("x").unwrap();
    let template = MarkerTemplate::new("mark", None);
    let stats = Matcher::new(&mut doc, &mut cache, &template, &mut handler)
        .run(&Target::Regex { regex: &regex, group: 0 });
    assert!(stats.aborted);
    assert_eq!(stats.matches, 1);
}

#[test]
fn test_zero_length_matches_terminate() {
    let (mut doc, mut cache) = setup("<p>aa b a</p>", FragmentKind::Across, None);
    let regex = Regex::new("a*").unwrap();
    let template = MarkerTemplate::new("mark", None);
    let mut handler = NoopHandler;
    let stats = Matcher::new(&mut doc, &mut cache, &template, &mut handler)
        .run(&Target::Regex { regex: &regex, group: 0 });
    assert_eq!(stats.matches, 2);
    assert_eq!(
        html::serialize(&doc),
        format!("<p>{M}aa</mark> b {M}a</mark></p>")
    );
}

#[test]
fn test_wildcard_star_can_match_empty() {
    let rules = RuleConfig {
        wildcards: Wildcards::Enabled,
        ..RuleConfig::default()
    };
    let mut handler = NoopHandler;
    let (_, stats) = mark_term("<p>lorm lorem lor m</p>", "lor*m", &rules, FragmentKind::Across, &mut handler);
    assert_eq!(stats.matches, 2);
}

#[test]
fn test_separate_groups_skip_overlap() {
    let (mut doc, mut cache) = setup("<p>ab cd</p>", FragmentKind::Across, None);
    let regex = Regex::new("(a)(b) (c(d))").unwrap();
    let groups = crate::pattern::capture_group_indexes(regex.as_str());
    assert_eq!(groups, vec![1, 2, 3]);
    let template = MarkerTemplate::new("mark", None);
    let mut handler = Recorder::default();
    let stats = Matcher::new(&mut doc, &mut cache, &template, &mut handler)
        .run(&Target::Groups { regex: &regex, groups });
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.marked, 3);
    assert_eq!(
        handler.marks,
        vec![
            ("a".to_string(), true),
            ("b".to_string(), false),
            ("cd".to_string(), false)
        ]
    );
}

#[test]
fn test_regex_group_selection() {
    let (mut doc, mut cache) = setup("<p>#tag here</p>", FragmentKind::Across, None);
    let regex = Regex::new(r"(#)(\w+)").unwrap();
    let template = MarkerTemplate::new("mark", None);
    let mut handler = NoopHandler;
    Matcher::new(&mut doc, &mut cache, &template, &mut handler)
        .run(&Target::Regex { regex: &regex, group: 2 });
    assert_eq!(html::serialize(&doc), format!("<p>#{M}tag</mark> here</p>"));
}
