//! 匹配器
//!
//! - 跨片段：在虚拟串上匹配，把结果投影回片段
//! - 单片段：逐个片段独立匹配
//! - ranges: 按字符区间包裹
//!
//! 所有包裹都经过 FragmentCache::wrap_span，回调通过 MarkHandler 上报。

pub mod ranges;

use std::ops::Range;

use regex::{Captures, Regex};

use crate::dom::{Document, MarkerTemplate, NodeId};
use crate::error::{MarkError, RangeRejection};
use crate::fragment::{FragmentCache, FragmentKind};
use crate::pattern::CompiledPattern;

pub use ranges::{parse_ranges, RangeSpec};

/// Answer of [`MarkHandler::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Mark,
    Skip,
    /// Stop all further matching; counts so far are still reported.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterInfo<'a> {
    /// Full text of the match the candidate belongs to.
    pub match_text: &'a str,
    /// Virtual span of the whole match.
    pub span: (usize, usize),
    /// Virtual span of the candidate.
    pub candidate: (usize, usize),
    /// True until the first candidate of this match has been wrapped.
    pub match_start: bool,
    pub group_index: usize,
    pub term: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct EachInfo<'a> {
    /// True only for the first marker of a match.
    pub match_start: bool,
    pub group_index: usize,
    pub term: Option<&'a str>,
    /// Matches counted so far in this run, this one included.
    pub count: usize,
}

/// Callbacks of a marking call. Every method has a no-op default.
pub trait MarkHandler {
    fn filter(
        &mut self,
        _doc: &Document,
        _unit: NodeId,
        _candidate: &str,
        _info: &FilterInfo<'_>,
    ) -> Verdict {
        Verdict::Mark
    }

    fn each(&mut self, _doc: &Document, _marker: NodeId, _info: &EachInfo<'_>) {}

    fn no_match(&mut self, _term: &str) {}

    fn range_rejected(&mut self, _range: &RangeSpec, _reason: RangeRejection) {}

    fn subtree_unavailable(&mut self, _error: &MarkError) {}

    fn done(&mut self, _summary: &crate::session::MarkSummary) {}

    /// Extra exclusion applied while collecting text.
    fn exclude(&self, _doc: &Document, _element: NodeId) -> bool {
        false
    }
}

/// Handler that accepts every candidate and ignores every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl MarkHandler for NoopHandler {}

/// Counters of one matcher run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub marked: usize,
    pub matches: usize,
    /// Matches per term, indexed like the run's term list.
    pub per_term: Vec<usize>,
    pub aborted: bool,
}

impl RunStats {
    fn new(terms: usize) -> Self {
        Self {
            per_term: vec![0; terms],
            ..Self::default()
        }
    }
}

/// What a run looks for and which parts of a match it wraps.
pub enum Target<'p> {
    Terms {
        pattern: &'p CompiledPattern,
        terms: &'p [String],
    },
    /// Caller regex, wrapping one capture group (0 = whole match).
    Regex { regex: &'p Regex, group: usize },
    /// Caller regex, wrapping each top-level capture group on its own.
    Groups { regex: &'p Regex, groups: Vec<usize> },
}

struct Candidate {
    group: usize,
    span: Range<usize>,
    term: Option<usize>,
}

impl Target<'_> {
    fn regex(&self) -> &Regex {
        match self {
            Target::Terms { pattern, .. } => pattern.regex(),
            Target::Regex { regex, .. } | Target::Groups { regex, .. } => regex,
        }
    }

    fn term_count(&self) -> usize {
        match self {
            Target::Terms { terms, .. } => terms.len(),
            _ => 0,
        }
    }

    fn term(&self, index: Option<usize>) -> Option<&str> {
        match (self, index) {
            (Target::Terms { terms, .. }, Some(i)) => terms.get(i).map(String::as_str),
            _ => None,
        }
    }

    fn candidates(&self, caps: &Captures<'_>) -> Vec<Candidate> {
        match self {
            Target::Terms { pattern, .. } => pattern
                .resolve(caps)
                .map(|(term, m)| Candidate {
                    group: pattern.body_groups().start + term,
                    span: m.range(),
                    term: Some(term),
                })
                .into_iter()
                .collect(),
            Target::Regex { group, .. } => caps
                .get(*group)
                .map(|m| Candidate {
                    group: *group,
                    span: m.range(),
                    term: None,
                })
                .into_iter()
                .collect(),
            Target::Groups { groups, .. } => groups
                .iter()
                .filter_map(|&g| {
                    caps.get(g).map(|m| Candidate {
                        group: g,
                        span: m.range(),
                        term: None,
                    })
                })
                .collect(),
        }
    }

    fn resume_at(&self, caps: &Captures<'_>) -> usize {
        match self {
            Target::Terms { pattern, .. } => pattern.resume_at(caps),
            _ => caps.get(0).map_or(0, |m| m.end()),
        }
    }
}

/// Next search position after a match that ended scanning at `resume`.
/// Always moves forward; past the end it lands on `text.len() + 1`.
pub fn advance(text: &str, cursor: usize, resume: usize) -> usize {
    if resume > cursor {
        return resume;
    }
    match text.get(cursor..).and_then(|rest| rest.chars().next()) {
        Some(ch) => cursor + ch.len_utf8(),
        None => text.len() + 1,
    }
}

pub struct Matcher<'a> {
    doc: &'a mut Document,
    cache: &'a mut FragmentCache,
    template: &'a MarkerTemplate,
    handler: &'a mut dyn MarkHandler,
}

impl<'a> Matcher<'a> {
    pub fn new(
        doc: &'a mut Document,
        cache: &'a mut FragmentCache,
        template: &'a MarkerTemplate,
        handler: &'a mut dyn MarkHandler,
    ) -> Self {
        Self {
            doc,
            cache,
            template,
            handler,
        }
    }

    /// Runs `target` over the cache in the cache's own mode.
    pub fn run(&mut self, target: &Target<'_>) -> RunStats {
        self.cache.reset_hints();
        let mut stats = RunStats::new(target.term_count());
        match self.cache.kind {
            FragmentKind::Across => self.run_across(target, &mut stats),
            FragmentKind::PerFragment => self.run_per_fragment(target, &mut stats),
        }
        stats
    }

    fn run_across(&mut self, target: &Target<'_>, stats: &mut RunStats) {
        let value = std::mem::take(&mut self.cache.value);
        self.scan(&value, 0, target, stats);
        self.cache.value = value;
    }

    fn run_per_fragment(&mut self, target: &Target<'_>, stats: &mut RunStats) {
        let mut index = 0;
        while index < self.cache.fragments.len() {
            let fragment = &self.cache.fragments[index];
            let (text, base, end) = (fragment.text.clone(), fragment.start, fragment.end);
            self.scan(&text, base, target, stats);
            if stats.aborted {
                return;
            }
            // Skip the pieces this fragment was split into.
            while index < self.cache.fragments.len() && self.cache.fragments[index].start < end {
                index += 1;
            }
        }
    }

    /// Search loop over `text`, whose offset 0 sits at virtual `base`.
    fn scan(&mut self, text: &str, base: usize, target: &Target<'_>, stats: &mut RunStats) {
        let regex = target.regex();
        let mut cursor = 0;

        while cursor <= text.len() {
            let Some(caps) = regex.captures_at(text, cursor) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            let mut wrapped_end = 0;
            let mut match_start = true;
            for candidate in target.candidates(&caps) {
                if candidate.span.is_empty() || candidate.span.start < wrapped_end {
                    continue;
                }
                let (start, end) = (base + candidate.span.start, base + candidate.span.end);
                let Some(unit) = self.cache.owner_at(start, end) else {
                    continue;
                };

                let term = target.term(candidate.term);
                let info = FilterInfo {
                    match_text: whole.as_str(),
                    span: (base + whole.start(), base + whole.end()),
                    candidate: (start, end),
                    match_start,
                    group_index: candidate.group,
                    term,
                };
                match self
                    .handler
                    .filter(self.doc, unit, &text[candidate.span.clone()], &info)
                {
                    Verdict::Mark => {}
                    Verdict::Skip => continue,
                    Verdict::Abort => {
                        tracing::debug!(offset = start, "matching aborted by filter");
                        stats.aborted = true;
                        return;
                    }
                }

                let markers = self.cache.wrap_span(self.doc, start, end, self.template);
                if markers.is_empty() {
                    continue;
                }
                wrapped_end = candidate.span.end;
                if match_start {
                    stats.matches += 1;
                    if let Some(i) = candidate.term {
                        stats.per_term[i] += 1;
                    }
                }
                for (k, &marker) in markers.iter().enumerate() {
                    stats.marked += 1;
                    let each = EachInfo {
                        match_start: match_start && k == 0,
                        group_index: candidate.group,
                        term,
                        count: stats.matches,
                    };
                    self.handler.each(self.doc, marker, &each);
                }
                match_start = false;
            }

            cursor = advance(text, cursor, target.resume_at(&caps));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matcher.rs"]
mod tests;
