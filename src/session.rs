//! 标记会话
//!
//! MarkSession 持有文档、校验后的选项和片段缓存。每次调用按顺序执行：
//! 加载子树 -> 收集片段 -> 逐批编译模式并匹配 -> 上报统计。
//! 缓存只在 cache_fragments 开启时跨批复用，persist_cache 决定是否跨调用保留。

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;

use crate::config::MarkOptions;
use crate::dom::subtree::{load_subtrees, NoSubtrees, SubtreeLoader};
use crate::dom::walk::{is_excluded, text_units, WalkFilter};
use crate::dom::{Document, MarkerTemplate, NodeId, Selector};
use crate::error::{MarkError, Result};
use crate::fragment::{FragmentCache, FragmentKind};
use crate::matcher::ranges::RangeRun;
use crate::matcher::{MarkHandler, Matcher, RangeSpec, Target};
use crate::pattern::{capture_group_indexes, Synthesizer};

/// Totals of one marking call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSummary {
    /// Marker elements created.
    pub marked: usize,
    /// Logical matches; a match split over several units counts once.
    pub matches: usize,
    /// Matches per searched term (or per regex source).
    pub terms: BTreeMap<String, usize>,
    pub aborted: bool,
}

pub struct MarkSession<'d, L = NoSubtrees> {
    doc: &'d mut Document,
    options: MarkOptions,
    exclude: Vec<Selector>,
    template: MarkerTemplate,
    loader: L,
    cache: Option<FragmentCache>,
}

impl<'d> MarkSession<'d> {
    pub fn new(doc: &'d mut Document, options: MarkOptions) -> Result<Self> {
        Self::with_loader(doc, options, NoSubtrees)
    }
}

impl<'d, L: SubtreeLoader> MarkSession<'d, L> {
    pub fn with_loader(doc: &'d mut Document, options: MarkOptions, loader: L) -> Result<Self> {
        let options = options.validate()?;
        let exclude = options
            .exclude
            .iter()
            .map(|source| {
                Selector::parse(source).ok_or_else(|| {
                    MarkError::ConfigurationInvalid(format!("invalid exclude selector `{}`", source))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let template = MarkerTemplate::new(&options.element, options.class_name.as_deref());

        Ok(Self {
            doc,
            options,
            exclude,
            template,
            loader,
            cache: None,
        })
    }

    pub fn options(&self) -> &MarkOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Drops the fragment cache; the next call collects text afresh.
    pub fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            tracing::debug!("fragment cache invalidated");
        }
    }

    /// Marks every occurrence of `terms`.
    pub async fn mark<S: AsRef<str>>(
        &mut self,
        terms: &[S],
        handler: &mut dyn MarkHandler,
    ) -> Result<MarkSummary> {
        let keywords = separate_keywords(terms, self.options.separate_word_search);
        let mut summary = MarkSummary::default();
        if keywords.is_empty() {
            tracing::debug!("no search terms");
            return Ok(self.finish(summary, handler));
        }

        let rules = self.options.rules.clone();
        let synthesizer = match Synthesizer::new(&rules) {
            Ok(synthesizer) => synthesizer,
            Err(e) => {
                tracing::warn!(error = %e, "synonym patterns failed to compile");
                for term in &keywords {
                    summary.terms.insert(term.clone(), 0);
                    handler.no_match(term);
                }
                return Ok(self.finish(summary, handler));
            }
        };
        let (kind, boundary) = self.text_mode();
        let batch = self.options.combine_patterns.unwrap_or(1);

        for chunk in keywords.chunks(batch) {
            let compiled = match self.options.combine_patterns {
                Some(_) => synthesizer.combine(chunk),
                None => synthesizer.compile(&chunk[0]),
            };
            let pattern = match compiled {
                Ok(pattern) => pattern,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        terms = chunk.len(),
                        "skipping terms whose pattern failed to compile"
                    );
                    for term in chunk {
                        summary.terms.entry(term.clone()).or_default();
                        handler.no_match(term);
                    }
                    continue;
                }
            };
            tracing::debug!(pattern = %pattern.regex().as_str(), terms = chunk.len(), "compiled pattern");

            let mut cache = self.acquire(kind, boundary, handler).await;
            let stats = Matcher::new(self.doc, &mut cache, &self.template, handler).run(
                &Target::Terms {
                    pattern: &pattern,
                    terms: chunk,
                },
            );
            self.release(cache);

            summary.marked += stats.marked;
            summary.matches += stats.matches;
            for (term, &count) in chunk.iter().zip(&stats.per_term) {
                *summary.terms.entry(term.clone()).or_default() += count;
                if count == 0 {
                    handler.no_match(term);
                }
            }
            if stats.aborted {
                summary.aborted = true;
                break;
            }
        }

        Ok(self.finish(summary, handler))
    }

    /// Marks matches of a caller-supplied regex.
    pub async fn mark_regex(
        &mut self,
        regex: &Regex,
        handler: &mut dyn MarkHandler,
    ) -> Result<MarkSummary> {
        let target = if self.options.separate_groups {
            Target::Groups {
                regex,
                groups: capture_group_indexes(regex.as_str()),
            }
        } else {
            let group = match self.options.ignore_groups {
                0 => 0,
                n => n + 1,
            };
            Target::Regex { regex, group }
        };

        let (kind, boundary) = self.text_mode();
        let mut cache = self.acquire(kind, boundary, handler).await;
        let stats = Matcher::new(self.doc, &mut cache, &self.template, handler).run(&target);
        self.release(cache);

        if stats.matches == 0 {
            handler.no_match(regex.as_str());
        }
        let summary = MarkSummary {
            marked: stats.marked,
            matches: stats.matches,
            terms: BTreeMap::from([(regex.as_str().to_string(), stats.matches)]),
            aborted: stats.aborted,
        };
        Ok(self.finish(summary, handler))
    }

    /// Marks character ranges of the concatenated text. `authored_length`
    /// is the text length the ranges were computed against, if it may
    /// differ from the current one.
    pub async fn mark_ranges(
        &mut self,
        ranges: &[RangeSpec],
        authored_length: Option<usize>,
        handler: &mut dyn MarkHandler,
    ) -> Result<MarkSummary> {
        let run = RangeRun {
            wrap_all: self.options.wrap_all_ranges,
            authored_length,
        };

        let mut cache = self.acquire(FragmentKind::Across, false, handler).await;
        let stats = Matcher::new(self.doc, &mut cache, &self.template, handler).wrap_ranges(ranges, run);
        self.release(cache);

        let summary = MarkSummary {
            marked: stats.marked,
            matches: stats.matches,
            terms: BTreeMap::new(),
            aborted: stats.aborted,
        };
        Ok(self.finish(summary, handler))
    }

    /// Removes every marker this session's template produces, outside
    /// excluded sub-trees. Returns the number removed.
    pub fn unmark(&mut self) -> usize {
        let root = self.doc.root();
        let filter = WalkFilter::new(&self.exclude);
        let markers: Vec<NodeId> = self
            .doc
            .descendants(root)
            .into_iter()
            .filter(|&id| {
                self.doc
                    .element(id)
                    .is_some_and(|el| self.template.matches(el))
            })
            .filter(|&id| !self.doc.parent(id).is_some_and(|p| is_excluded(self.doc, p, &filter)))
            .collect();

        let mut removed = 0;
        for marker in markers.into_iter().rev() {
            match self.doc.unwrap_element(marker) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = %e, "failed to remove marker"),
            }
        }

        self.invalidate();
        tracing::info!(removed, "markers removed");
        removed
    }

    fn text_mode(&self) -> (FragmentKind, bool) {
        if self.options.across_elements {
            (
                FragmentKind::Across,
                self.options.rules.block_boundary.is_some(),
            )
        } else {
            (FragmentKind::PerFragment, false)
        }
    }

    async fn acquire(
        &mut self,
        kind: FragmentKind,
        boundary: bool,
        handler: &mut dyn MarkHandler,
    ) -> FragmentCache {
        let boundary_char = self
            .options
            .rules
            .block_boundary
            .as_ref()
            .filter(|_| boundary)
            .map(|b| b.char);

        if let Some(cache) = self.cache.take() {
            if self.options.cache_fragments && cache.kind == kind && cache.boundary == boundary_char {
                tracing::debug!(fragments = cache.fragments.len(), "reusing fragment cache");
                return cache;
            }
            tracing::debug!(kind = ?kind, "fragment cache does not fit, collecting");
        }

        self.collect(kind, boundary, handler).await
    }

    fn release(&mut self, cache: FragmentCache) {
        if self.options.cache_fragments {
            self.cache = Some(cache);
        }
    }

    async fn collect(
        &mut self,
        kind: FragmentKind,
        boundary: bool,
        handler: &mut dyn MarkHandler,
    ) -> FragmentCache {
        let root = self.doc.root();

        if self.options.load_subtrees {
            let filter = WalkFilter::new(&self.exclude);
            let failures = load_subtrees(
                self.doc,
                root,
                &self.options.subtree_tags,
                &filter,
                &self.loader,
                Duration::from_millis(self.options.subtree_timeout_ms),
            )
            .await;
            for failure in &failures {
                handler.subtree_unavailable(failure);
            }
        }

        let block = self.options.rules.block_boundary.as_ref().filter(|_| boundary);
        let skip = |doc: &Document, id: NodeId| handler.exclude(doc, id);
        let filter = WalkFilter {
            exclude: &self.exclude,
            block,
            skip: Some(&skip),
        };
        let units = text_units(self.doc, root, &filter);
        FragmentCache::collect(self.doc, &units, kind, block.map(|b| b.char))
    }

    fn finish(&mut self, summary: MarkSummary, handler: &mut dyn MarkHandler) -> MarkSummary {
        if !self.options.persist_cache {
            self.cache = None;
        }
        tracing::info!(
            marked = summary.marked,
            matches = summary.matches,
            aborted = summary.aborted,
            "marking finished"
        );
        handler.done(&summary);
        summary
    }
}

/// Splits terms on spaces when asked, drops blanks and duplicates, and
/// orders the rest longest first.
pub fn separate_keywords<S: AsRef<str>>(terms: &[S], separate: bool) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for term in terms {
        let term = term.as_ref();
        let parts: Vec<&str> = if separate {
            term.split(' ').collect()
        } else {
            vec![term]
        };
        for part in parts {
            if !part.trim().is_empty() && !keywords.iter().any(|k| k == part) {
                keywords.push(part.to_string());
            }
        }
    }
    keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    keywords
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
