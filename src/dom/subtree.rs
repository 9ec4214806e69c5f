//! 外部子树加载
//!
//! 宿主元素（默认 iframe）的内容通过 SubtreeLoader 异步加载，超时或失败时视为空子树。

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use super::walk::{is_excluded, WalkFilter};
use super::{html, Document, LoadState, NodeId};
use crate::error::MarkError;

#[allow(async_fn_in_trait)]
pub trait SubtreeLoader {
    async fn load(&self, src: &str) -> io::Result<Document>;
}

/// Loader for documents without external sub-trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubtrees;

impl SubtreeLoader for NoSubtrees {
    async fn load(&self, src: &str) -> io::Result<Document> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no loader configured for {}", src),
        ))
    }
}

/// Reads sub-tree HTML files relative to a base directory.
#[derive(Debug, Clone)]
pub struct FsSubtreeLoader {
    base: PathBuf,
}

impl FsSubtreeLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl SubtreeLoader for FsSubtreeLoader {
    async fn load(&self, src: &str) -> io::Result<Document> {
        let path = self.base.join(src);
        let source = tokio::fs::read_to_string(&path).await?;
        html::parse(&source).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

/// Loads every not-yet-loaded host under `root`, including hosts found in
/// freshly loaded content. Returns the hosts that ended up unavailable.
pub async fn load_subtrees<L: SubtreeLoader>(
    doc: &mut Document,
    root: NodeId,
    tags: &[String],
    filter: &WalkFilter<'_>,
    loader: &L,
    timeout: Duration,
) -> Vec<MarkError> {
    let mut failures = Vec::new();

    loop {
        let pending = pending_hosts(doc, root, tags, filter);
        if pending.is_empty() {
            break;
        }

        for (host, src) in pending {
            clear_children(doc, host);
            if loaded_above(doc, host, &src, tags) {
                doc.set_load_state(host, LoadState::Unavailable);
                failures.push(MarkError::SubtreeUnavailable {
                    src,
                    reason: "recursive sub-tree reference".to_string(),
                });
                continue;
            }

            let reason = match tokio::time::timeout(timeout, loader.load(&src)).await {
                Ok(Ok(subtree)) => match doc.graft(host, &subtree) {
                    Ok(()) => {
                        doc.set_load_state(host, LoadState::Loaded);
                        tracing::debug!(src = %src, "sub-tree loaded");
                        continue;
                    }
                    Err(e) => e.to_string(),
                },
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {}ms", timeout.as_millis()),
            };

            tracing::warn!(src = %src, reason = %reason, "sub-tree unavailable");
            clear_children(doc, host);
            doc.set_load_state(host, LoadState::Unavailable);
            failures.push(MarkError::SubtreeUnavailable { src, reason });
        }
    }

    failures
}

fn pending_hosts(
    doc: &Document,
    root: NodeId,
    tags: &[String],
    filter: &WalkFilter<'_>,
) -> Vec<(NodeId, String)> {
    doc.descendants(root)
        .into_iter()
        .filter(|&id| matches!(doc.load_state(id), None | Some(LoadState::NotLoaded)))
        .filter_map(|id| {
            let element = doc.element(id)?;
            if !tags.iter().any(|t| element.tag.eq_ignore_ascii_case(t)) {
                return None;
            }
            let src = element.attr("src")?.trim();
            if src.is_empty() || is_excluded(doc, id, filter) {
                return None;
            }
            Some((id, src.to_string()))
        })
        .collect()
}

/// True when a host higher up the chain already loads `src`.
fn loaded_above(doc: &Document, host: NodeId, src: &str, tags: &[String]) -> bool {
    let mut current = doc.parent(host);
    while let Some(id) = current {
        let is_host = doc.element(id).is_some_and(|el| {
            tags.iter().any(|t| el.tag.eq_ignore_ascii_case(t))
                && el.attr("src").map(str::trim) == Some(src)
        });
        if is_host {
            return true;
        }
        current = doc.parent(id);
    }
    false
}

fn clear_children(doc: &mut Document, host: NodeId) {
    for child in doc.children(host).to_vec() {
        doc.remove(child);
    }
}
