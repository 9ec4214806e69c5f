//! 标记配置
//!
//! - RuleConfig: 匹配规则（变音符、同义词、通配符、精确度等），编译每个搜索词时只读
//! - MarkOptions: 一次标记会话的选项，会话开始时校验一次

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{MarkError, Result};

/// Default block-level tags used when block boundaries are enabled.
pub const DEFAULT_BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Accuracy {
    #[default]
    Partial,
    Complementary(Vec<String>),
    Exact(Vec<String>),
}

impl Accuracy {
    pub fn limiters(&self) -> &[String] {
        match self {
            Accuracy::Partial => &[],
            Accuracy::Complementary(limiters) | Accuracy::Exact(limiters) => limiters,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AccuracyRepr {
    Name(String),
    Detailed {
        value: String,
        #[serde(default)]
        limiters: Vec<String>,
    },
}

impl TryFrom<AccuracyRepr> for Accuracy {
    type Error = String;

    fn try_from(repr: AccuracyRepr) -> std::result::Result<Self, Self::Error> {
        let (value, limiters) = match repr {
            AccuracyRepr::Name(value) => (value, Vec::new()),
            AccuracyRepr::Detailed { value, limiters } => (value, limiters),
        };
        match value.as_str() {
            "partially" | "partial" => Ok(Accuracy::Partial),
            "complementary" => Ok(Accuracy::Complementary(limiters)),
            "exactly" | "exact" => Ok(Accuracy::Exact(limiters)),
            other => Err(format!("unknown accuracy `{}`", other)),
        }
    }
}

impl From<Accuracy> for AccuracyRepr {
    fn from(accuracy: Accuracy) -> Self {
        let (value, limiters) = match accuracy {
            Accuracy::Partial => return AccuracyRepr::Name("partially".to_string()),
            Accuracy::Complementary(limiters) => ("complementary", limiters),
            Accuracy::Exact(limiters) => ("exactly", limiters),
        };
        if limiters.is_empty() {
            AccuracyRepr::Name(value.to_string())
        } else {
            AccuracyRepr::Detailed {
                value: value.to_string(),
                limiters,
            }
        }
    }
}

impl<'de> Deserialize<'de> for Accuracy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = AccuracyRepr::deserialize(deserializer)?;
        Accuracy::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Accuracy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        AccuracyRepr::from(self.clone()).serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Wildcards {
    #[default]
    Disabled,
    Enabled,
    WithSpaces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Synonym {
    One(String),
    Many(Vec<String>),
}

impl Synonym {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Synonym::One(value) => vec![value.as_str()],
            Synonym::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockBoundary {
    /// Private character inserted between block-separated fragments.
    pub char: char,
    pub tag_names: Vec<String>,
    /// Add `tag_names` to the defaults instead of replacing them.
    pub extend: bool,
}

impl Default for BlockBoundary {
    fn default() -> Self {
        Self {
            char: '\u{1}',
            tag_names: Vec::new(),
            extend: false,
        }
    }
}

impl BlockBoundary {
    pub fn is_block(&self, tag: &str) -> bool {
        let custom = || self.tag_names.iter().any(|t| t.eq_ignore_ascii_case(tag));
        let default = || DEFAULT_BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag));
        if self.tag_names.is_empty() {
            default()
        } else if self.extend {
            custom() || default()
        } else {
            custom()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    pub diacritics: bool,
    pub synonyms: BTreeMap<String, Synonym>,
    pub accuracy: Accuracy,
    pub case_sensitive: bool,
    pub ignore_joiners: bool,
    pub ignore_punctuation: Vec<String>,
    pub wildcards: Wildcards,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_boundary: Option<BlockBoundary>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            diacritics: true,
            synonyms: BTreeMap::new(),
            accuracy: Accuracy::Partial,
            case_sensitive: false,
            ignore_joiners: false,
            ignore_punctuation: Vec::new(),
            wildcards: Wildcards::Disabled,
            block_boundary: None,
        }
    }
}

impl RuleConfig {
    pub fn uses_joiners(&self) -> bool {
        self.ignore_joiners || !self.ignore_punctuation.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkOptions {
    /// Tag of the marker element.
    pub element: CompactString,
    pub class_name: Option<String>,
    /// Selectors of sub-trees that never take part in matching.
    pub exclude: Vec<String>,
    pub across_elements: bool,
    pub separate_word_search: bool,
    pub separate_groups: bool,
    pub ignore_groups: usize,
    /// Number of terms compiled into one alternation; `None` compiles each
    /// term on its own.
    pub combine_patterns: Option<usize>,
    pub cache_fragments: bool,
    pub persist_cache: bool,
    pub wrap_all_ranges: bool,
    pub load_subtrees: bool,
    pub subtree_tags: Vec<String>,
    pub subtree_timeout_ms: u64,
    pub rules: RuleConfig,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            element: CompactString::new("mark"),
            class_name: None,
            exclude: Vec::new(),
            across_elements: false,
            separate_word_search: true,
            separate_groups: false,
            ignore_groups: 0,
            combine_patterns: None,
            cache_fragments: false,
            persist_cache: false,
            wrap_all_ranges: false,
            load_subtrees: false,
            subtree_tags: vec!["iframe".to_string()],
            subtree_timeout_ms: 5000,
            rules: RuleConfig::default(),
        }
    }
}

impl MarkOptions {
    pub fn validate(self) -> Result<Self> {
        if self.element.trim().is_empty() {
            return Err(MarkError::ConfigurationInvalid(
                "marker element tag is empty".to_string(),
            ));
        }
        if self.element.chars().any(|c| !c.is_ascii_alphanumeric() && c != '-') {
            return Err(MarkError::ConfigurationInvalid(format!(
                "marker element tag `{}` is not a valid tag name",
                self.element
            )));
        }
        if self.combine_patterns == Some(0) {
            return Err(MarkError::ConfigurationInvalid(
                "combinePatterns must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let options: MarkOptions = serde_json::from_str(data)?;
        options.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
