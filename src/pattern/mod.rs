//! 正则合成
//!
//! 把搜索词和 RuleConfig 合成为一个正则：
//! 通配符占位 → 转义 → 同义词 → 连接符占位 → 变音符 → 合并空白
//! → 连接符展开 → 通配符展开 → 精确度包装
//!
//! 合成结果的分组约定：第 1 组是前置边界，随后是词体（合并模式下每个词一个分组），
//! 最后一组是被消耗的后置边界（regex crate 不支持 lookahead，扫描时从该组起点继续）。

mod diacritics;
mod groups;

use std::ops::Range;

use regex::{Captures, NoExpand, Regex, RegexBuilder};

use crate::config::{Accuracy, RuleConfig, Wildcards};

pub use diacritics::class_of as diacritic_class;
pub use groups::capture_group_indexes;

const JOINER_MARK: char = '\u{0}';
const ONE_MARK: char = '\u{1}';
const ANY_MARK: char = '\u{2}';

/// Punctuation treated as a word limiter by complementary accuracy.
const DEFAULT_LIMITERS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~¡¿";

/// Soft hyphen, zero-width space, zero-width non-joiner, zero-width joiner.
const JOINER_CLASS: &str = r"\x{AD}\x{200B}\x{200C}\x{200D}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParts {
    pub lookbehind: String,
    pub body: String,
    pub lookahead: String,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    parts: PatternParts,
    regex: Regex,
    body_groups: Range<usize>,
    lookahead_group: usize,
}

impl CompiledPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn parts(&self) -> &PatternParts {
        &self.parts
    }

    pub fn term_count(&self) -> usize {
        self.body_groups.len()
    }

    pub fn body_groups(&self) -> Range<usize> {
        self.body_groups.clone()
    }

    pub fn lookahead_group(&self) -> usize {
        self.lookahead_group
    }

    /// Index of the term whose body matched, with the body's span.
    pub fn resolve<'h>(&self, caps: &Captures<'h>) -> Option<(usize, regex::Match<'h>)> {
        self.body_groups
            .clone()
            .enumerate()
            .find_map(|(term, group)| caps.get(group).map(|m| (term, m)))
    }

    /// Where scanning resumes: the consumed trailing limiter stays
    /// available as the leading limiter of the next match.
    pub fn resume_at(&self, caps: &Captures<'_>) -> usize {
        caps.get(self.lookahead_group)
            .or_else(|| caps.get(0))
            .map(|m| m.start())
            .unwrap_or(0)
    }
}

struct SynonymGroup {
    finder: Regex,
    replacement: String,
}

pub struct Synthesizer<'a> {
    rules: &'a RuleConfig,
    synonyms: Vec<SynonymGroup>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(rules: &'a RuleConfig) -> Result<Self, regex::Error> {
        let mut synth = Self {
            rules,
            synonyms: Vec::new(),
        };
        synth.synonyms = synth.build_synonyms()?;
        Ok(synth)
    }

    pub fn rules(&self) -> &RuleConfig {
        self.rules
    }

    /// The three uninstantiated pieces for `term`.
    pub fn parts(&self, term: &str) -> PatternParts {
        let wildcards = self.rules.wildcards != Wildcards::Disabled;
        let joiners = self.rules.uses_joiners();

        let mut s = if wildcards {
            placehold_wildcards(term)
        } else {
            term.to_string()
        };
        s = regex::escape(&s);
        if !self.synonyms.is_empty() {
            s = self.substitute_synonyms(s);
        }
        if joiners {
            s = placehold_joiners(&s);
        }
        if self.rules.diacritics {
            s = diacritics::fold(&s, self.rules.case_sensitive);
        }
        s = merge_blanks(&s);
        if joiners {
            s = self.materialize_joiners(&s);
        }
        if wildcards {
            s = self.materialize_wildcards(&s);
        }
        self.wrap_accuracy(s)
    }

    pub fn compile(&self, term: &str) -> Result<CompiledPattern, regex::Error> {
        let parts = self.parts(term);
        let source = format!(
            "{}({})({})",
            parts.lookbehind, parts.body, parts.lookahead
        );
        let regex = self.build(&source)?;
        tracing::debug!(term, pattern = %source, "compiled term pattern");
        Ok(CompiledPattern {
            parts,
            regex,
            body_groups: 2..3,
            lookahead_group: 3,
        })
    }

    /// One alternation for several terms sharing the outer limiters; the
    /// body of term `i` is capture group `2 + i`.
    pub fn combine<S: AsRef<str>>(&self, terms: &[S]) -> Result<CompiledPattern, regex::Error> {
        let mut lookbehind = String::new();
        let mut lookahead = String::new();
        let mut bodies = Vec::with_capacity(terms.len());
        for term in terms {
            let parts = self.parts(term.as_ref());
            lookbehind = parts.lookbehind;
            lookahead = parts.lookahead;
            bodies.push(format!("({})", parts.body));
        }
        if bodies.is_empty() {
            lookbehind = "()".to_string();
        }

        let body = bodies.join("|");
        let source = format!("{}(?:{})({})", lookbehind, body, lookahead);
        let regex = self.build(&source)?;
        tracing::debug!(terms = terms.len(), pattern = %source, "compiled combined pattern");
        Ok(CompiledPattern {
            parts: PatternParts {
                lookbehind,
                body,
                lookahead,
            },
            regex,
            body_groups: 2..2 + terms.len(),
            lookahead_group: 2 + terms.len(),
        })
    }

    fn build(&self, source: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(source)
            .multi_line(true)
            .case_insensitive(!self.rules.case_sensitive)
            .build()
    }

    fn build_synonyms(&self) -> Result<Vec<SynonymGroup>, regex::Error> {
        let wildcards = self.rules.wildcards != Wildcards::Disabled;
        let joiner = if self.rules.uses_joiners() {
            JOINER_MARK.to_string()
        } else {
            String::new()
        };

        let mut groups = Vec::new();
        for (key, value) in &self.rules.synonyms {
            let mut members: Vec<&str> = vec![key.as_str()];
            members.extend(value.values());
            sort_by_length(&mut members);

            let members: Vec<String> = members
                .into_iter()
                .map(|member| {
                    let member = if wildcards {
                        placehold_wildcards(member)
                    } else {
                        member.to_string()
                    };
                    regex::escape(&member)
                })
                .filter(|member| !member.is_empty())
                .collect();
            if members.len() < 2 {
                continue;
            }

            let search = members
                .iter()
                .map(|m| regex::escape(m))
                .collect::<Vec<_>>()
                .join("|");
            let finder = RegexBuilder::new(&search)
                .case_insensitive(!self.rules.case_sensitive)
                .build()?;
            let replacement = format!("{}(?:{}){}", joiner, members.join("|"), joiner);
            groups.push(SynonymGroup {
                finder,
                replacement,
            });
        }
        Ok(groups)
    }

    fn substitute_synonyms(&self, mut s: String) -> String {
        for group in &self.synonyms {
            s = group
                .finder
                .replace_all(&s, NoExpand(&group.replacement))
                .into_owned();
        }
        s
    }

    fn materialize_joiners(&self, s: &str) -> String {
        let mut class = String::new();
        for punctuation in &self.rules.ignore_punctuation {
            for ch in punctuation.chars() {
                class.push_str(&escape_class_char(ch));
            }
        }
        if self.rules.ignore_joiners {
            class.push_str(JOINER_CLASS);
        }

        let replacement = if class.is_empty() {
            String::new()
        } else {
            format!("[{}]*", class)
        };

        let mut out = String::with_capacity(s.len());
        let mut in_run = false;
        for ch in s.chars() {
            if ch == JOINER_MARK {
                if !in_run {
                    out.push_str(&replacement);
                    in_run = true;
                }
                continue;
            }
            in_run = false;
            out.push(ch);
        }
        out
    }

    fn materialize_wildcards(&self, s: &str) -> String {
        let boundary = self
            .rules
            .block_boundary
            .as_ref()
            .map(|b| escape_class_char(b.char));
        let spaces = self.rules.wildcards == Wildcards::WithSpaces;

        let (one, any) = match (spaces, boundary) {
            (false, None) => (r"\S?".to_string(), r"\S*".to_string()),
            (false, Some(b)) => (format!(r"[^\s{}]?", b), format!(r"[^\s{}]*", b)),
            (true, None) => (r"[\s\S]?".to_string(), r"[\s\S]*?".to_string()),
            (true, Some(b)) => (format!("[^{}]?", b), format!("[^{}]*?", b)),
        };

        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            match ch {
                ONE_MARK => out.push_str(&one),
                ANY_MARK => out.push_str(&any),
                _ => out.push(ch),
            }
        }
        out
    }

    fn limiter_class(&self, limiters: &[String], fallback: &str) -> String {
        let mut class = String::from(r"\s");
        if limiters.is_empty() {
            for ch in fallback.chars() {
                class.push_str(&escape_class_char(ch));
            }
        } else {
            for limiter in limiters {
                for ch in limiter.chars() {
                    class.push_str(&escape_class_char(ch));
                }
            }
        }
        if let Some(boundary) = &self.rules.block_boundary {
            class.push_str(&escape_class_char(boundary.char));
        }
        class
    }

    fn wrap_accuracy(&self, body: String) -> PatternParts {
        match &self.rules.accuracy {
            Accuracy::Partial => PatternParts {
                lookbehind: "()".to_string(),
                body,
                lookahead: String::new(),
            },
            Accuracy::Complementary(limiters) => {
                let class = self.limiter_class(limiters, DEFAULT_LIMITERS);
                PatternParts {
                    lookbehind: "()".to_string(),
                    body: format!("[^{class}]*{body}[^{class}]*"),
                    lookahead: String::new(),
                }
            }
            Accuracy::Exact(limiters) => {
                let class = self.limiter_class(limiters, "");
                PatternParts {
                    lookbehind: format!("(^|[{}])", class),
                    body,
                    lookahead: format!("(?:$|[{}])", class),
                }
            }
        }
    }
}

/// Longest first, ties broken lexicographically.
fn sort_by_length(members: &mut Vec<&str>) {
    members.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    members.dedup();
}

fn placehold_wildcards(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut chars = term.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let mut run = 1;
                while chars.peek() == Some(&'\\') {
                    chars.next();
                    run += 1;
                }
                match chars.peek() {
                    Some(&wildcard @ ('?' | '*')) => {
                        chars.next();
                        out.push(wildcard);
                    }
                    _ => out.extend(std::iter::repeat('\\').take(run)),
                }
            }
            '?' => out.push(ONE_MARK),
            '*' => out.push(ANY_MARK),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'s> {
    Atom(&'s str),
    Syntax(&'s str),
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut iter = s.char_indices().peekable();
    while let Some((i, ch)) = iter.next() {
        let token = match ch {
            '\\' => match iter.next() {
                Some((j, next)) => Token::Atom(&s[i..j + next.len_utf8()]),
                None => Token::Atom(&s[i..i + 1]),
            },
            '(' if s[i..].starts_with("(?:") => {
                iter.next();
                iter.next();
                Token::Syntax(&s[i..i + 3])
            }
            '|' | ')' | JOINER_MARK => Token::Syntax(&s[i..i + ch.len_utf8()]),
            _ => Token::Atom(&s[i..i + ch.len_utf8()]),
        };
        tokens.push(token);
    }
    tokens
}

/// Puts a joiner marker between every two adjacent atoms, leaving group
/// syntax intact.
fn placehold_joiners(s: &str) -> String {
    let tokens = tokenize(s);
    let mut out = String::with_capacity(s.len() * 2);
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Atom(text) => {
                out.push_str(text);
                match tokens.get(i + 1) {
                    // Whitespace runs stay contiguous so they merge into one blank.
                    Some(Token::Atom(next)) if is_blank(text) && is_blank(next) => {}
                    Some(Token::Atom(_)) => out.push(JOINER_MARK),
                    _ => {}
                }
            }
            Token::Syntax(text) => out.push_str(text),
        }
    }
    out
}

fn is_blank(atom: &str) -> bool {
    !atom.is_empty() && atom.chars().all(char::is_whitespace)
}

fn merge_blanks(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    let mut in_blank = false;
    for ch in s.chars() {
        if !escaped && ch.is_whitespace() {
            if !in_blank {
                out.push_str(r"[\s]+");
                in_blank = true;
            }
            continue;
        }
        in_blank = false;
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        }
        out.push(ch);
    }
    out
}

fn escape_class_char(ch: char) -> String {
    if ch.is_control() {
        format!(r"\x{{{:X}}}", ch as u32)
    } else {
        regex::escape(ch.encode_utf8(&mut [0u8; 4]))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pattern.rs"]
mod tests;
