use compact_str::CompactString;

use super::Element;

/// Compound selector: optional tag, `#id`, `.class` and `[attr]` parts,
/// e.g. `div.note`, `#main`, `span[data-skip]`. `*` matches any element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<CompactString>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<String>,
}

impl Selector {
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }

        let mut selector = Selector::default();
        let mut rest = source;

        let tag_len = rest
            .find(|c: char| matches!(c, '.' | '#' | '['))
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        if !tag.is_empty() && tag != "*" {
            selector.tag = Some(CompactString::new(tag.to_ascii_lowercase()));
        }
        rest = &rest[tag_len..];

        while let Some(prefix) = rest.chars().next() {
            rest = &rest[prefix.len_utf8()..];
            match prefix {
                '[' => {
                    let close = rest.find(']')?;
                    let name = rest[..close].trim();
                    if name.is_empty() {
                        return None;
                    }
                    selector.attrs.push(name.to_ascii_lowercase());
                    rest = &rest[close + 1..];
                }
                '.' | '#' => {
                    let len = rest
                        .find(|c: char| matches!(c, '.' | '#' | '['))
                        .unwrap_or(rest.len());
                    let name = &rest[..len];
                    if name.is_empty() {
                        return None;
                    }
                    if prefix == '.' {
                        selector.classes.push(name.to_string());
                    } else {
                        selector.id = Some(name.to_string());
                    }
                    rest = &rest[len..];
                }
                _ => return None,
            }
        }

        Some(selector)
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|attr| element.attr(attr).is_some())
    }
}
