use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{EachInfo, FilterInfo, Matcher, RunStats, Verdict};
use crate::error::{MarkError, RangeRejection};

/// Character range authored by the caller. Bounds that are missing or not
/// numeric deserialize to `None` and are rejected when wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeSpec {
    #[serde(default, deserialize_with = "lenient_int")]
    pub start: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub length: Option<i64>,
}

impl RangeSpec {
    pub fn new(start: i64, length: i64) -> Self {
        Self {
            start: Some(start),
            length: Some(length),
        }
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Reads a range list. Anything but an array of objects is
/// `ConfigurationInvalid`.
pub fn parse_ranges(value: &Value) -> Result<Vec<RangeSpec>, MarkError> {
    let items = value.as_array().ok_or_else(|| {
        MarkError::ConfigurationInvalid("ranges must be an array of objects".to_string())
    })?;
    if !items.iter().all(Value::is_object) {
        return Err(MarkError::ConfigurationInvalid(
            "ranges must be an array of objects".to_string(),
        ));
    }
    items
        .iter()
        .map(|item| RangeSpec::deserialize(item).map_err(MarkError::from))
        .collect()
}

/// Options of one range run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeRun {
    /// Accept ranges that overlap earlier ones (nested markers).
    pub wrap_all: bool,
    /// Text length, in chars, the ranges were authored against.
    pub authored_length: Option<usize>,
}

impl Matcher<'_> {
    /// Wraps character ranges of the virtual string.
    pub fn wrap_ranges(&mut self, ranges: &[RangeSpec], run: RangeRun) -> RunStats {
        self.cache.reset_hints();
        let value = std::mem::take(&mut self.cache.value);
        let stats = self.wrap_ranges_in(&value, ranges, run);
        self.cache.value = value;
        stats
    }

    fn wrap_ranges_in(&mut self, value: &str, ranges: &[RangeSpec], run: RangeRun) -> RunStats {
        let mut stats = RunStats::default();

        // Byte offset of every char position, plus the end.
        let offsets: Vec<usize> = value
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(value.len()))
            .collect();
        let max = (offsets.len() - 1) as i64;
        let shift = run.authored_length.map_or(0, |len| len as i64 - max);

        let mut valid = Vec::with_capacity(ranges.len());
        for range in ranges {
            match (range.start, range.length) {
                (Some(start), Some(length)) if start >= 0 && length > 0 => {
                    valid.push((*range, start, length))
                }
                _ => self.reject(range, RangeRejection::BadBounds),
            }
        }
        valid.sort_by_key(|(_, start, _)| *start);

        let mut last_end = 0i64;
        for (range, start, length) in valid {
            let start = start.saturating_sub(shift).min(max);
            let mut end = start.saturating_add(length);
            if end > max {
                tracing::debug!(start, end, max, "clipping range to text length");
                end = max;
            }
            if start < 0 || end <= start {
                self.reject(&range, RangeRejection::OutOfBounds);
                continue;
            }
            if !run.wrap_all && start < last_end {
                self.reject(&range, RangeRejection::Overlap);
                continue;
            }

            let (byte_start, byte_end) = (offsets[start as usize], offsets[end as usize]);
            let text = &value[byte_start..byte_end];
            if text.trim().is_empty() {
                self.reject(&range, RangeRejection::WhitespaceOnly);
                continue;
            }
            let Some(unit) = self.cache.owner_at(byte_start, byte_end) else {
                self.reject(&range, RangeRejection::OutOfBounds);
                continue;
            };
            last_end = end;

            let info = FilterInfo {
                match_text: text,
                span: (byte_start, byte_end),
                candidate: (byte_start, byte_end),
                match_start: true,
                group_index: 0,
                term: None,
            };
            match self.handler.filter(self.doc, unit, text, &info) {
                Verdict::Mark => {}
                Verdict::Skip => continue,
                Verdict::Abort => {
                    stats.aborted = true;
                    break;
                }
            }

            let markers = self
                .cache
                .wrap_span(self.doc, byte_start, byte_end, self.template);
            if markers.is_empty() {
                continue;
            }
            stats.matches += 1;
            for (k, &marker) in markers.iter().enumerate() {
                stats.marked += 1;
                let each = EachInfo {
                    match_start: k == 0,
                    group_index: 0,
                    term: None,
                    count: stats.matches,
                };
                self.handler.each(self.doc, marker, &each);
            }
        }

        stats
    }

    fn reject(&mut self, range: &RangeSpec, reason: RangeRejection) {
        tracing::debug!(start = ?range.start, length = ?range.length, reason = %reason, "range rejected");
        self.handler.range_rejected(range, reason);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ranges.rs"]
mod tests;
