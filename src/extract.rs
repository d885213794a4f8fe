//! Turns a region's transcription into structured widget fields.
//!
//! Every field is derived independently from the same text, so a garbled
//! value never prevents the title or trend from being read.

use crate::tables::{ExtractionTables, ValueKind};
use crate::widget::{Category, Trend, UNKNOWN_WIDGET};

/// One numeric reading found in the text, e.g. `75%` or `6.2 GB`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub kind: ValueKind,
    /// Parsed leading number, used for ordering
    pub number: f64,
    /// Display form: `75%`, `6.2 GB`, `42`
    pub text: String,
}

impl MetricValue {
    /// Returns `None` unless `number` parses to a finite value.
    pub fn new(kind: ValueKind, number: &str, unit: Option<&str>) -> Option<Self> {
        let parsed: f64 = number.parse().ok()?;
        if !parsed.is_finite() {
            return None;
        }

        let text = match (kind, unit) {
            (ValueKind::Percentage, _) => format!("{}%", number),
            (_, Some(unit)) => format!("{} {}", number, unit),
            (_, None) => number.to_string(),
        };

        Some(Self {
            kind,
            number: parsed,
            text,
        })
    }
}

/// Min/max/current assignment. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricValues {
    pub min: String,
    pub max: String,
    pub current: String,
}

/// All fields read from one transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetFields {
    pub widget_name: String,
    pub category: Category,
    pub values: MetricValues,
    pub trend: Trend,
    pub timestamp: String,
}

pub fn extract_fields(text: &str, fallback: Category, tables: &ExtractionTables) -> WidgetFields {
    let widget_name = extract_title(text, tables);
    let category = classify_category(text, &widget_name, fallback, tables);
    let values = assign_values(&extract_values(text, tables));

    WidgetFields {
        category,
        values,
        trend: detect_trend(text, tables),
        timestamp: extract_timestamp(text, tables),
        widget_name,
    }
}

/// Picks a panel title.
///
/// In order: a known title contained in any line; a 4-49 char line that
/// doesn't start with a digit or symbol and contains a widget word; any line
/// longer than 2 chars that isn't just a number; otherwise `Unknown Widget`.
pub fn extract_title(text: &str, tables: &ExtractionTables) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    for line in &lines {
        let lower = line.to_lowercase();
        if let Some(title) = tables
            .known_titles
            .iter()
            .find(|t| lower.contains(&t.to_lowercase()))
        {
            return title.to_string();
        }
    }

    for line in &lines {
        let len = line.chars().count();
        if len <= 3 || len >= 50 || tables.leading_symbol.is_match(line) {
            continue;
        }
        let lower = line.to_lowercase();
        if tables.widget_words.iter().any(|w| lower.contains(w)) {
            return line.to_string();
        }
    }

    lines
        .iter()
        .find(|l| !tables.leading_numeric.is_match(l) && l.chars().count() > 2)
        .map(|l| l.to_string())
        .unwrap_or_else(|| UNKNOWN_WIDGET.to_string())
}

/// First category whose keyword occurs in `text` or `title`, else `fallback`.
pub fn classify_category(
    text: &str,
    title: &str,
    fallback: Category,
    tables: &ExtractionTables,
) -> Category {
    let haystack = format!("{} {}", text, title).to_lowercase();

    tables
        .categories
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k)))
        .map(|rule| rule.category)
        .unwrap_or(fallback)
}

/// Collects numeric readings family by family, in order of appearance.
///
/// A match that overlaps one already taken by an earlier family is skipped,
/// so `75%` yields one percentage and not also the bare number `75`.
pub fn extract_values(text: &str, tables: &ExtractionTables) -> Vec<MetricValue> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut values = Vec::new();

    for family in &tables.values {
        for caps in family.pattern.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let (start, end) = (whole.start(), whole.end());
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }

            let unit = caps.get(2).map(|m| m.as_str());
            if let Some(value) = MetricValue::new(family.kind, number.as_str(), unit) {
                claimed.push((start, end));
                values.push(value);
            }
        }
    }

    values
}

/// Assigns min/max/current from the readings.
///
/// One reading is the current value. With three or more, min and max are the
/// extremes by number and current is the last reading collected. Exactly two
/// readings are ambiguous and leave every field empty.
pub fn assign_values(values: &[MetricValue]) -> MetricValues {
    match values {
        [] | [_, _] => MetricValues::default(),
        [only] => MetricValues {
            current: only.text.clone(),
            ..MetricValues::default()
        },
        [.., last] => {
            let mut sorted: Vec<&MetricValue> = values.iter().collect();
            sorted.sort_by(|a, b| a.number.total_cmp(&b.number));

            MetricValues {
                min: sorted.first().map(|v| v.text.clone()).unwrap_or_default(),
                max: sorted.last().map(|v| v.text.clone()).unwrap_or_default(),
                current: last.text.clone(),
            }
        }
    }
}

pub fn detect_trend(text: &str, tables: &ExtractionTables) -> Trend {
    let lower = text.to_lowercase();
    tables
        .trends
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.trend)
        .unwrap_or_default()
}

/// First time of day in the text, e.g. `10:30 PM`, or empty.
pub fn extract_timestamp(text: &str, tables: &ExtractionTables) -> String {
    for pattern in &tables.time_patterns {
        if let Some(caps) = pattern.captures(text) {
            let parts: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
            return parts.join(" ").trim().to_string();
        }
    }
    String::new()
}
