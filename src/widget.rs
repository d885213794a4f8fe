//! Structured widget records.
//!
//! `ExtractedWidget` is what the pipeline produces for one region.
//! `FlatWidgetRecord` is its serialized form, with the exact key set the
//! report, spreadsheet and notification consumers read.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::detect::region::WidgetRegion;

/// Title used when nothing in the transcription looks like a widget name.
pub const UNKNOWN_WIDGET: &str = "Unknown Widget";

/// Closed taxonomy of widget categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Infrastructure,
    #[default]
    System,
    Storage,
    Network,
    Performance,
    Reliability,
    Database,
    Container,
    #[serde(rename = "API")]
    Api,
    Observability,
    Security,
    Application,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Infrastructure,
        Category::System,
        Category::Storage,
        Category::Network,
        Category::Performance,
        Category::Reliability,
        Category::Database,
        Category::Container,
        Category::Api,
        Category::Observability,
        Category::Security,
        Category::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Infrastructure => "Infrastructure",
            Category::System => "System",
            Category::Storage => "Storage",
            Category::Network => "Network",
            Category::Performance => "Performance",
            Category::Reliability => "Reliability",
            Category::Database => "Database",
            Category::Container => "Container",
            Category::Api => "API",
            Category::Observability => "Observability",
            Category::Security => "Security",
            Category::Application => "Application",
        }
    }

    /// Parses a caller-supplied hint, falling back to `System`.
    pub fn from_hint(hint: &str) -> Category {
        hint.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Direction of a metric as read from the panel text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Trend {
    Spiking,
    Rising,
    Falling,
    Stable,
    Critical,
    Normal,
    #[default]
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Spiking => "Spiking",
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::Stable => "Stable",
            Trend::Critical => "Critical",
            Trend::Normal => "Normal",
            Trend::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized dashboard panel.
#[derive(Debug, Clone)]
pub struct ExtractedWidget {
    pub widget_name: String,
    pub category: Category,
    pub min_value: String,
    pub max_value: String,
    pub current_value: String,
    pub trend: Trend,
    /// First `HH:MM[:SS][ AM|PM]` found in the text, or empty
    pub timestamp: String,
    pub comments: String,
    pub raw_text: String,
    /// Inherited from `source_region`
    pub confidence: f32,
    pub source_region: WidgetRegion,
    pub extracted_at: DateTime<Local>,
}

impl ExtractedWidget {
    /// True if the record carries anything beyond OCR noise.
    pub fn is_meaningful(&self) -> bool {
        self.widget_name != UNKNOWN_WIDGET || !self.current_value.is_empty()
    }

    pub fn to_flat(&self) -> FlatWidgetRecord {
        FlatWidgetRecord::from(self)
    }
}

/// Flat mapping handed to downstream consumers. Key names are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatWidgetRecord {
    pub widget_name: String,
    pub category: String,
    pub min: String,
    pub max: String,
    pub current: String,
    pub trend: String,
    pub spike_time: String,
    pub comments: String,
    pub confidence: f32,
    pub raw_text: String,
    pub extracted_at: String,
}

impl From<&ExtractedWidget> for FlatWidgetRecord {
    fn from(widget: &ExtractedWidget) -> Self {
        Self {
            widget_name: widget.widget_name.clone(),
            category: widget.category.to_string(),
            min: widget.min_value.clone(),
            max: widget.max_value.clone(),
            current: widget.current_value.clone(),
            trend: widget.trend.to_string(),
            spike_time: widget.timestamp.clone(),
            comments: widget.comments.clone(),
            confidence: widget.confidence,
            raw_text: widget.raw_text.clone(),
            extracted_at: widget
                .extracted_at
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::region::RegionSource;

    fn sample_widget() -> ExtractedWidget {
        let region = WidgetRegion::new(10, 20, 300, 200, 0.7, RegionSource::Contour, (800, 600))
            .unwrap();
        ExtractedWidget {
            widget_name: "CPU Usage".to_string(),
            category: Category::Infrastructure,
            min_value: String::new(),
            max_value: String::new(),
            current_value: "75%".to_string(),
            trend: Trend::Spiking,
            timestamp: "10:30 PM".to_string(),
            comments: String::new(),
            raw_text: "CPU Usage 75% Spiking 10:30 PM".to_string(),
            confidence: region.confidence,
            source_region: region,
            extracted_at: Local::now(),
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("infrastructure".parse::<Category>().unwrap(), Category::Infrastructure);
        assert_eq!("api".parse::<Category>().unwrap(), Category::Api);
        assert_eq!(" Database ".parse::<Category>().unwrap(), Category::Database);
        assert!("Kubernetes".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_hint_falls_back_to_system() {
        assert_eq!(Category::from_hint("Storage"), Category::Storage);
        assert_eq!(Category::from_hint(""), Category::System);
        assert_eq!(Category::from_hint("whatever"), Category::System);
    }

    #[test]
    fn test_flat_record_key_set() {
        let json = serde_json::to_value(sample_widget().to_flat()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "category",
                "comments",
                "confidence",
                "current",
                "extracted_at",
                "max",
                "min",
                "raw_text",
                "spike_time",
                "trend",
                "widget_name",
            ]
        );
        assert_eq!(json["category"], "Infrastructure");
        assert_eq!(json["trend"], "Spiking");
        assert_eq!(json["spike_time"], "10:30 PM");
    }

    #[test]
    fn test_api_category_serializes_as_api() {
        assert_eq!(serde_json::to_string(&Category::Api).unwrap(), "\"API\"");
        assert_eq!(Category::Api.to_string(), "API");
    }

    #[test]
    fn test_is_meaningful() {
        let mut widget = sample_widget();
        assert!(widget.is_meaningful());

        widget.widget_name = UNKNOWN_WIDGET.to_string();
        assert!(widget.is_meaningful(), "current value alone keeps the record");

        widget.current_value.clear();
        assert!(!widget.is_meaningful());
    }
}
