//! JSON export of extracted widgets.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::widget::{ExtractedWidget, FlatWidgetRecord};

/// Flat records for every widget, in order.
pub fn to_flat_records(widgets: &[ExtractedWidget]) -> Vec<FlatWidgetRecord> {
    widgets.iter().map(FlatWidgetRecord::from).collect()
}

pub fn to_json_string(widgets: &[ExtractedWidget]) -> Result<String> {
    serde_json::to_string_pretty(&to_flat_records(widgets))
        .context("Failed to serialize widgets to JSON")
}

/// Export widgets to a JSON file as an array of flat records.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(widgets: &[ExtractedWidget], output_path: &Path) -> Result<()> {
    let json = to_json_string(widgets)?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{RegionSource, WidgetRegion};
    use crate::widget::{Category, Trend};
    use chrono::Local;
    use tempfile::tempdir;

    fn widget(name: &str, current: &str) -> ExtractedWidget {
        let region =
            WidgetRegion::new(0, 0, 100, 80, 0.6, RegionSource::Panel, (640, 480)).unwrap();
        ExtractedWidget {
            widget_name: name.to_string(),
            category: Category::Storage,
            min_value: "10%".to_string(),
            max_value: "90%".to_string(),
            current_value: current.to_string(),
            trend: Trend::Falling,
            timestamp: String::new(),
            comments: String::new(),
            raw_text: format!("{} {}", name, current),
            confidence: region.confidence,
            source_region: region,
            extracted_at: Local::now(),
        }
    }

    #[test]
    fn test_export_to_json() {
        let widgets = vec![widget("Disk Usage", "40%"), widget("Disk Space", "70%")];

        let dir = tempdir().unwrap();
        let path = dir.path().join("widgets.json");

        export_to_json(&widgets, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<FlatWidgetRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].widget_name, "Disk Usage");
        assert_eq!(records[1].current, "70%");
        assert_eq!(records[0].category, "Storage");
        assert!(content.contains("\"trend\": \"Falling\""));
    }

    #[test]
    fn test_export_empty_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");

        export_to_json(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/widgets.json");
        assert!(export_to_json(&[widget("CPU Usage", "5%")], &path).is_err());
    }
}
