//! Markdown and JSON report generation.
//!
//! This module turns the dataset store's derived views into a readable
//! Markdown report or a chart-ready JSON document, and renders annotation
//! listings for the `note` commands.

use crate::analysis::{AgeBin, Chart, RecoveryOutcome, SexRate, SurvivalSplit, TierRate};
use crate::dataset::DatasetStore;
use crate::models::Annotation;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Everything the dashboard shows, computed from one loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Where the rows came from.
    pub source: String,
    /// Number of valid records.
    pub record_count: usize,
    pub survival: SurvivalSplit,
    pub class_rates: Vec<TierRate>,
    pub sex_rates: Vec<SexRate>,
    pub age_bins: Vec<AgeBin>,
    pub recovery: RecoveryOutcome,
    /// Chart-ready projections with display options.
    pub charts: Vec<Chart>,
}

impl StatsReport {
    /// Snapshot every derived view of the store.
    pub fn from_store(store: &DatasetStore, source: &str) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.to_string(),
            record_count: store.snapshot().records.len(),
            survival: store.survival_split(),
            class_rates: store.survival_rate_by_class_tier(),
            sex_rates: store.survival_rate_by_sex(),
            age_bins: store.age_binned_outcome(),
            recovery: store.recovery_outcome(),
            charts: store.charts(),
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &StatsReport) -> String {
    let mut output = String::new();

    output.push_str("# Passenger Survival Dashboard\n\n");
    output.push_str(&generate_metadata_section(report));

    if report.record_count == 0 {
        output.push_str("No passenger records were loaded.\n\n");
        return output;
    }

    output.push_str(&generate_survival_section(&report.survival));
    output.push_str(&generate_class_section(&report.class_rates));
    output.push_str(&generate_sex_section(&report.sex_rates));
    output.push_str(&generate_age_section(&report.age_bins));
    output.push_str(&generate_recovery_section(&report.recovery));

    output
}

fn generate_metadata_section(report: &StatsReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", report.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n\n", report.record_count));

    section
}

fn generate_survival_section(split: &SurvivalSplit) -> String {
    let mut section = String::new();

    section.push_str("## Survival\n\n");
    section.push_str("| Survived | Did Not Survive |\n");
    section.push_str("|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} |\n\n",
        split.survived, split.not_survived
    ));

    section
}

fn generate_class_section(rates: &[TierRate]) -> String {
    let mut section = String::new();

    section.push_str("## Survival Rate by Class\n\n");
    section.push_str("| Class | Survival Rate |\n");
    section.push_str("|:---|:---:|\n");
    for rate in rates {
        section.push_str(&format!(
            "| Class {} | {} |\n",
            rate.tier,
            format_rate(rate.rate)
        ));
    }
    section.push('\n');

    section
}

fn generate_sex_section(rates: &[SexRate]) -> String {
    let mut section = String::new();

    section.push_str("## Survival Rate by Sex\n\n");
    section.push_str("| Sex | Survived | Total | Survival Rate |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for rate in rates {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            rate.sex,
            rate.survived,
            rate.total,
            format_rate(rate.rate)
        ));
    }
    section.push('\n');

    section
}

fn generate_age_section(bins: &[AgeBin]) -> String {
    let mut section = String::new();

    section.push_str("## Age Distribution\n\n");
    section.push_str("| Age | Survived | Died |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for bin in bins {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            bin.label(),
            bin.survived,
            bin.died
        ));
    }
    section.push('\n');

    section
}

fn generate_recovery_section(recovery: &RecoveryOutcome) -> String {
    let mut section = String::new();

    section.push_str("## Body Recovery (non-survivors)\n\n");
    section.push_str("| Body Found | Body Not Found |\n");
    section.push_str("|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} |\n\n",
        recovery.recovered, recovery.not_recovered
    ));

    section
}

/// Format a percentage, printing `n/a` for an empty category.
fn format_rate(rate: f64) -> String {
    if rate.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.1}%", rate)
    }
}

/// Generate a JSON report.
///
/// `NaN` rates are written as `null`.
pub fn generate_json_report(report: &StatsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a generated report to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

/// Render a list of notes for the terminal.
pub fn generate_notes_listing(notes: &[&Annotation]) -> String {
    if notes.is_empty() {
        return "No notes.\n".to_string();
    }

    let mut listing = String::new();

    for note in notes {
        let marker = if note.is_editing { " (editing)" } else { "" };
        listing.push_str(&format!(
            "[{}] {} {}{}\n",
            note.id,
            note.dashboard_id,
            note.created_at.format("%Y-%m-%d %H:%M"),
            marker
        ));
        listing.push_str(&format!("    {}\n", note.text));
        if note.is_editing && note.draft_text != note.text {
            listing.push_str(&format!("    draft: {}\n", note.draft_text));
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    async fn loaded_store(rows: serde_json::Value) -> DatasetStore {
        let store = DatasetStore::new(Arc::new(MemoryStorage::new()));
        store
            .load(StaticSource::from_value(rows).unwrap())
            .unwrap()
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_generate_markdown_report() {
        let store = loaded_store(json!([
            { "survived": 1, "pclass": 1, "sex": "female", "age": 29, "body": null },
            { "survived": 0, "pclass": 3, "sex": "male", "age": 22, "body": 7 }
        ]))
        .await;
        let report = StatsReport::from_store(&store, "test.json");
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Passenger Survival Dashboard"));
        assert!(markdown.contains("- **Records:** 2"));
        assert!(markdown.contains("| Class 1 | 100.0% |"));
        assert!(markdown.contains("| Class 3 | 0.0% |"));
        assert!(markdown.contains("| 21-30 | 1 | 1 |"));
        assert!(markdown.contains("| 1 | 0 |"));
    }

    #[tokio::test]
    async fn test_markdown_marks_empty_category() {
        let store = loaded_store(json!([{ "survived": 1, "pclass": 2, "sex": "male" }])).await;
        let markdown = generate_markdown_report(&StatsReport::from_store(&store, "t"));

        assert!(markdown.contains("| Female | 0 | 0 | n/a |"));
        assert!(markdown.contains("| Male | 1 | 1 | 100.0% |"));
    }

    #[tokio::test]
    async fn test_empty_dataset_report() {
        let store = loaded_store(json!([])).await;
        let report = StatsReport::from_store(&store, "empty.json");

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No passenger records were loaded."));

        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"record_count\": 0"));
    }

    #[tokio::test]
    async fn test_json_report_nan_is_null() {
        let store = loaded_store(json!([{ "survived": 0, "pclass": 1, "sex": "male" }])).await;
        let json = generate_json_report(&StatsReport::from_store(&store, "t")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["sex_rates"][0]["rate"].is_null());
        assert_eq!(value["charts"].as_array().unwrap().len(), 5);
        assert_eq!(value["charts"][0]["options"]["legend"]["position"], "bottom");
    }

    #[test]
    fn test_notes_listing() {
        let mut note = Annotation::new(
            "42".to_string(),
            "overview".to_string(),
            "Check class 3".to_string(),
            Utc::now(),
        );
        assert!(generate_notes_listing(&[]).contains("No notes."));

        let listing = generate_notes_listing(&[&note]);
        assert!(listing.contains("[42] overview"));
        assert!(listing.contains("Check class 3"));

        note.is_editing = true;
        note.draft_text = "Check class 2".to_string();
        let listing = generate_notes_listing(&[&note]);
        assert!(listing.contains("(editing)"));
        assert!(listing.contains("draft: Check class 2"));
    }
}
