//! Chart-ready projections of the derived views.
//!
//! The rendering layer consumes [`ChartData`] plus the static option presets
//! defined here. Colours and legend placement are fixed display data.

use super::aggregator::{
    age_binned_outcome, recovery_outcome, survival_rate_by_class_tier, survival_rate_by_sex,
    survival_split,
};
use crate::models::{ChartData, ChartDataset, Record};
use serde::Serialize;

const SURVIVED_COLOR: &str = "#41B883";
const DIED_COLOR: &str = "#E46651";
const CLASS_RATE_COLOR: &str = "#f87979";
const FEMALE_COLOR: &str = "#36A2EB";
const MALE_COLOR: &str = "#FF6384";
const BODY_FOUND_COLOR: &str = "#FF9F40";
const BODY_NOT_FOUND_COLOR: &str = "#C9CBCF";
const GRID_COLOR: &str = "#f5f5f5";

const RATE_LABEL: &str = "Survival Rate (%)";

/// Doughnut chart of survivors vs non-survivors.
pub fn survival_split_chart(records: &[Record]) -> ChartData {
    if records.is_empty() {
        return ChartData::default();
    }
    let split = survival_split(records);

    ChartData {
        labels: strings(&["Survived", "Did Not Survive"]),
        datasets: vec![ChartDataset {
            label: None,
            background_color: strings(&[SURVIVED_COLOR, DIED_COLOR]),
            data: vec![split.survived as f64, split.not_survived as f64],
        }],
    }
}

/// Bar chart of survival rate per ticket class.
pub fn class_survival_chart(records: &[Record]) -> ChartData {
    if records.is_empty() {
        return ChartData::default();
    }
    let rates = survival_rate_by_class_tier(records);

    ChartData {
        labels: rates.iter().map(|r| format!("Class {}", r.tier)).collect(),
        datasets: vec![ChartDataset {
            label: Some(RATE_LABEL.to_string()),
            background_color: strings(&[CLASS_RATE_COLOR]),
            data: rates.iter().map(|r| r.rate).collect(),
        }],
    }
}

/// Bar chart of survival rate for female and male passengers.
pub fn sex_survival_chart(records: &[Record]) -> ChartData {
    if records.is_empty() {
        return ChartData::default();
    }
    let rates = survival_rate_by_sex(records);

    ChartData {
        labels: rates.iter().map(|r| r.sex.to_string()).collect(),
        datasets: vec![ChartDataset {
            label: Some(RATE_LABEL.to_string()),
            background_color: strings(&[FEMALE_COLOR, MALE_COLOR]),
            data: rates.iter().map(|r| r.rate).collect(),
        }],
    }
}

/// Stacked bar chart of outcomes per age bin.
pub fn age_distribution_chart(records: &[Record]) -> ChartData {
    if records.is_empty() {
        return ChartData::default();
    }
    let bins = age_binned_outcome(records);

    ChartData {
        labels: bins.iter().map(|b| b.label()).collect(),
        datasets: vec![
            ChartDataset {
                label: Some("Survived".to_string()),
                background_color: strings(&[SURVIVED_COLOR]),
                data: bins.iter().map(|b| b.survived as f64).collect(),
            },
            ChartDataset {
                label: Some("Died".to_string()),
                background_color: strings(&[DIED_COLOR]),
                data: bins.iter().map(|b| b.died as f64).collect(),
            },
        ],
    }
}

/// Doughnut chart of body recovery among non-survivors.
pub fn recovery_chart(records: &[Record]) -> ChartData {
    if records.is_empty() {
        return ChartData::default();
    }
    let outcome = recovery_outcome(records);

    ChartData {
        labels: strings(&["Body Found", "Body Not Found"]),
        datasets: vec![ChartDataset {
            label: None,
            background_color: strings(&[BODY_FOUND_COLOR, BODY_NOT_FOUND_COLOR]),
            data: vec![outcome.recovered as f64, outcome.not_recovered as f64],
        }],
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Where a chart legend is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
}

/// Legend presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendOptions {
    pub display: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<LegendPosition>,
    pub use_point_style: bool,
    pub font_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
}

/// One chart axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisOptions {
    pub grid_display: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_color: Option<String>,
    pub tick_font_size: u32,
    pub begin_at_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Cartesian scales for bar charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleOptions {
    pub x: AxisOptions,
    pub y: AxisOptions,
}

/// Static display configuration of one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub legend: LegendOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scales: Option<ScaleOptions>,
}

impl ChartOptions {
    /// Options for the doughnut charts.
    pub fn doughnut() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            legend: LegendOptions {
                display: true,
                position: Some(LegendPosition::Bottom),
                use_point_style: true,
                font_size: 12,
                padding: Some(20),
            },
            scales: None,
        }
    }

    /// Options for the percentage bar charts (class and sex).
    pub fn rate_bar() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            legend: hidden_legend(),
            scales: Some(bar_scales(Some(100.0))),
        }
    }

    /// Options for the age distribution chart.
    pub fn age_distribution() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            legend: LegendOptions {
                display: true,
                position: Some(LegendPosition::Top),
                use_point_style: true,
                font_size: 12,
                padding: None,
            },
            scales: Some(bar_scales(None)),
        }
    }
}

fn hidden_legend() -> LegendOptions {
    LegendOptions {
        display: false,
        position: None,
        use_point_style: false,
        font_size: 12,
        padding: None,
    }
}

fn bar_scales(y_max: Option<f64>) -> ScaleOptions {
    ScaleOptions {
        x: AxisOptions {
            grid_display: false,
            grid_color: None,
            tick_font_size: 11,
            begin_at_zero: false,
            max: None,
        },
        y: AxisOptions {
            grid_display: true,
            grid_color: Some(GRID_COLOR.to_string()),
            tick_font_size: 11,
            begin_at_zero: true,
            max: y_max,
        },
    }
}

/// A chart together with its display options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

/// Every dashboard chart, in display order.
pub fn dashboard_charts(records: &[Record]) -> Vec<Chart> {
    vec![
        Chart {
            title: "Survival Rate".to_string(),
            data: survival_split_chart(records),
            options: ChartOptions::doughnut(),
        },
        Chart {
            title: "Survival by Class".to_string(),
            data: class_survival_chart(records),
            options: ChartOptions::rate_bar(),
        },
        Chart {
            title: "Survival by Sex".to_string(),
            data: sex_survival_chart(records),
            options: ChartOptions::rate_bar(),
        },
        Chart {
            title: "Age Distribution".to_string(),
            data: age_distribution_chart(records),
            options: ChartOptions::age_distribution(),
        },
        Chart {
            title: "Body Recovery".to_string(),
            data: recovery_chart(records),
            options: ChartOptions::doughnut(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn records() -> Vec<Record> {
        vec![
            Record {
                outcome: true,
                class_tier: Some(1),
                sex: Some(Sex::Female),
                age: Some(29.0),
                body_recovered: None,
            },
            Record {
                outcome: false,
                class_tier: Some(3),
                sex: Some(Sex::Male),
                age: Some(22.0),
                body_recovered: Some(7),
            },
        ]
    }

    #[test]
    fn test_empty_records_project_to_empty_charts() {
        for chart in dashboard_charts(&[]) {
            assert!(chart.data.is_empty(), "{} should be empty", chart.title);
        }
    }

    #[test]
    fn test_labels_align_with_data() {
        for chart in dashboard_charts(&records()) {
            for dataset in &chart.data.datasets {
                assert_eq!(
                    dataset.data.len(),
                    chart.data.labels.len(),
                    "misaligned series in {}",
                    chart.title
                );
                assert!(!dataset.background_color.is_empty());
            }
        }
    }

    #[test]
    fn test_class_chart_labels() {
        let chart = class_survival_chart(&records());
        assert_eq!(chart.labels, vec!["Class 1", "Class 3"]);
        assert_eq!(chart.datasets[0].data, vec![100.0, 0.0]);
        assert_eq!(chart.datasets[0].label.as_deref(), Some(RATE_LABEL));
    }

    #[test]
    fn test_sex_chart_labels_fixed() {
        let chart = sex_survival_chart(&records());
        assert_eq!(chart.labels, vec!["Female", "Male"]);
    }

    #[test]
    fn test_age_chart_has_two_series() {
        let chart = age_distribution_chart(&records());
        assert_eq!(chart.labels.len(), 8);
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].label.as_deref(), Some("Survived"));
        assert_eq!(chart.datasets[1].label.as_deref(), Some("Died"));
    }

    #[test]
    fn test_option_presets_well_formed() {
        let doughnut = ChartOptions::doughnut();
        assert!(doughnut.legend.display);
        assert_eq!(doughnut.legend.position, Some(LegendPosition::Bottom));
        assert!(doughnut.scales.is_none());

        let rate = ChartOptions::rate_bar();
        assert!(!rate.legend.display);
        let scales = rate.scales.unwrap();
        assert_eq!(scales.y.max, Some(100.0));
        assert!(scales.y.begin_at_zero);
        assert_eq!(scales.y.grid_color.as_deref(), Some(GRID_COLOR));

        let age = ChartOptions::age_distribution();
        assert_eq!(age.legend.position, Some(LegendPosition::Top));
        assert_eq!(age.scales.unwrap().y.max, None);
    }

    #[test]
    fn test_options_serialize() {
        let json = serde_json::to_string(&ChartOptions::doughnut()).unwrap();
        assert!(json.contains("\"position\":\"bottom\""));
    }
}
