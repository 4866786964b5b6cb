//! Data models for the dashboard core.
//!
//! This module contains the core data structures shared by the dataset
//! aggregator and the annotation manager: passenger records, the dataset
//! snapshot, annotations, and the chart-ready shapes handed to renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A loosely-typed row as delivered by a tabular source.
pub type RawRow = Map<String, Value>;

/// Passenger sex as recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "Female"),
            Sex::Male => write!(f, "Male"),
        }
    }
}

impl Sex {
    /// Fixed category order used by every sex-keyed view.
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    /// Parses a loosely-typed sex value. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "female" => Some(Sex::Female),
            "male" => Some(Sex::Male),
            _ => None,
        }
    }
}

/// One validated passenger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Whether the passenger survived.
    pub outcome: bool,
    /// Ticket class (1, 2, 3, ...). Absent when the source value was unusable.
    pub class_tier: Option<i64>,
    /// Passenger sex.
    pub sex: Option<Sex>,
    /// Age in years.
    pub age: Option<f64>,
    /// Body identification number, present when the body was recovered.
    pub body_recovered: Option<i64>,
}

impl Record {
    /// Builds a record from a loosely-typed source row.
    ///
    /// Returns `None` when the row has no usable `survived` value; such rows
    /// are dropped silently by the loader.
    pub fn from_row(row: &RawRow) -> Option<Self> {
        let outcome = row.get("survived").and_then(coerce_bool)?;

        Some(Self {
            outcome,
            class_tier: row.get("pclass").and_then(coerce_int),
            sex: row.get("sex").and_then(Value::as_str).and_then(Sex::parse),
            age: row.get("age").and_then(coerce_float),
            body_recovered: row.get("body").and_then(coerce_int),
        })
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| !x.is_nan())
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|x| x.fract() == 0.0).map(|x| x as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// The loaded record set plus its readiness flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Valid records in source order.
    pub records: Vec<Record>,
    /// True until the one-shot load has completed or failed.
    pub is_loading: bool,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            is_loading: true,
        }
    }
}

impl Dataset {
    /// A dataset whose load has finished with the given records.
    pub fn loaded(records: Vec<Record>) -> Self {
        Self {
            records,
            is_loading: false,
        }
    }
}

/// A user-authored note attached to one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique, creation-time-derived identifier.
    pub id: String,
    /// Dashboard this note belongs to.
    pub dashboard_id: String,
    /// Committed text.
    pub text: String,
    /// Whether the note is being edited.
    pub is_editing: bool,
    /// Unsaved edit text. Equal to `text` unless `is_editing` is set.
    pub draft_text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    /// Creates a note in the viewing state.
    pub fn new(id: String, dashboard_id: String, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            dashboard_id,
            draft_text: text.clone(),
            text,
            is_editing: false,
            created_at,
        }
    }
}

/// One data series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    /// Legend label of the series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// One colour per data point, or a single colour for the whole series.
    pub background_color: Vec<String>,
    /// Values aligned with the chart labels.
    pub data: Vec<f64>,
}

/// Label/value structure consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartData {
    /// True when the chart carries no labels and no series.
    #[allow(dead_code)] // Utility for renderers
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.datasets.is_empty()
    }
}
