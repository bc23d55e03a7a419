//! Skillgrid: competency score reports
//!
//! This library turns the nested competency/quiz score payloads of the report
//! analytics backend into flat, sortable rows, and exports them to
//! spreadsheets with a legend block.

pub mod abbrev;
pub mod aggregate;
pub mod client;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod export;
pub mod reporter;
pub mod screen;
pub mod view;

pub use error::{ReportError, Result};
pub use screen::ScreenKind;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Placeholder shown for "no score"
pub const PLACEHOLDER: &str = "-";

/// A single displayed score value.
///
/// The backend sends numbers, numeric strings, the literal `"-"`, null, or
/// nothing at all. Everything that is not a real value collapses to
/// `Missing`; present values keep the exact text that is displayed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScoreCell {
    #[default]
    Missing,
    Present(String),
}

impl ScoreCell {
    /// Read a leaf field from the report tree
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == PLACEHOLDER {
                    ScoreCell::Missing
                } else {
                    ScoreCell::Present(trimmed.to_string())
                }
            }
            Some(serde_json::Value::Number(n)) => ScoreCell::Present(n.to_string()),
            _ => ScoreCell::Missing,
        }
    }

    /// Arithmetic mean with two decimals, or `Missing` when nothing contributed
    pub fn from_mean(sum: f64, count: usize) -> Self {
        if count == 0 {
            ScoreCell::Missing
        } else {
            ScoreCell::Present(format!("{:.2}", sum / count as f64))
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ScoreCell::Present(_))
    }

    /// Text as displayed in the table and the workbook
    pub fn display(&self) -> &str {
        match self {
            ScoreCell::Missing => PLACEHOLDER,
            ScoreCell::Present(s) => s,
        }
    }

    /// Numeric value for totals and ordering; placeholders count as zero
    pub fn numeric_or_zero(&self) -> f64 {
        match self {
            ScoreCell::Missing => 0.0,
            ScoreCell::Present(s) => parse_number(s).unwrap_or(0.0),
        }
    }
}

impl Serialize for ScoreCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display())
    }
}

/// Parse a finite number out of backend text
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce an arbitrary JSON value to a number, zero when not numeric
pub fn json_number_or_zero(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Whole numbers print without decimals ("8"), others as-is ("7.5")
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Scores for one competency/topic column within a row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyScore {
    /// Score (direct value or unit average)
    pub average: ScoreCell,
    /// MH percentile
    pub percentile: ScoreCell,
    /// Unit percentile, only on screens that show it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_percentile: Option<ScoreCell>,
}

/// Maximum achievable score for a column, with the label shown in headers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxScore {
    pub value: f64,
    pub label: String,
}

impl MaxScore {
    /// Summed directory marks: whole numbers print bare ("8")
    pub fn summed(value: f64) -> Self {
        Self {
            value,
            label: format_number(value),
        }
    }

    /// `correct_marks x total_question`: one decimal ("10.0")
    pub fn product(value: f64) -> Self {
        Self {
            value,
            label: format!("{:.1}", value),
        }
    }
}

/// An active competency or topic column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub max_score: MaxScore,
}

/// One flattened table row: a student or a unit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// 1-based position in the list this row belongs to
    pub sno: usize,
    /// Grouping key (student id or unit name)
    pub key: String,
    /// Student name or unit name
    pub name: String,
    pub units: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Column id -> scores, one entry per active column
    pub scores: BTreeMap<String, CompetencyScore>,
    pub total_score: f64,
}

impl Row {
    pub fn score(&self, column_id: &str) -> Option<&CompetencyScore> {
        self.scores.get(column_id)
    }

    pub fn units_label(&self) -> String {
        self.units.join(", ")
    }

    pub fn department_label(&self) -> &str {
        self.department.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn total_label(&self) -> String {
        format!("{:.2}", self.total_score)
    }
}

/// What the report was requested for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    Quiz { id: String, name: String },
    Competency { id: String, name: String },
}

impl Selection {
    pub fn id(&self) -> &str {
        match self {
            Selection::Quiz { id, .. } | Selection::Competency { id, .. } => id,
        }
    }

    /// Human label, used in export file names
    pub fn name(&self) -> &str {
        match self {
            Selection::Quiz { name, .. } | Selection::Competency { name, .. } => name,
        }
    }
}

/// Aggregated rows plus the columns they are shown under
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub screen: ScreenKind,
    pub selection: Selection,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Grand total of the active columns' max scores
    pub fn total_max(&self) -> f64 {
        self.columns.iter().map(|c| c.max_score.value).sum()
    }

    /// "Total Score (Out of N)" value, one decimal
    pub fn total_max_label(&self) -> String {
        format!("{:.1}", self.total_max())
    }
}
