//! JSON reporter for machine-readable output

use crate::view::{SortDirection, TableView};
use crate::{Column, Row, ScreenKind, Selection};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// The displayed table (after search and sort) as JSON
    pub fn report(&self, view: &TableView) -> String {
        let table = view.table();
        let sort = match (view.sort().key(), view.sort().is_active()) {
            (Some(key), true) => Some(JsonSort {
                key: key.to_string(),
                direction: view.sort().direction(),
            }),
            _ => None,
        };
        let output = JsonOutput {
            screen: table.screen,
            title: table.screen.title(),
            selection: &table.selection,
            total_max: view.total_max_label(),
            columns: &table.columns,
            search: view.search(),
            sort,
            rows: view.displayed_rows(),
        };
        self.encode(&output, "{}")
    }

    /// Any serializable list (units, quizzes, directory entries)
    pub fn report_list<T: Serialize>(&self, items: &[T]) -> String {
        self.encode(&items, "[]")
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|_| fallback.to_string())
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    screen: ScreenKind,
    title: &'static str,
    selection: &'a Selection,
    total_max: String,
    columns: &'a [Column],
    #[serde(skip_serializing_if = "str::is_empty")]
    search: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<JsonSort>,
    rows: Vec<Row>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSort {
    key: String,
    direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SortKey;
    use crate::{CompetencyScore, MaxScore, ReportTable, ScoreCell};
    use std::collections::BTreeMap;

    fn row(sno: usize, name: &str, total: f64) -> Row {
        let mut scores = BTreeMap::new();
        scores.insert(
            "s1".to_string(),
            CompetencyScore {
                average: ScoreCell::Present(format!("{:.2}", total)),
                percentile: ScoreCell::Missing,
                unit_percentile: None,
            },
        );
        Row {
            sno,
            key: name.into(),
            name: name.into(),
            units: vec![name.into()],
            department: None,
            scores,
            total_score: total,
        }
    }

    fn view() -> TableView {
        TableView::new(ReportTable {
            screen: ScreenKind::UnitMain,
            selection: Selection::Quiz {
                id: "q1".into(),
                name: "Baseline".into(),
            },
            columns: vec![Column {
                id: "s1".into(),
                name: "Leadership".into(),
                abbreviation: "L".into(),
                max_score: MaxScore::summed(8.0),
            }],
            rows: vec![row(1, "Pune", 4.0), row(2, "Nagpur", 7.0)],
        })
    }

    #[test]
    fn test_json_output_has_expected_keys() {
        let json = JsonReporter::new().report(&view());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["screen"], "unit-main");
        assert_eq!(parsed["selection"]["kind"], "quiz");
        assert_eq!(parsed["totalMax"], "8.0");
        assert_eq!(parsed["columns"][0]["abbreviation"], "L");
        assert_eq!(parsed["columns"][0]["maxScore"]["label"], "8");
        assert_eq!(parsed["rows"][0]["scores"]["s1"]["percentile"], "-");
        assert!(parsed.get("sort").is_none());
    }

    #[test]
    fn test_json_rows_follow_sort() {
        let mut view = view();
        view.click(SortKey::TotalScore);
        view.click(SortKey::TotalScore);
        let json = JsonReporter::new().report(&view);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["sort"]["key"], "totalScore");
        assert_eq!(parsed["sort"]["direction"], "desc");
        assert_eq!(parsed["rows"][0]["name"], "Nagpur");
        assert_eq!(parsed["rows"][0]["sno"], 1);
    }

    #[test]
    fn test_json_pretty_output() {
        let json = JsonReporter::new().pretty().report(&view());
        assert!(json.contains('\n'), "pretty JSON should have newlines");
    }

    #[test]
    fn test_json_report_list_empty() {
        let json = JsonReporter::new().report_list::<String>(&[]);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.as_array().unwrap().is_empty());
    }
}
