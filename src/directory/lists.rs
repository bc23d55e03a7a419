//! Unit, quiz and department lists used to populate the filters

use crate::{ReportError, Result};
use serde::Serialize;
use serde_json::Value;

/// A quiz/test the report can be requested for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizInfo {
    pub id: String,
    pub name: String,
}

/// `{status: "success", units: {region: [unit, ...]}}` -> sorted, de-duplicated units
pub fn parse_unit_list(response: &Value) -> Result<Vec<String>> {
    require_success(response, "unit list")?;

    let mut units: Vec<String> = match response.get("units") {
        Some(Value::Object(regions)) => regions
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(unit_name)
            .collect(),
        Some(Value::Array(flat)) => flat.iter().filter_map(unit_name).collect(),
        _ => {
            return Err(ReportError::DataFormat(
                "unit list response has no 'units' collection".to_string(),
            ))
        }
    };
    units.sort();
    units.dedup();
    Ok(units)
}

/// Bare `[{quiz_id, quiz_name}, ...]`; entries without an id are dropped
pub fn parse_quiz_list(response: &Value) -> Result<Vec<QuizInfo>> {
    let entries = response.as_array().ok_or_else(|| {
        ReportError::DataFormat("quiz list response must be a JSON array".to_string())
    })?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = match entry.get("quiz_id")? {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let name = entry
                .get("quiz_name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| id.clone());
            Some(QuizInfo { id, name })
        })
        .collect())
}

/// `{status: "success", department: [...]}`
pub fn parse_department_list(response: &Value) -> Result<Vec<String>> {
    require_success(response, "department list")?;
    let departments = response
        .get("department")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ReportError::DataFormat("department list response has no 'department' list".to_string())
        })?;
    Ok(departments.iter().filter_map(unit_name).collect())
}

/// Quiz by exact name, then by id
pub fn find_quiz<'a>(quizzes: &'a [QuizInfo], needle: &str) -> Option<&'a QuizInfo> {
    quizzes
        .iter()
        .find(|quiz| quiz.name == needle)
        .or_else(|| quizzes.iter().find(|quiz| quiz.id == needle))
}

fn require_success(response: &Value, what: &str) -> Result<()> {
    match response.get("status").and_then(Value::as_str) {
        Some("success") => Ok(()),
        _ => {
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("status is not 'success'");
            Err(ReportError::DataFormat(format!("{}: {}", what, message)))
        }
    }
}

fn unit_name(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
