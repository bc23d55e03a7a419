//! Competency/topic directory: id -> name, parent competency, abbreviation, max score

mod lists;

pub use lists::{find_quiz, parse_department_list, parse_quiz_list, parse_unit_list, QuizInfo};

use crate::abbrev::abbreviate;
use crate::{json_number_or_zero, MaxScore, ReportError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// One competency or topic definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    /// Parent competency name; `None` for competencies themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competency: Option<String>,
    pub abbreviation: String,
    /// Summed `total_marks` of the underlying topics
    pub max_score: MaxScore,
}

impl DirectoryEntry {
    fn new(id: String, name: String, competency: Option<String>, marks: f64) -> Self {
        let abbreviation = abbreviate(&name);
        Self {
            id,
            name,
            competency,
            abbreviation,
            max_score: MaxScore::summed(marks),
        }
    }
}

/// Normalized directory built from a `getSubCompetency` response.
///
/// Entries keep the order in which the backend listed them. An empty index is
/// a valid state meaning "no columns".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryIndex {
    competencies: Vec<DirectoryEntry>,
    topics: Vec<DirectoryEntry>,
    skipped: usize,
}

impl DirectoryIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from `{status: "success", data: [...]}`.
    ///
    /// Entries whose `quiz_section_id` is neither a one-element list nor a
    /// string are dropped and counted in [`DirectoryIndex::skipped`].
    pub fn from_response(response: &Value) -> Result<Self> {
        let status = response.get("status").and_then(Value::as_str);
        let data = response.get("data").and_then(Value::as_array);
        let entries = match (status, data) {
            (Some("success"), Some(entries)) => entries,
            _ => {
                return Err(ReportError::DataFormat(
                    "directory response must carry status 'success' and a data list".to_string(),
                ))
            }
        };

        let mut index = DirectoryIndex::default();
        let mut seen_competencies = HashSet::new();
        let mut seen_topics = HashSet::new();

        for (position, entry) in entries.iter().enumerate() {
            let Some(id) = resolve_section_id(entry.get("quiz_section_id")) else {
                warn!(position, "skipping directory entry without a usable quiz_section_id");
                index.skipped += 1;
                continue;
            };
            if !seen_competencies.insert(id.clone()) {
                debug!(id = %id, "duplicate competency id, keeping the first definition");
                continue;
            }

            let name = entry
                .get("section_name")
                .and_then(non_empty_text)
                .unwrap_or_else(|| id.clone());

            let topic_list = entry.get("topics").and_then(Value::as_array);
            let marks: f64 = topic_list
                .into_iter()
                .flatten()
                .map(|topic| json_number_or_zero(topic.get("total_marks")))
                .sum();

            for topic in topic_list.into_iter().flatten() {
                let Some(topic_id) = topic.get("topic_id").and_then(scalar_text) else {
                    continue;
                };
                let Some(topic_name) = topic.get("topic_name").and_then(non_empty_text) else {
                    continue;
                };
                if seen_topics.insert(topic_id.clone()) {
                    index.topics.push(DirectoryEntry::new(
                        topic_id,
                        topic_name,
                        Some(name.clone()),
                        json_number_or_zero(topic.get("total_marks")),
                    ));
                }
            }

            if let Some(details) = entry.get("topic_detail").and_then(Value::as_object) {
                for (topic_id, detail) in details {
                    let Some(topic_name) = detail.get("topic_name").and_then(non_empty_text)
                    else {
                        continue;
                    };
                    if seen_topics.insert(topic_id.clone()) {
                        index.topics.push(DirectoryEntry::new(
                            topic_id.clone(),
                            topic_name,
                            Some(name.clone()),
                            json_number_or_zero(detail.get("total_marks")),
                        ));
                    }
                }
            }

            index
                .competencies
                .push(DirectoryEntry::new(id, name, None, marks));
        }

        debug!(
            competencies = index.competencies.len(),
            topics = index.topics.len(),
            skipped = index.skipped,
            "directory built"
        );
        Ok(index)
    }

    pub fn is_empty(&self) -> bool {
        self.competencies.is_empty() && self.topics.is_empty()
    }

    /// Competency or topic by id
    pub fn lookup(&self, id: &str) -> Option<&DirectoryEntry> {
        self.competencies
            .iter()
            .chain(self.topics.iter())
            .find(|entry| entry.id == id)
    }

    pub fn competencies(&self) -> &[DirectoryEntry] {
        &self.competencies
    }

    pub fn topics(&self) -> &[DirectoryEntry] {
        &self.topics
    }

    /// Case-sensitive match first, then case-insensitive
    pub fn competency_by_name(&self, name: &str) -> Option<&DirectoryEntry> {
        self.competencies
            .iter()
            .find(|entry| entry.name == name)
            .or_else(|| {
                self.competencies
                    .iter()
                    .find(|entry| entry.name.eq_ignore_ascii_case(name))
            })
    }

    /// Topics grouped under the named competency, in directory order
    pub fn topics_of(&self, competency: &str) -> Vec<&DirectoryEntry> {
        self.topics
            .iter()
            .filter(|entry| entry.competency.as_deref() == Some(competency))
            .collect()
    }

    /// Number of entries dropped for an unresolvable id
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// `["s1"]` or `"s1"`; anything else is unusable
fn resolve_section_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => items.first().and_then(scalar_text),
        Value::String(_) => value.and_then(non_empty_text),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        _ => non_empty_text(value),
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
