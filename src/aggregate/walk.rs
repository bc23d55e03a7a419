//! Null-safe walkers over the four report tree shapes
//!
//! Every intermediate node is optional: a unit without `quiz_detail`, a student
//! without `section_detail`, or a scalar where an object was expected simply
//! contributes no leaves.

use super::fields::{FieldAliases, LeafScores};
use super::{AggregationPlan, TreeShape};
use crate::PLACEHOLDER;
use serde_json::Value;

/// A grouping entity (unit or student) found in the tree, with its leaves
#[derive(Debug, Clone)]
pub(crate) struct Entity {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub department: Option<String>,
    pub leaves: Vec<(String, LeafScores)>,
}

impl Entity {
    fn unit(unit: &str) -> Self {
        Self {
            key: unit.to_string(),
            name: unit.to_string(),
            unit: unit.to_string(),
            department: None,
            leaves: Vec::new(),
        }
    }

    fn student(id: &str, unit: &str, student: &Value) -> Self {
        let basic = student.get("user_basic_detail");
        let field = |name: &str| basic.and_then(|b| b.get(name)).and_then(text);
        Self {
            key: id.to_string(),
            name: field("student_name").unwrap_or_else(|| PLACEHOLDER.to_string()),
            unit: field("unit_name").unwrap_or_else(|| unit.to_string()),
            department: field("department"),
            leaves: Vec::new(),
        }
    }
}

/// Walk the report in key order and collect one entity per grouping node
pub(crate) fn walk(report: &Value, plan: &AggregationPlan) -> Vec<Entity> {
    let fields = plan.fields;
    let mut found = Vec::new();

    for (unit, node) in entries(Some(report)) {
        match plan.shape {
            TreeShape::UnitScoreDetail => {
                let mut entity = Entity::unit(unit);
                for (id, leaf) in entries(node.get("score_detail")) {
                    entity.leaves.push((id.clone(), fields.read(leaf, None)));
                }
                found.push(entity);
            }
            TreeShape::UnitQuizStudentSections => {
                for (quiz_id, students) in entries(node.get("quiz_detail")) {
                    if plan.quiz_id.as_ref().is_some_and(|wanted| wanted != quiz_id) {
                        continue;
                    }
                    for (student_id, student) in objects(students) {
                        let mut entity = Entity::student(student_id, unit, student);
                        let sections = student
                            .get("quiz_detail")
                            .and_then(|q| q.get(quiz_id))
                            .and_then(|q| q.get("section_detail"));
                        for (id, section) in entries(sections) {
                            entity.leaves.push((id.clone(), fields.read(section, None)));
                        }
                        found.push(entity);
                    }
                }
            }
            TreeShape::UnitUserSectionTopics => {
                for (user_id, user) in objects(node) {
                    let mut entity = Entity::student(user_id, unit, user);
                    for (_, section) in entries(user.get("section_detail")) {
                        collect_topics(fields, section, &mut entity.leaves);
                    }
                    found.push(entity);
                }
            }
            TreeShape::UnitSectionTopics => {
                let mut entity = Entity::unit(unit);
                for (_, section) in objects(node) {
                    collect_topics(fields, section, &mut entity.leaves);
                }
                found.push(entity);
            }
        }
    }
    found
}

fn collect_topics(fields: &FieldAliases, section: &Value, out: &mut Vec<(String, LeafScores)>) {
    for (id, topic) in entries(section.get("topic_detail")) {
        out.push((id.clone(), fields.read(topic, Some(section))));
    }
}

/// Key/value pairs of an object node; nothing for anything else
fn entries(node: Option<&Value>) -> impl Iterator<Item = (&String, &Value)> {
    node.and_then(Value::as_object).into_iter().flatten()
}

/// Like [`entries`] but only children that are themselves objects
fn objects(node: &Value) -> impl Iterator<Item = (&String, &Value)> {
    entries(Some(node)).filter(|(_, child)| child.is_object())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s != PLACEHOLDER).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
