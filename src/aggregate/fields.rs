//! Per-screen leaf field names
//!
//! Each logical value is read through an ordered alias list: the first alias
//! holding a real value wins. Leaves are resolved into [`LeafScores`] once,
//! when the tree is walked.

use crate::{parse_number, ScoreCell};
use serde_json::Value;

/// Accepted field names for each logical leaf value
#[derive(Debug, PartialEq, Eq)]
pub struct FieldAliases {
    pub score: &'static [&'static str],
    pub percentile: &'static [&'static str],
    /// Empty when the screen has no unit percentile column
    pub unit_percentile: &'static [&'static str],
    /// Looked up on the leaf, then on its parent section
    pub correct_marks: &'static [&'static str],
    pub total_question: &'static [&'static str],
}

pub static UNIT_MAIN: FieldAliases = FieldAliases {
    score: &["unit_section_score_average"],
    percentile: &["unit_section_score_percentile"],
    unit_percentile: &[],
    correct_marks: &["correct_marks"],
    total_question: &["section_total_question"],
};

pub static USER_MAIN: FieldAliases = FieldAliases {
    score: &["section_total_score"],
    percentile: &["section_percentile_score"],
    unit_percentile: &[
        "unit_section_percentile_score",
        "unit_percentile_score",
        "unit_percentile",
    ],
    correct_marks: &["correct_marks"],
    total_question: &["section_total_question"],
};

pub static USER_SUB: FieldAliases = FieldAliases {
    score: &["topic_total_score"],
    percentile: &["topic_percentile_score"],
    unit_percentile: &["unit_topic_percentile_score"],
    correct_marks: &["correct_marks"],
    total_question: &["topic_total_question"],
};

pub static UNIT_SUB: FieldAliases = FieldAliases {
    score: &["unit_topic_score_average"],
    percentile: &["unit_topic_score_percentile"],
    unit_percentile: &[],
    correct_marks: &["correct_marks"],
    total_question: &["topic_total_question"],
};

/// Values read from one leaf occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct LeafScores {
    pub average: ScoreCell,
    pub percentile: ScoreCell,
    pub unit_percentile: Option<ScoreCell>,
    /// `correct_marks x total_question` when both are numeric
    pub max_product: Option<f64>,
}

impl LeafScores {
    pub fn has_value(&self) -> bool {
        self.average.is_present()
            || self.percentile.is_present()
            || self.unit_percentile.as_ref().is_some_and(ScoreCell::is_present)
    }
}

impl FieldAliases {
    pub fn shows_unit_percentile(&self) -> bool {
        !self.unit_percentile.is_empty()
    }

    /// Resolve a leaf node (and the section it sits in) into scores
    pub fn read(&self, leaf: &Value, section: Option<&Value>) -> LeafScores {
        let correct_marks =
            first_number(leaf, self.correct_marks).or_else(|| {
                section.and_then(|s| first_number(s, self.correct_marks))
            });
        let total_question = first_number(leaf, self.total_question);

        LeafScores {
            average: first_present(leaf, self.score),
            percentile: first_present(leaf, self.percentile),
            unit_percentile: self
                .shows_unit_percentile()
                .then(|| first_present(leaf, self.unit_percentile)),
            max_product: correct_marks.zip(total_question).map(|(c, q)| c * q),
        }
    }
}

fn first_present(node: &Value, aliases: &[&str]) -> ScoreCell {
    aliases
        .iter()
        .map(|alias| ScoreCell::from_json(node.get(alias)))
        .find(ScoreCell::is_present)
        .unwrap_or_default()
}

fn first_number(node: &Value, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|alias| match node.get(alias)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_percentile_aliases_in_order() {
        let leaf = json!({
            "section_total_score": "7",
            "unit_section_percentile_score": "-",
            "unit_percentile_score": "64.2",
            "unit_percentile": "10"
        });
        let scores = USER_MAIN.read(&leaf, None);
        assert_eq!(scores.unit_percentile, Some(ScoreCell::Present("64.2".into())));
        assert_eq!(scores.percentile, ScoreCell::Missing);
    }

    #[test]
    fn test_screens_without_unit_percentile() {
        let scores = UNIT_MAIN.read(&json!({"unit_section_score_average": 3}), None);
        assert_eq!(scores.unit_percentile, None);
        assert!(scores.has_value());
    }

    #[test]
    fn test_max_product_reads_marks_from_section() {
        let section = json!({"correct_marks": "2"});
        let topic = json!({"topic_total_question": 5});
        let scores = USER_SUB.read(&topic, Some(&section));
        assert_eq!(scores.max_product, Some(10.0));

        let scores = USER_SUB.read(&json!({"topic_total_question": "x"}), Some(&section));
        assert_eq!(scores.max_product, None);
    }

    #[test]
    fn test_placeholder_leaf_has_no_value() {
        let leaf = json!({"topic_total_score": "-", "topic_percentile_score": null});
        assert!(!USER_SUB.read(&leaf, None).has_value());
    }
}
