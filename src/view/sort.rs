//! Sort keys and the tri-state header toggle

use crate::{Row, ScoreCell};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A sortable column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKey {
    Sno,
    Name,
    Units,
    Department,
    TotalScore,
    Score(String),
    Percentile(String),
    UnitPercentile(String),
}

impl SortKey {
    /// Comparison value for a row; numeric keys treat placeholders as zero
    pub fn value(&self, row: &Row) -> SortValue {
        match self {
            SortKey::Sno => SortValue::Number(row.sno as f64),
            SortKey::Name => SortValue::Text(row.name.to_lowercase()),
            SortKey::Units => SortValue::Text(row.units_label().to_lowercase()),
            SortKey::Department => SortValue::Text(row.department_label().to_lowercase()),
            SortKey::TotalScore => SortValue::Number(row.total_score),
            SortKey::Score(id) => numeric(row.score(id).map(|s| &s.average)),
            SortKey::Percentile(id) => numeric(row.score(id).map(|s| &s.percentile)),
            SortKey::UnitPercentile(id) => {
                numeric(row.score(id).and_then(|s| s.unit_percentile.as_ref()))
            }
        }
    }
}

fn numeric(cell: Option<&ScoreCell>) -> SortValue {
    SortValue::Number(cell.map(ScoreCell::numeric_or_zero).unwrap_or(0.0))
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Sno => write!(f, "sno"),
            SortKey::Name => write!(f, "name"),
            SortKey::Units => write!(f, "unit"),
            SortKey::Department => write!(f, "department"),
            SortKey::TotalScore => write!(f, "totalScore"),
            SortKey::Score(id) => write!(f, "score_{}", id),
            SortKey::Percentile(id) => write!(f, "percentile_{}", id),
            SortKey::UnitPercentile(id) => write!(f, "unitPercentile_{}", id),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let with_id = |prefixes: &[&str]| {
            prefixes
                .iter()
                .find_map(|p| s.strip_prefix(p))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        };
        if let Some(id) = with_id(&["unitPercentile_", "unit_percentile_"]) {
            return Ok(SortKey::UnitPercentile(id));
        }
        if let Some(id) = with_id(&["percentile_"]) {
            return Ok(SortKey::Percentile(id));
        }
        if let Some(id) = with_id(&["score_", "section_"]) {
            return Ok(SortKey::Score(id));
        }
        match s {
            "sno" => Ok(SortKey::Sno),
            "name" | "studentName" | "unitName" => Ok(SortKey::Name),
            "unit" | "units" => Ok(SortKey::Units),
            "department" => Ok(SortKey::Department),
            "totalScore" | "total" => Ok(SortKey::TotalScore),
            _ => Err(format!(
                "unknown sort key '{}' (use sno, name, unit, department, totalScore, score_<id>, percentile_<id> or unitPercentile_<id>)",
                s
            )),
        }
    }
}

/// Value a row sorts by
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    None,
    Asc,
    Desc,
}

/// Active sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    key: Option<SortKey>,
    direction: SortDirection,
}

impl SortState {
    pub fn key(&self) -> Option<&SortKey> {
        self.key.as_ref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some() && self.direction != SortDirection::None
    }

    /// Header click: none -> asc -> desc -> none on the same column; a
    /// different column always starts at asc.
    pub fn click(&mut self, key: SortKey) {
        if self.key.as_ref() == Some(&key) {
            match self.direction {
                SortDirection::None => self.direction = SortDirection::Asc,
                SortDirection::Asc => self.direction = SortDirection::Desc,
                SortDirection::Desc => *self = SortState::default(),
            }
        } else {
            self.key = Some(key);
            self.direction = SortDirection::Asc;
        }
    }

    /// Header arrow for a column
    pub fn indicator(&self, key: &SortKey) -> &'static str {
        if self.key.as_ref() != Some(key) {
            return "↕";
        }
        match self.direction {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
            SortDirection::None => "↕",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_clicks_return_to_unsorted() {
        let mut state = SortState::default();
        state.click(SortKey::TotalScore);
        assert_eq!(state.direction(), SortDirection::Asc);
        state.click(SortKey::TotalScore);
        assert_eq!(state.direction(), SortDirection::Desc);
        state.click(SortKey::TotalScore);
        assert_eq!(state, SortState::default());
        assert!(state.key().is_none());
    }

    #[test]
    fn test_new_column_resets_to_ascending() {
        let mut state = SortState::default();
        state.click(SortKey::Name);
        state.click(SortKey::Name);
        state.click(SortKey::Score("s1".into()));
        assert_eq!(state.key(), Some(&SortKey::Score("s1".into())));
        assert_eq!(state.direction(), SortDirection::Asc);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("score_s1".parse::<SortKey>(), Ok(SortKey::Score("s1".into())));
        assert_eq!("section_s1".parse::<SortKey>(), Ok(SortKey::Score("s1".into())));
        assert_eq!(
            "unit_percentile_t4".parse::<SortKey>(),
            Ok(SortKey::UnitPercentile("t4".into()))
        );
        assert_eq!(
            "percentile_t4".parse::<SortKey>(),
            Ok(SortKey::Percentile("t4".into()))
        );
        assert_eq!("studentName".parse::<SortKey>(), Ok(SortKey::Name));
        assert_eq!("unit".parse::<SortKey>(), Ok(SortKey::Units));
        assert!("score_".parse::<SortKey>().is_err());
        assert!("height".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for key in [
            SortKey::Sno,
            SortKey::Department,
            SortKey::TotalScore,
            SortKey::UnitPercentile("x".into()),
        ] {
            assert_eq!(key.to_string().parse::<SortKey>(), Ok(key));
        }
    }

    #[test]
    fn test_indicator() {
        let mut state = SortState::default();
        assert_eq!(state.indicator(&SortKey::Name), "↕");
        state.click(SortKey::Name);
        assert_eq!(state.indicator(&SortKey::Name), "↑");
        assert_eq!(state.indicator(&SortKey::Sno), "↕");
    }
}
