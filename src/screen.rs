//! The four report screens and their per-screen conventions
//!
//! Each screen reads a different endpoint with its own tree shape, field
//! names, max-score rule and export layout. All of those differences live
//! here, so the aggregator, view and exporter stay generic.

use crate::aggregate::fields::{self, FieldAliases};
use crate::aggregate::{AggregationMode, AggregationPlan, ColumnSource, MaxScoreRule, TreeShape};
use crate::export::{ExportLayout, ExportScope, IdentityColumn, LegendStyle, ScoreField};
use crate::view::SearchField;
use crate::Selection;
use serde::{Deserialize, Serialize};

/// A report screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenKind {
    /// Unit-wise main competency report
    UnitMain,
    /// User-wise main competency report
    UserMain,
    /// User-wise sub-competency (topic) report
    UserSub,
    /// Unit-wise sub-competency (topic) report
    UnitSub,
}

/// Which filter selects the report subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Quiz,
    Competency,
}

impl ScreenKind {
    pub const ALL: [ScreenKind; 4] = [
        ScreenKind::UnitMain,
        ScreenKind::UserMain,
        ScreenKind::UserSub,
        ScreenKind::UnitSub,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ScreenKind::UnitMain => "Unit-wise Main Competency Report",
            ScreenKind::UserMain => "User-wise Main Competency Report",
            ScreenKind::UserSub => "User-wise Sub-Competency Report",
            ScreenKind::UnitSub => "Unit-wise Sub-Competency Report",
        }
    }

    /// Backend endpoint name under `reportanalytics/`
    pub fn endpoint(self) -> &'static str {
        match self {
            ScreenKind::UnitMain => "getMainCompetencyUnitReport",
            ScreenKind::UserMain => "getMainCompetencyUserReport",
            ScreenKind::UserSub => "getSubCometencyUserReport",
            ScreenKind::UnitSub => "getSubCometencyUnitReport",
        }
    }

    pub fn filter(self) -> FilterKind {
        match self {
            ScreenKind::UnitMain | ScreenKind::UserMain => FilterKind::Quiz,
            ScreenKind::UserSub | ScreenKind::UnitSub => FilterKind::Competency,
        }
    }

    /// One row per unit (true) or per student (false)
    pub fn unit_rows(self) -> bool {
        matches!(self, ScreenKind::UnitMain | ScreenKind::UnitSub)
    }

    pub fn mode(self) -> AggregationMode {
        match self {
            ScreenKind::UnitSub => AggregationMode::Averaged,
            _ => AggregationMode::Direct,
        }
    }

    pub fn shape(self) -> TreeShape {
        match self {
            ScreenKind::UnitMain => TreeShape::UnitScoreDetail,
            ScreenKind::UserMain => TreeShape::UnitQuizStudentSections,
            ScreenKind::UserSub => TreeShape::UnitUserSectionTopics,
            ScreenKind::UnitSub => TreeShape::UnitSectionTopics,
        }
    }

    pub fn max_rule(self) -> MaxScoreRule {
        match self {
            ScreenKind::UnitMain => MaxScoreRule::DirectoryTotalMarks,
            _ => MaxScoreRule::FirstOccurrenceProduct,
        }
    }

    pub fn fields(self) -> &'static FieldAliases {
        match self {
            ScreenKind::UnitMain => &fields::UNIT_MAIN,
            ScreenKind::UserMain => &fields::USER_MAIN,
            ScreenKind::UserSub => &fields::USER_SUB,
            ScreenKind::UnitSub => &fields::UNIT_SUB,
        }
    }

    /// Aggregation parameters for a concrete selection
    pub fn plan(self, selection: &Selection) -> AggregationPlan {
        let columns = match (self.filter(), selection) {
            (FilterKind::Competency, Selection::Competency { name, .. }) => {
                ColumnSource::TopicsOf(name.clone())
            }
            _ => ColumnSource::Competencies,
        };
        let quiz_id = match selection {
            Selection::Quiz { id, .. } => Some(id.clone()),
            Selection::Competency { .. } => None,
        };
        AggregationPlan {
            mode: self.mode(),
            shape: self.shape(),
            max_rule: self.max_rule(),
            fields: self.fields(),
            columns,
            quiz_id,
        }
    }

    pub fn search_fields(self) -> &'static [SearchField] {
        if self.unit_rows() {
            &[SearchField::Name]
        } else {
            &[SearchField::Name, SearchField::Units, SearchField::Department]
        }
    }

    pub fn export_layout(self) -> ExportLayout {
        match self {
            ScreenKind::UnitMain => ExportLayout {
                sheet_name: "UnitWiseMainCompetencyReport",
                file_prefix: "UnitWiseMainCompetencyReport",
                identity: &[
                    IdentityColumn::Sno { width: 10 },
                    IdentityColumn::Unit { width: 25 },
                ],
                total_width: 30,
                score_fields: &[ScoreField::Score, ScoreField::MhPercentile],
                score_width: 30,
                percentile_width: 20,
                legend: LegendStyle::NameOnly,
                scope: ExportScope::AllRows,
            },
            ScreenKind::UserMain => ExportLayout {
                sheet_name: "UserWise Main Competency Report",
                file_prefix: "UserWise_Main_Competency_Report",
                identity: &[
                    IdentityColumn::Sno { width: 10 },
                    IdentityColumn::StudentName { width: 30 },
                    IdentityColumn::Units { width: 30 },
                    IdentityColumn::Department { width: 20 },
                ],
                total_width: 35,
                score_fields: &[
                    ScoreField::Score,
                    ScoreField::MhPercentile,
                    ScoreField::UnitPercentile,
                ],
                score_width: 35,
                percentile_width: 20,
                legend: LegendStyle::WithMaxScore,
                scope: ExportScope::DisplayedRows,
            },
            ScreenKind::UserSub => ExportLayout {
                sheet_name: "UserWiseSubCompetency",
                file_prefix: "UserWiseSubCompetency_Report",
                identity: &[
                    IdentityColumn::Sno { width: 10 },
                    IdentityColumn::StudentName { width: 25 },
                    IdentityColumn::Unit { width: 20 },
                    IdentityColumn::Department { width: 20 },
                ],
                total_width: 30,
                score_fields: &[
                    ScoreField::Score,
                    ScoreField::UnitPercentile,
                    ScoreField::MhPercentile,
                ],
                score_width: 30,
                percentile_width: 20,
                legend: LegendStyle::NameOnly,
                scope: ExportScope::DisplayedRows,
            },
            ScreenKind::UnitSub => ExportLayout {
                sheet_name: "UnitWiseSubCompetencyReport",
                file_prefix: "UnitWiseSubCompetencyReport",
                identity: &[
                    IdentityColumn::Sno { width: 10 },
                    IdentityColumn::Unit { width: 25 },
                ],
                total_width: 30,
                score_fields: &[ScoreField::Score, ScoreField::MhPercentile],
                score_width: 30,
                percentile_width: 20,
                legend: LegendStyle::NameOnly,
                scope: ExportScope::AllRows,
            },
        }
    }
}

impl std::fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenKind::UnitMain => write!(f, "unit-main"),
            ScreenKind::UserMain => write!(f, "user-main"),
            ScreenKind::UserSub => write!(f, "user-sub"),
            ScreenKind::UnitSub => write!(f, "unit-sub"),
        }
    }
}

impl std::str::FromStr for ScreenKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ScreenKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                format!(
                    "unknown screen '{}' (expected one of: unit-main, user-main, user-sub, unit-sub)",
                    s
                )
            })
    }
}
