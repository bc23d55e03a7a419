//! Row aggregation: nested report tree -> flat rows per student or unit

pub mod fields;
mod walk;

use crate::directory::{DirectoryEntry, DirectoryIndex};
use crate::screen::ScreenKind;
use crate::{Column, CompetencyScore, MaxScore, ReportTable, Row, ScoreCell, Selection};
use fields::{FieldAliases, LeafScores};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use walk::Entity;

/// How leaf occurrences become one displayed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// One snapshot per entity; values are shown as received
    Direct,
    /// Mean over every occurrence under the entity, two decimals
    Averaged,
}

/// Layout of the report tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// `unit -> score_detail -> section`
    UnitScoreDetail,
    /// `unit -> quiz_detail -> quiz -> student -> quiz_detail -> quiz -> section_detail -> section`
    UnitQuizStudentSections,
    /// `unit -> user -> section_detail -> section -> topic_detail -> topic`
    UnitUserSectionTopics,
    /// `unit -> (section | user) -> ... -> topic_detail -> topic`
    UnitSectionTopics,
}

/// Where a column's "Out of" value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxScoreRule {
    /// Sum of `total_marks` over the competency's topics in the directory
    DirectoryTotalMarks,
    /// `correct_marks x total_question` from the first occurrence in the tree
    /// that carries both
    FirstOccurrenceProduct,
}

/// Which directory entries are column candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    Competencies,
    /// Topics of the named competency
    TopicsOf(String),
}

/// Everything the aggregator needs besides the data
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPlan {
    pub mode: AggregationMode,
    pub shape: TreeShape,
    pub max_rule: MaxScoreRule,
    pub fields: &'static FieldAliases,
    pub columns: ColumnSource,
    /// Quiz subtree to read, when the tree is keyed by quiz
    pub quiz_id: Option<String>,
}

/// Columns and rows produced by one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Running means over every matching leaf occurrence.
///
/// Placeholders count as zero, and all three values share one occurrence
/// count. A cell is `-` only when the id never occurred.
#[derive(Debug, Clone, Copy, Default)]
struct MeanScores {
    average: f64,
    percentile: f64,
    unit_percentile: f64,
    count: usize,
    has_value: bool,
}

impl MeanScores {
    fn add(&mut self, leaf: &LeafScores) {
        self.average += leaf.average.numeric_or_zero();
        self.percentile += leaf.percentile.numeric_or_zero();
        if let Some(cell) = &leaf.unit_percentile {
            self.unit_percentile += cell.numeric_or_zero();
        }
        self.count += 1;
        self.has_value |= leaf.has_value();
    }

    fn average(&self) -> ScoreCell {
        ScoreCell::from_mean(self.average, self.count)
    }

    fn percentile(&self) -> ScoreCell {
        ScoreCell::from_mean(self.percentile, self.count)
    }

    fn unit_percentile(&self) -> ScoreCell {
        ScoreCell::from_mean(self.unit_percentile, self.count)
    }
}

/// One entity with its merged leaves
#[derive(Debug)]
struct Group {
    key: String,
    name: String,
    units: Vec<String>,
    department: Option<String>,
    direct: BTreeMap<String, LeafScores>,
    means: BTreeMap<String, MeanScores>,
}

impl Group {
    fn new(entity: &Entity) -> Self {
        Self {
            key: entity.key.clone(),
            name: entity.name.clone(),
            units: Vec::new(),
            department: None,
            direct: BTreeMap::new(),
            means: BTreeMap::new(),
        }
    }

    fn score(&self, id: &str, mode: AggregationMode, shows_unit: bool) -> CompetencyScore {
        match mode {
            AggregationMode::Direct => match self.direct.get(id) {
                Some(leaf) => CompetencyScore {
                    average: leaf.average.clone(),
                    percentile: leaf.percentile.clone(),
                    unit_percentile: leaf.unit_percentile.clone(),
                },
                None => CompetencyScore {
                    unit_percentile: shows_unit.then_some(ScoreCell::Missing),
                    ..Default::default()
                },
            },
            AggregationMode::Averaged => {
                let means = self.means.get(id);
                CompetencyScore {
                    average: means.map(MeanScores::average).unwrap_or_default(),
                    percentile: means.map(MeanScores::percentile).unwrap_or_default(),
                    unit_percentile: shows_unit
                        .then(|| means.map(MeanScores::unit_percentile).unwrap_or_default()),
                }
            }
        }
    }

    fn has_value(&self, id: &str, mode: AggregationMode) -> bool {
        match mode {
            AggregationMode::Direct => self.direct.get(id).is_some_and(LeafScores::has_value),
            AggregationMode::Averaged => self.means.get(id).is_some_and(|m| m.has_value),
        }
    }
}

/// Flatten a report tree into rows.
///
/// Column candidates come from the directory in directory order; a candidate
/// becomes an active column only when some entity carries a real value for
/// it. Every row holds one cell per active column and a total equal to the
/// sum of its displayed averages. Rows are numbered 1..n in walk order.
pub fn aggregate(
    report: &serde_json::Value,
    directory: &DirectoryIndex,
    plan: &AggregationPlan,
) -> Aggregation {
    let candidates: Vec<&DirectoryEntry> = match &plan.columns {
        ColumnSource::Competencies => directory.competencies().iter().collect(),
        ColumnSource::TopicsOf(name) => directory.topics_of(name),
    };
    let wanted = |id: &str| candidates.iter().any(|c| c.id == id);

    let mut groups: Vec<Group> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut first_products: HashMap<String, f64> = HashMap::new();

    for entity in walk::walk(report, plan) {
        let slot = *positions.entry(entity.key.clone()).or_insert_with(|| {
            groups.push(Group::new(&entity));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if !group.units.contains(&entity.unit) {
            group.units.push(entity.unit.clone());
        }
        if entity.department.is_some() {
            group.department = entity.department.clone();
        }

        for (id, leaf) in entity.leaves {
            if !wanted(&id) {
                continue;
            }
            if let Some(product) = leaf.max_product {
                first_products.entry(id.clone()).or_insert(product);
            }
            match plan.mode {
                AggregationMode::Direct => {
                    group.direct.insert(id, leaf);
                }
                AggregationMode::Averaged => {
                    group.means.entry(id).or_default().add(&leaf);
                }
            }
        }
    }

    let columns: Vec<Column> = candidates
        .iter()
        .filter(|entry| groups.iter().any(|g| g.has_value(&entry.id, plan.mode)))
        .map(|entry| Column {
            id: entry.id.clone(),
            name: entry.name.clone(),
            abbreviation: entry.abbreviation.clone(),
            max_score: match plan.max_rule {
                MaxScoreRule::DirectoryTotalMarks => entry.max_score.clone(),
                MaxScoreRule::FirstOccurrenceProduct => MaxScore::product(
                    first_products.get(&entry.id).copied().unwrap_or(0.0),
                ),
            },
        })
        .collect();

    let shows_unit = plan.fields.shows_unit_percentile();
    let rows: Vec<Row> = groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let scores: BTreeMap<String, CompetencyScore> = columns
                .iter()
                .map(|c| (c.id.clone(), group.score(&c.id, plan.mode, shows_unit)))
                .collect();
            let total_score = scores.values().map(|s| s.average.numeric_or_zero()).sum();
            Row {
                sno: index + 1,
                key: group.key,
                name: group.name,
                units: group.units,
                department: group.department,
                scores,
                total_score,
            }
        })
        .collect();

    debug!(
        rows = rows.len(),
        columns = columns.len(),
        candidates = candidates.len(),
        "aggregated report"
    );
    Aggregation { columns, rows }
}

/// Aggregate with the screen's conventions and wrap the result in a table
pub fn build_table(
    screen: ScreenKind,
    selection: Selection,
    report: &serde_json::Value,
    directory: &DirectoryIndex,
) -> ReportTable {
    let plan = screen.plan(&selection);
    let Aggregation { columns, rows } = aggregate(report, directory, &plan);
    ReportTable {
        screen,
        selection,
        columns,
        rows,
    }
}
