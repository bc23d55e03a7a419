//! Spreadsheet export: sheet layout, workbook writing and saving
//!
//! The sheet is built from the same rows and columns the table shows, so the
//! exported numbers are the displayed numbers.

mod workbook;

pub use workbook::{save_with_fallback, write_workbook};

use crate::view::TableView;
use crate::{ReportError, ReportTable, Result, Row, ScoreCell, PLACEHOLDER};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// Identity column at the left of the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityColumn {
    Sno { width: u16 },
    StudentName { width: u16 },
    /// Unit name(s), header "Unit"
    Unit { width: u16 },
    /// Unit names, header "Units"
    Units { width: u16 },
    Department { width: u16 },
}

impl IdentityColumn {
    fn header(self) -> &'static str {
        match self {
            IdentityColumn::Sno { .. } => "S.No",
            IdentityColumn::StudentName { .. } => "Student Name",
            IdentityColumn::Unit { .. } => "Unit",
            IdentityColumn::Units { .. } => "Units",
            IdentityColumn::Department { .. } => "Department",
        }
    }

    fn width(self) -> u16 {
        match self {
            IdentityColumn::Sno { width }
            | IdentityColumn::StudentName { width }
            | IdentityColumn::Unit { width }
            | IdentityColumn::Units { width }
            | IdentityColumn::Department { width } => width,
        }
    }

    fn cell(self, row: &Row) -> CellValue {
        match self {
            IdentityColumn::Sno { .. } => CellValue::Number(row.sno as f64),
            IdentityColumn::StudentName { .. } => CellValue::Text(row.name.clone()),
            IdentityColumn::Unit { .. } | IdentityColumn::Units { .. } => {
                CellValue::Text(row.units_label())
            }
            IdentityColumn::Department { .. } => CellValue::Text(row.department_label().to_string()),
        }
    }
}

/// Per-column value exported for each active competency/topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Score,
    MhPercentile,
    UnitPercentile,
}

/// How legend lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendStyle {
    /// `EC - Effective Communication`
    NameOnly,
    /// `EC - Effective Communication (Out of 8)`
    WithMaxScore,
}

/// Which rows go into the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// Every aggregated row, ignoring search and sort
    AllRows,
    /// Exactly what the table currently shows
    DisplayedRows,
}

/// Per-screen sheet layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLayout {
    pub sheet_name: &'static str,
    pub file_prefix: &'static str,
    pub identity: &'static [IdentityColumn],
    pub total_width: u16,
    pub score_fields: &'static [ScoreField],
    pub score_width: u16,
    pub percentile_width: u16,
    pub legend: LegendStyle,
    pub scope: ExportScope,
}

/// A single sheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => crate::format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Laid-out sheet content, independent of the file format
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSheet {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub widths: Vec<u16>,
    pub rows: Vec<Vec<CellValue>>,
    pub legend: Vec<String>,
}

impl ExportSheet {
    /// Zero-based sheet row of the "Legend:" label: one blank row after the data
    pub fn legend_row(&self) -> u32 {
        self.rows.len() as u32 + 2
    }
}

pub const NO_ROWS_MESSAGE: &str = "No data available to download. Please apply filters first.";

/// Rows that go into the file for the screen's export scope
pub fn export_rows(view: &TableView) -> Vec<Row> {
    match view.table().screen.export_layout().scope {
        ExportScope::DisplayedRows => view.displayed_rows(),
        ExportScope::AllRows => {
            let mut rows = view.table().rows.clone();
            for (position, row) in rows.iter_mut().enumerate() {
                row.sno = position + 1;
            }
            rows
        }
    }
}

/// Lay out header, data and legend for the given rows.
///
/// Zero rows is an error: no empty files are written.
pub fn build_sheet(table: &ReportTable, rows: &[Row]) -> Result<ExportSheet> {
    if rows.is_empty() {
        return Err(ReportError::Export(NO_ROWS_MESSAGE.to_string()));
    }
    let layout = table.screen.export_layout();

    let mut headers: Vec<String> = layout.identity.iter().map(|c| c.header().to_string()).collect();
    let mut widths: Vec<u16> = layout.identity.iter().map(|c| c.width()).collect();
    headers.push(format!("Total Score (Out of {})", table.total_max_label()));
    widths.push(layout.total_width);

    for column in &table.columns {
        for field in layout.score_fields {
            let (header, width) = match field {
                ScoreField::Score => (
                    format!(
                        "{} - Score (Out of {})",
                        column.abbreviation, column.max_score.label
                    ),
                    layout.score_width,
                ),
                ScoreField::MhPercentile => (
                    format!("{} - MH %ile", column.abbreviation),
                    layout.percentile_width,
                ),
                ScoreField::UnitPercentile => (
                    format!("{} - Unit %ile", column.abbreviation),
                    layout.percentile_width,
                ),
            };
            headers.push(header);
            widths.push(width);
        }
    }

    let data = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<CellValue> = layout.identity.iter().map(|c| c.cell(row)).collect();
            cells.push(CellValue::Number(
                crate::parse_number(&row.total_label()).unwrap_or(0.0),
            ));
            for column in &table.columns {
                let score = row.score(&column.id);
                for field in layout.score_fields {
                    let cell = score.and_then(|s| match field {
                        ScoreField::Score => Some(&s.average),
                        ScoreField::MhPercentile => Some(&s.percentile),
                        ScoreField::UnitPercentile => s.unit_percentile.as_ref(),
                    });
                    cells.push(CellValue::Text(
                        cell.map(ScoreCell::display).unwrap_or(PLACEHOLDER).to_string(),
                    ));
                }
            }
            cells
        })
        .collect();

    let legend = table
        .columns
        .iter()
        .map(|column| match layout.legend {
            LegendStyle::NameOnly => format!("{} - {}", column.abbreviation, column.name),
            LegendStyle::WithMaxScore => format!(
                "{} - {} (Out of {})",
                column.abbreviation, column.name, column.max_score.label
            ),
        })
        .collect();

    Ok(ExportSheet {
        sheet_name: layout.sheet_name.to_string(),
        headers,
        widths,
        rows: data,
        legend,
    })
}

/// `<prefix>_<filter>_<YYYY-MM-DD>.xlsx` with path-hostile characters replaced
pub fn file_name(prefix: &str, filter: &str, date: NaiveDate) -> String {
    let cleaned: String = filter
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let filter = if cleaned.is_empty() { "report" } else { cleaned.as_str() };
    format!("{}_{}_{}.xlsx", prefix, filter, date.format("%Y-%m-%d"))
}

/// Build, write and save the workbook for a view; returns the saved path
pub fn export_view(
    view: &TableView,
    output_dir: &Path,
    fallback_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    let table = view.table();
    let rows = export_rows(view);
    let sheet = build_sheet(table, &rows)?;
    let mut workbook = write_workbook(&sheet)?;
    let name = file_name(
        table.screen.export_layout().file_prefix,
        table.selection.name(),
        date,
    );
    let path = save_with_fallback(&mut workbook, &name, output_dir, fallback_dir)?;
    info!(path = %path.display(), rows = rows.len(), "workbook saved");
    Ok(path)
}
