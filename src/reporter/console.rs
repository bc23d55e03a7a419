//! Console reporter with colored output

use crate::view::{SortDirection, SortKey, TableView};
use crate::{Row, PLACEHOLDER};
use colored::{ColoredString, Colorize};

/// A printed column and the key a click on its header sorts by
struct ConsoleColumn {
    header: String,
    key: SortKey,
}

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Print the table, legend and (in verbose mode) a summary
    pub fn report(&self, view: &TableView) {
        print!("{}", self.render(view));
    }

    /// Print inline notices, e.g. a directory that failed to load
    pub fn report_notices(&self, notices: &[String]) {
        for notice in notices {
            eprintln!("{}: {}", self.paint("Warning", |s| s.yellow()), notice);
        }
    }

    /// Status line while a fetch is outstanding; stderr keeps stdout clean
    pub fn report_loading(&self, what: &str) {
        eprintln!("{} Loading {}...", self.paint("Info", |s| s.blue()), what);
    }

    /// Print the "no data" state
    pub fn report_no_data(&self, message: &str) {
        println!("{}: {}", self.paint("Info", |s| s.blue()), message);
    }

    /// Print a plain list (units, quizzes, competencies)
    pub fn report_list(&self, title: &str, lines: &[String]) {
        println!("{}", self.paint(title, |s| s.bold()));
        if lines.is_empty() {
            println!("   {}", self.paint("(none)", |s| s.dimmed()));
        }
        for line in lines {
            println!("   {}", line);
        }
    }

    /// Render the table as text
    pub fn render(&self, view: &TableView) -> String {
        let table = view.table();
        let columns = self.columns(view);
        let rows = view.displayed_rows();
        let cells: Vec<Vec<String>> = rows.iter().map(|row| self.cells(view, row)).collect();

        let headers: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.header, view.sort().indicator(&c.key)))
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push('\n');
        out.push_str(&self.paint(
            &format!("{}: {}", table.screen.title(), table.selection.name()),
            |s| s.bold(),
        ));
        out.push_str("\n\n");

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(header, width)| self.paint(&pad(header, *width), |s| s.bold()))
            .collect();
        out.push_str(&format!("   {}\n", header_line.join("  ")));
        let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&format!("   {}\n", "─".repeat(rule)));

        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let padded = pad(cell, *width);
                    if cell == PLACEHOLDER {
                        self.paint(&padded, |s| s.dimmed())
                    } else {
                        padded
                    }
                })
                .collect();
            out.push_str(&format!("   {}\n", line.join("  ")));
        }

        if rows.is_empty() {
            out.push_str(&format!(
                "   {}\n",
                self.paint("No rows match the current search.", |s| s.dimmed())
            ));
        }

        if !table.columns.is_empty() {
            out.push('\n');
            out.push_str(&format!("   {}\n", self.paint("Legend:", |s| s.bold())));
            for column in &table.columns {
                out.push_str(&format!(
                    "   {} - {} (Out of {})\n",
                    column.abbreviation, column.name, column.max_score.label
                ));
            }
        }

        if self.verbose {
            out.push('\n');
            out.push_str(&format!(
                "   {}\n",
                self.paint(&self.summary(view, rows.len()), |s| s.dimmed())
            ));
        }
        out
    }

    fn columns(&self, view: &TableView) -> Vec<ConsoleColumn> {
        let table = view.table();
        let mut columns = vec![ConsoleColumn {
            header: "S.No".to_string(),
            key: SortKey::Sno,
        }];
        if table.screen.unit_rows() {
            columns.push(ConsoleColumn {
                header: "Unit".to_string(),
                key: SortKey::Name,
            });
        } else {
            columns.extend([
                ConsoleColumn {
                    header: "Student Name".to_string(),
                    key: SortKey::Name,
                },
                ConsoleColumn {
                    header: "Units".to_string(),
                    key: SortKey::Units,
                },
                ConsoleColumn {
                    header: "Department".to_string(),
                    key: SortKey::Department,
                },
            ]);
        }
        columns.push(ConsoleColumn {
            header: format!("Total (Out of {})", view.total_max_label()),
            key: SortKey::TotalScore,
        });

        let unit_percentile = table.screen.fields().shows_unit_percentile();
        for column in &table.columns {
            columns.push(ConsoleColumn {
                header: format!("{} (Out of {})", column.abbreviation, column.max_score.label),
                key: SortKey::Score(column.id.clone()),
            });
            columns.push(ConsoleColumn {
                header: format!("{} %ile", column.abbreviation),
                key: SortKey::Percentile(column.id.clone()),
            });
            if unit_percentile {
                columns.push(ConsoleColumn {
                    header: format!("{} Unit %ile", column.abbreviation),
                    key: SortKey::UnitPercentile(column.id.clone()),
                });
            }
        }
        columns
    }

    fn cells(&self, view: &TableView, row: &Row) -> Vec<String> {
        let table = view.table();
        let mut cells = vec![row.sno.to_string(), row.name.clone()];
        if !table.screen.unit_rows() {
            cells.push(row.units_label());
            cells.push(row.department_label().to_string());
        }
        cells.push(row.total_label());

        let unit_percentile = table.screen.fields().shows_unit_percentile();
        for column in &table.columns {
            let score = row.score(&column.id);
            cells.push(score.map_or(PLACEHOLDER, |s| s.average.display()).to_string());
            cells.push(score.map_or(PLACEHOLDER, |s| s.percentile.display()).to_string());
            if unit_percentile {
                cells.push(
                    score
                        .and_then(|s| s.unit_percentile.as_ref())
                        .map_or(PLACEHOLDER, |c| c.display())
                        .to_string(),
                );
            }
        }
        cells
    }

    fn summary(&self, view: &TableView, shown: usize) -> String {
        let table = view.table();
        let mut summary = format!(
            "{} of {} rows | {} columns",
            shown,
            table.rows.len(),
            table.columns.len()
        );
        if !view.search().trim().is_empty() {
            summary.push_str(&format!(" | search \"{}\"", view.search().trim()));
        }
        if let (Some(key), true) = (view.sort().key(), view.sort().is_active()) {
            let direction = match view.sort().direction() {
                SortDirection::Desc => "desc",
                _ => "asc",
            };
            summary.push_str(&format!(" | sort {} {}", key, direction));
        }
        summary
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.use_colors {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}
