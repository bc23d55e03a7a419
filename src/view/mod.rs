//! Table view model: search, single-column sort and renumbering

mod sort;

pub use sort::{SortDirection, SortKey, SortState, SortValue};

use crate::{MaxScore, ReportTable, Row};

/// Text field a search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Units,
    Department,
}

impl SearchField {
    fn matches(self, row: &Row, needle: &str) -> bool {
        match self {
            SearchField::Name => row.name.to_lowercase().contains(needle),
            SearchField::Units => row.units.iter().any(|u| u.to_lowercase().contains(needle)),
            SearchField::Department => row
                .department
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle)),
        }
    }
}

/// A report table plus the user's search and sort state.
///
/// Derived rows are recomputed from the owned table on every call.
#[derive(Debug, Clone)]
pub struct TableView {
    table: ReportTable,
    search: String,
    sort: SortState,
}

impl TableView {
    pub fn new(table: ReportTable) -> Self {
        Self {
            table,
            search: String::new(),
            sort: SortState::default(),
        }
    }

    pub fn table(&self) -> &ReportTable {
        &self.table
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// One click on a column header
    pub fn click(&mut self, key: SortKey) {
        self.sort.click(key);
    }

    /// Rows after search and sort, numbered from 1 in display order.
    ///
    /// Search is a case-insensitive substring match, OR across the screen's
    /// search fields. Sorting is stable; with no active sort the aggregation
    /// order is kept.
    pub fn displayed_rows(&self) -> Vec<Row> {
        let needle = self.search.trim().to_lowercase();
        let fields = self.table.screen.search_fields();

        let mut rows: Vec<Row> = self
            .table
            .rows
            .iter()
            .filter(|row| needle.is_empty() || fields.iter().any(|f| f.matches(row, &needle)))
            .cloned()
            .collect();

        if let (Some(key), true) = (self.sort.key(), self.sort.is_active()) {
            let descending = self.sort.direction() == SortDirection::Desc;
            rows.sort_by(|a, b| {
                let ordering = key.value(a).compare(&key.value(b));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        for (position, row) in rows.iter_mut().enumerate() {
            row.sno = position + 1;
        }
        rows
    }

    /// Max score shown in a column header
    pub fn header_max(&self, column_id: &str) -> Option<&MaxScore> {
        self.table.column(column_id).map(|c| &c.max_score)
    }

    pub fn total_max_label(&self) -> String {
        self.table.total_max_label()
    }
}
