//! Screen controller: mount, filter validation and generation-tagged loads
//!
//! Each call to [`ScreenController::apply`] takes a new generation number
//! before it fetches. When the response arrives and a newer load has started
//! in the meantime, the response is discarded as [`LoadOutcome::Stale`].

use crate::aggregate::build_table;
use crate::client::{report_data, ReportBackend, ReportRequest};
use crate::directory::{find_quiz, parse_quiz_list, parse_unit_list, DirectoryIndex, QuizInfo};
use crate::screen::FilterKind;
use crate::view::TableView;
use crate::{ReportError, Result, ScreenKind, Selection};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub const MISSING_QUIZ_FILTERS: &str = "Please select unit(s) and a test.";
pub const UNKNOWN_QUIZ: &str = "Invalid test selection. Please select a valid test.";
pub const MISSING_COMPETENCY_FILTERS: &str = "Please select both Units and a Competency.";
pub const UNKNOWN_COMPETENCY: &str = "Invalid competency selected.";

/// Filter panel state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub units: Vec<String>,
    /// Quiz name (or id) picked from the quiz list
    pub quiz: Option<String>,
    /// Quiz id used as-is, without a quiz list lookup
    pub quiz_id: Option<String>,
    /// Competency name
    pub competency: Option<String>,
}

/// Result of one load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(TableView),
    /// Valid response without any rows
    NoData,
    /// A newer load started while this one was in flight
    Stale { generation: u64 },
}

pub struct ScreenController<B> {
    screen: ScreenKind,
    backend: B,
    directory: DirectoryIndex,
    quizzes: Vec<QuizInfo>,
    notices: Vec<String>,
    generation: AtomicU64,
}

impl<B: ReportBackend> ScreenController<B> {
    /// Fetch the directory (and the quiz list on quiz screens).
    ///
    /// Failures are kept as inline notices; the controller still mounts with
    /// an empty directory, which means "no columns".
    pub async fn mount(screen: ScreenKind, backend: B) -> Self {
        let mut notices = Vec::new();

        let directory = match backend
            .directory()
            .await
            .and_then(|response| DirectoryIndex::from_response(&response))
        {
            Ok(directory) => directory,
            Err(err) => {
                warn!(%screen, error = %err, "directory unavailable");
                notices.push(err.user_message());
                DirectoryIndex::empty()
            }
        };

        let quizzes = if screen.filter() == FilterKind::Quiz {
            match backend
                .quiz_list()
                .await
                .and_then(|response| parse_quiz_list(&response))
            {
                Ok(quizzes) => quizzes,
                Err(err) => {
                    warn!(%screen, error = %err, "quiz list unavailable");
                    notices.push(err.user_message());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            screen,
            backend,
            directory,
            quizzes,
            notices,
            generation: AtomicU64::new(0),
        }
    }

    pub fn screen(&self) -> ScreenKind {
        self.screen
    }

    pub fn directory(&self) -> &DirectoryIndex {
        &self.directory
    }

    pub fn quizzes(&self) -> &[QuizInfo] {
        &self.quizzes
    }

    /// Inline messages from mount-time failures
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn units(&self) -> Result<Vec<String>> {
        parse_unit_list(&self.backend.unit_list().await?)
    }

    /// Check the filters and resolve the selection, without any request
    pub fn resolve(&self, filters: &Filters) -> Result<Selection> {
        match self.screen.filter() {
            FilterKind::Quiz => {
                let invalid = || ReportError::InvalidSelection(MISSING_QUIZ_FILTERS.to_string());
                if filters.units.is_empty() {
                    return Err(invalid());
                }
                if let Some(id) = &filters.quiz_id {
                    let name = self
                        .quizzes
                        .iter()
                        .find(|q| &q.id == id)
                        .map_or_else(|| id.clone(), |q| q.name.clone());
                    return Ok(Selection::Quiz {
                        id: id.clone(),
                        name,
                    });
                }
                let wanted = filters.quiz.as_deref().ok_or_else(invalid)?;
                let quiz = find_quiz(&self.quizzes, wanted)
                    .ok_or_else(|| ReportError::InvalidSelection(UNKNOWN_QUIZ.to_string()))?;
                Ok(Selection::Quiz {
                    id: quiz.id.clone(),
                    name: quiz.name.clone(),
                })
            }
            FilterKind::Competency => {
                let wanted = match (&filters.competency, filters.units.is_empty()) {
                    (Some(name), false) => name,
                    _ => {
                        return Err(ReportError::InvalidSelection(
                            MISSING_COMPETENCY_FILTERS.to_string(),
                        ))
                    }
                };
                let entry = self.directory.competency_by_name(wanted).ok_or_else(|| {
                    ReportError::InvalidSelection(UNKNOWN_COMPETENCY.to_string())
                })?;
                Ok(Selection::Competency {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                })
            }
        }
    }

    /// Validate, fetch and aggregate. Out-of-generation responses, successful
    /// or not, come back as `Stale`.
    pub async fn apply(&self, filters: &Filters) -> Result<LoadOutcome> {
        let selection = self.resolve(filters)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = ReportRequest::new(&filters.units, &selection);
        debug!(screen = %self.screen, generation, selection = selection.id(), "loading report");

        let response = self.backend.report(self.screen.endpoint(), &request).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(screen = %self.screen, generation, "discarding stale report response");
            return Ok(LoadOutcome::Stale { generation });
        }

        let data = report_data(response?)?;
        let table = build_table(self.screen, selection, &data, &self.directory);
        if table.is_empty() {
            return Ok(LoadOutcome::NoData);
        }
        Ok(LoadOutcome::Loaded(TableView::new(table)))
    }
}
