//! Error taxonomy for fetching, shaping and exporting reports

use thiserror::Error;

/// Errors raised between the backend boundary and the export sink.
///
/// `NoData` is a display state rather than a failure: callers render it as
/// "no data, please select filters" and carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// Request failed or was rejected (transport error, non-2xx status)
    #[error("network error: {0}")]
    Network(String),
    /// Response arrived but lacks the expected `status: success` / shape
    #[error("unexpected response format: {0}")]
    DataFormat(String),
    /// Valid but empty result set
    #[error("no data available for the selected filters")]
    NoData,
    /// Workbook serialization or file save failed
    #[error("export failed: {0}")]
    Export(String),
    /// Filters are incomplete or name something that does not exist
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl ReportError {
    /// Inline text shown in the affected panel.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Network(_) => {
                "Failed to fetch report. Please check your connection and try again.".to_string()
            }
            ReportError::DataFormat(detail) => {
                format!("Received invalid data format from server: {}", detail)
            }
            ReportError::NoData => "No data available. Please select filters.".to_string(),
            ReportError::Export(detail) => format!("Error generating Excel file: {}", detail),
            ReportError::InvalidSelection(detail) => detail.clone(),
        }
    }

    /// Whether this error is the "empty but valid" state
    pub fn is_no_data(&self) -> bool {
        matches!(self, ReportError::NoData)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
