//! Backend access: the `ReportBackend` seam, the reqwest client and an
//! in-memory backend for saved responses

use crate::{ReportError, Result, Selection};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const UNIT_LIST: &str = "getUnitList";
pub const QUIZ_LIST: &str = "getQuizList";
pub const DIRECTORY: &str = "getSubCompetency";
pub const DEPARTMENT_LIST: &str = "getDepartmentList";

/// Body of every report request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub unit: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<Vec<String>>,
}

impl ReportRequest {
    /// `{unit, quiz_id: [id]}` for quizzes, `{unit, section_id: [id]}` for competencies
    pub fn new(units: &[String], selection: &Selection) -> Self {
        let id = vec![selection.id().to_string()];
        let (quiz_id, section_id) = match selection {
            Selection::Quiz { .. } => (Some(id), None),
            Selection::Competency { .. } => (None, Some(id)),
        };
        Self {
            unit: units.to_vec(),
            quiz_id,
            section_id,
        }
    }
}

/// Source of raw backend responses
pub trait ReportBackend: Send + Sync {
    fn unit_list(&self) -> impl Future<Output = Result<Value>> + Send;

    fn quiz_list(&self) -> impl Future<Output = Result<Value>> + Send;

    /// Competency/topic definitions (`getSubCompetency`)
    fn directory(&self) -> impl Future<Output = Result<Value>> + Send;

    fn department_list(&self, units: &[String]) -> impl Future<Output = Result<Value>> + Send;

    fn report(
        &self,
        endpoint: &str,
        request: &ReportRequest,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Unwrap `{status: "success", data: ...}`; the backend's `message` becomes
/// the error detail otherwise
pub fn report_data(response: Value) -> Result<Value> {
    let Value::Object(mut envelope) = response else {
        return Err(ReportError::DataFormat(
            "report response is not a JSON object".to_string(),
        ));
    };
    if envelope.get("status").and_then(Value::as_str) != Some("success") {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("status is not 'success'");
        return Err(ReportError::DataFormat(message.to_string()));
    }
    envelope
        .remove("data")
        .ok_or_else(|| ReportError::DataFormat("report response has no 'data'".to_string()))
}

/// HTTP backend: `POST {base_url}/reportanalytics/{endpoint}` with a JSON body
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/reportanalytics/{}", self.base_url, endpoint)
    }

    async fn post<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let url = self.url(endpoint);
        debug!(%url, "POST");

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ReportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReportError::Network(format!("{}: {}", status, text)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ReportError::DataFormat(e.to_string()))
    }
}

#[derive(Serialize)]
struct UnitFilter<'a> {
    unit: &'a [String],
}

impl ReportBackend for HttpBackend {
    async fn unit_list(&self) -> Result<Value> {
        self.post(UNIT_LIST, &serde_json::json!({})).await
    }

    async fn quiz_list(&self) -> Result<Value> {
        self.post(QUIZ_LIST, &serde_json::json!({})).await
    }

    async fn directory(&self) -> Result<Value> {
        self.post(DIRECTORY, &serde_json::json!({})).await
    }

    async fn department_list(&self, units: &[String]) -> Result<Value> {
        self.post(DEPARTMENT_LIST, &UnitFilter { unit: units }).await
    }

    async fn report(&self, endpoint: &str, request: &ReportRequest) -> Result<Value> {
        self.post(endpoint, request).await
    }
}

/// Serves responses loaded ahead of time, e.g. from JSON files
#[derive(Debug, Clone, Default)]
pub struct FileBackend {
    units: Option<Value>,
    quizzes: Option<Value>,
    directory: Option<Value>,
    departments: Option<Value>,
    report: Option<Value>,
}

impl FileBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, response: Value) -> Self {
        self.units = Some(response);
        self
    }

    pub fn with_quizzes(mut self, response: Value) -> Self {
        self.quizzes = Some(response);
        self
    }

    pub fn with_directory(mut self, response: Value) -> Self {
        self.directory = Some(response);
        self
    }

    pub fn with_departments(mut self, response: Value) -> Self {
        self.departments = Some(response);
        self
    }

    /// Response returned for every report endpoint
    pub fn with_report(mut self, response: Value) -> Self {
        self.report = Some(response);
        self
    }

    fn serve(slot: &Option<Value>, what: &str) -> Result<Value> {
        slot.clone()
            .ok_or_else(|| ReportError::Network(format!("no saved response for {}", what)))
    }
}

impl ReportBackend for FileBackend {
    async fn unit_list(&self) -> Result<Value> {
        Self::serve(&self.units, UNIT_LIST)
    }

    async fn quiz_list(&self) -> Result<Value> {
        Self::serve(&self.quizzes, QUIZ_LIST)
    }

    async fn directory(&self) -> Result<Value> {
        Self::serve(&self.directory, DIRECTORY)
    }

    async fn department_list(&self, _units: &[String]) -> Result<Value> {
        Self::serve(&self.departments, DEPARTMENT_LIST)
    }

    async fn report(&self, endpoint: &str, _request: &ReportRequest) -> Result<Value> {
        Self::serve(&self.report, endpoint)
    }
}
