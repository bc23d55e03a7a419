//! Screen controller: filter validation, load outcomes and stale responses.

use serde_json::Value;
use skillgrid::client::{FileBackend, ReportBackend, ReportRequest};
use skillgrid::controller::{
    Filters, LoadOutcome, ScreenController, MISSING_COMPETENCY_FILTERS, MISSING_QUIZ_FILTERS,
    UNKNOWN_COMPETENCY, UNKNOWN_QUIZ,
};
use skillgrid::{ReportError, Result, ScreenKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fixture(name: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Backend that counts report requests; the first one is slow
struct SlowFirstBackend {
    report: Value,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ReportRequest>>>,
}

impl SlowFirstBackend {
    fn new(report: &str) -> Self {
        Self {
            report: fixture(report),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ReportBackend for SlowFirstBackend {
    async fn unit_list(&self) -> Result<Value> {
        Ok(fixture("units.json"))
    }

    async fn quiz_list(&self) -> Result<Value> {
        Ok(fixture("quizzes.json"))
    }

    async fn directory(&self) -> Result<Value> {
        Ok(fixture("directory.json"))
    }

    async fn department_list(&self, _units: &[String]) -> Result<Value> {
        Ok(fixture("departments.json"))
    }

    async fn report(&self, _endpoint: &str, request: &ReportRequest) -> Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let delay = if call == 0 { 500 } else { 10 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(self.report.clone())
    }
}

fn quiz_filters(units: &[&str], quiz: Option<&str>) -> Filters {
    Filters {
        units: units.iter().map(|u| u.to_string()).collect(),
        quiz: quiz.map(str::to_string),
        ..Default::default()
    }
}

fn invalid_message(result: Result<LoadOutcome>) -> String {
    match result {
        Err(ReportError::InvalidSelection(message)) => message,
        Err(other) => panic!("expected invalid selection, got {:?}", other),
        Ok(_) => panic!("expected invalid selection, got a load"),
    }
}

#[tokio::test]
async fn invalid_filters_send_no_request() {
    let backend = SlowFirstBackend::new("report_user_main.json");
    let calls = backend.calls.clone();
    let controller = ScreenController::mount(ScreenKind::UserMain, backend).await;

    let message = invalid_message(controller.apply(&quiz_filters(&[], Some("Midterm"))).await);
    assert_eq!(message, MISSING_QUIZ_FILTERS);

    let message = invalid_message(controller.apply(&quiz_filters(&["Pune"], None)).await);
    assert_eq!(message, MISSING_QUIZ_FILTERS);

    let message =
        invalid_message(controller.apply(&quiz_filters(&["Pune"], Some("Finals"))).await);
    assert_eq!(message, UNKNOWN_QUIZ);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(controller.generation(), 0);
}

#[tokio::test]
async fn competency_screens_validate_name() {
    let backend = SlowFirstBackend::new("report_user_sub.json");
    let calls = backend.calls.clone();
    let controller = ScreenController::mount(ScreenKind::UserSub, backend).await;
    assert!(controller.quizzes().is_empty());

    let missing = Filters {
        units: vec!["Pune".into()],
        ..Default::default()
    };
    assert_eq!(
        invalid_message(controller.apply(&missing).await),
        MISSING_COMPETENCY_FILTERS
    );

    let unknown = Filters {
        units: vec!["Pune".into()],
        competency: Some("Astrophysics".into()),
        ..Default::default()
    };
    assert_eq!(invalid_message(controller.apply(&unknown).await), UNKNOWN_COMPETENCY);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn quiz_name_resolves_to_id_in_request() {
    let backend = SlowFirstBackend::new("report_user_main.json");
    let requests = backend.requests.clone();
    let controller = ScreenController::mount(ScreenKind::UserMain, backend).await;

    let outcome = controller
        .apply(&quiz_filters(&["Pune", "Nagpur"], Some("Midterm")))
        .await
        .unwrap();
    // quiz 42 is not in the saved report, so every student is filtered out
    assert!(matches!(outcome, LoadOutcome::NoData));

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].quiz_id, Some(vec!["42".to_string()]));
    assert_eq!(sent[0].unit, vec!["Pune", "Nagpur"]);
    assert_eq!(sent[0].section_id, None);
}

#[tokio::test]
async fn competency_request_carries_section_id() {
    let backend = SlowFirstBackend::new("report_unit_sub.json");
    let requests = backend.requests.clone();
    let controller = ScreenController::mount(ScreenKind::UnitSub, backend).await;

    let filters = Filters {
        units: vec!["Pune".into()],
        competency: Some("effective communication".into()),
        ..Default::default()
    };
    let LoadOutcome::Loaded(view) = controller.apply(&filters).await.unwrap() else {
        panic!("expected a loaded table");
    };
    assert_eq!(view.table().columns.len(), 2);
    assert_eq!(requests.lock().unwrap()[0].section_id, Some(vec!["s1".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let backend = SlowFirstBackend::new("report_user_main.json");
    let controller = ScreenController::mount(ScreenKind::UserMain, backend).await;
    let first = quiz_filters(&["Pune"], Some("Baseline Assessment"));
    let second = quiz_filters(&["Pune", "Nagpur"], Some("Baseline Assessment"));

    let (slow, fast) = tokio::join!(controller.apply(&first), controller.apply(&second));

    assert!(matches!(slow.unwrap(), LoadOutcome::Stale { generation: 1 }));
    match fast.unwrap() {
        LoadOutcome::Loaded(view) => assert_eq!(view.table().rows.len(), 3),
        other => panic!("expected the newer load to win, got {:?}", other),
    }
    assert_eq!(controller.generation(), 2);
}

#[tokio::test]
async fn mount_failures_become_notices() {
    let backend = FileBackend::new().with_report(fixture("report_unit_main.json"));
    let controller = ScreenController::mount(ScreenKind::UnitMain, backend).await;

    assert_eq!(controller.notices().len(), 2);
    assert!(controller.directory().is_empty());
    assert!(controller.quizzes().is_empty());

    let filters = Filters {
        units: vec!["Pune".into()],
        quiz_id: Some("q1".into()),
        ..Default::default()
    };
    let LoadOutcome::Loaded(view) = controller.apply(&filters).await.unwrap() else {
        panic!("expected a loaded table");
    };
    assert!(view.table().columns.is_empty());
    assert_eq!(view.table().rows.len(), 3);
}

#[tokio::test]
async fn error_envelope_is_data_format() {
    let backend = FileBackend::new()
        .with_directory(fixture("directory.json"))
        .with_report(fixture("report_error.json"));
    let controller = ScreenController::mount(ScreenKind::UnitMain, backend).await;
    let filters = Filters {
        units: vec!["Pune".into()],
        quiz_id: Some("q1".into()),
        ..Default::default()
    };
    let err = controller.apply(&filters).await.unwrap_err();
    assert_eq!(err, ReportError::DataFormat("quiz not found".into()));
}

#[tokio::test]
async fn units_come_from_backend() {
    let controller =
        ScreenController::mount(ScreenKind::UnitMain, SlowFirstBackend::new("report_empty.json"))
            .await;
    assert_eq!(controller.units().await.unwrap(), vec!["Mumbai", "Nagpur", "Pune"]);
}
