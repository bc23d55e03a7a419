//! CLI behavior tests: exit codes, output formats, export, init.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs in an empty temp dir so no stray .skillgridrc.json is picked up
fn skillgrid_cmd(work_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skillgrid"));
    cmd.current_dir(work_dir.path())
        .env_remove("SKILLGRID_BASE_URL")
        .env_remove("SKILLGRID_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn report_cmd(work_dir: &TempDir, screen: &str, report: &str) -> Command {
    let mut cmd = skillgrid_cmd(work_dir);
    cmd.arg("report")
        .arg(screen)
        .arg("--directory-file")
        .arg(fixture("directory.json"))
        .arg("--report-file")
        .arg(fixture(report));
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let s = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(s.trim()).expect("valid JSON")
}

#[test]
fn no_args_returns_error_not_panic() {
    let dir = TempDir::new().unwrap();
    skillgrid_cmd(&dir).assert().failure().code(2);
}

#[test]
fn unknown_screen_is_rejected() {
    let dir = TempDir::new().unwrap();
    skillgrid_cmd(&dir)
        .arg("report")
        .arg("weekly")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown screen"));
}

#[test]
fn units_are_sorted_and_deduplicated() {
    let dir = TempDir::new().unwrap();
    let mut cmd = skillgrid_cmd(&dir);
    cmd.arg("units")
        .arg("--units-file")
        .arg(fixture("units.json"))
        .arg("--json");
    let parsed = stdout_json(&mut cmd);
    assert_eq!(parsed, serde_json::json!(["Mumbai", "Nagpur", "Pune"]));
}

#[test]
fn list_fetch_failure_uses_inline_message() {
    let dir = TempDir::new().unwrap();
    skillgrid_cmd(&dir)
        .arg("units")
        .arg("--directory-file")
        .arg(fixture("directory.json"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(
            "Failed to fetch report. Please check your connection and try again.",
        ))
        .stderr(predicate::str::contains("network error").not());
}

#[test]
fn competencies_list_abbreviations_and_max() {
    let dir = TempDir::new().unwrap();
    skillgrid_cmd(&dir)
        .arg("competencies")
        .arg("--directory-file")
        .arg(fixture("directory.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("SHC"))
        .stdout(predicate::str::contains("Stress/Handling Capacity (Out of 6)"));
}

#[test]
fn topics_of_competency() {
    let dir = TempDir::new().unwrap();
    let mut cmd = skillgrid_cmd(&dir);
    cmd.arg("competencies")
        .arg("--topics-of")
        .arg("effective communication")
        .arg("--directory-file")
        .arg(fixture("directory.json"))
        .arg("--json");
    let parsed = stdout_json(&mut cmd);
    let ids: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[test]
fn departments_list() {
    let dir = TempDir::new().unwrap();
    skillgrid_cmd(&dir)
        .arg("departments")
        .arg("--unit")
        .arg("Pune")
        .arg("--departments-file")
        .arg(fixture("departments.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Cardiology"));
}

#[test]
fn user_main_json_output() {
    let dir = TempDir::new().unwrap();
    let mut cmd = report_cmd(&dir, "user-main", "report_user_main.json");
    cmd.args(["--unit", "Pune", "--unit", "Nagpur", "--quiz-id", "q1", "--json"]);
    let parsed = stdout_json(&mut cmd);

    assert_eq!(parsed["screen"], "user-main");
    assert_eq!(parsed["totalMax"], "13.0");
    let abbreviations: Vec<&str> = parsed["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["abbreviation"].as_str().unwrap())
        .collect();
    assert_eq!(abbreviations, vec!["EC", "L"]);

    let rows = parsed["rows"].as_array().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Meera Joshi", "Asha Patil", "Ravi Kumar"]);
    assert_eq!(rows[1]["totalScore"], 10.0);
    assert_eq!(rows[1]["scores"]["s1"]["unitPercentile"], "90");
}

#[test]
fn quiz_selected_by_name() {
    let dir = TempDir::new().unwrap();
    let mut cmd = report_cmd(&dir, "user-main", "report_user_main.json");
    cmd.args(["--unit", "Pune", "--quiz", "Baseline Assessment", "--json"])
        .arg("--quizzes-file")
        .arg(fixture("quizzes.json"));
    let parsed = stdout_json(&mut cmd);
    assert_eq!(parsed["selection"]["id"], "q1");
    assert_eq!(parsed["selection"]["name"], "Baseline Assessment");
}

#[test]
fn search_and_sort_shape_the_rows() {
    let dir = TempDir::new().unwrap();
    let mut cmd = report_cmd(&dir, "user-main", "report_user_main.json");
    cmd.args([
        "--unit", "Pune", "--quiz-id", "q1", "--sort", "totalScore", "--sort", "totalScore",
        "--json",
    ]);
    let parsed = stdout_json(&mut cmd);
    let rows = parsed["rows"].as_array().unwrap();
    assert_eq!(rows[0]["name"], "Asha Patil");
    assert_eq!(rows[0]["sno"], 1);
    assert_eq!(parsed["sort"]["direction"], "desc");

    let mut cmd = report_cmd(&dir, "user-main", "report_user_main.json");
    cmd.args(["--unit", "Pune", "--quiz-id", "q1", "--search", "CARDIO", "--json"]);
    let parsed = stdout_json(&mut cmd);
    let rows = parsed["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Meera Joshi");
}

#[test]
fn console_table_has_headers_and_legend() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_unit_main.json")
        .args(["--unit", "Pune", "--quiz-id", "q1", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total (Out of 14.0)"))
        .stdout(predicate::str::contains("SHC (Out of 6)"))
        .stdout(predicate::str::contains("Legend:"))
        .stdout(predicate::str::contains("EC - Effective Communication (Out of 8)"))
        .stdout(predicate::str::contains("9.25"));
}

#[test]
fn loading_status_is_shown_on_stderr() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_unit_main.json")
        .args(["--unit", "Pune", "--quiz-id", "q1"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Info Loading Unit-wise Main Competency Report filters...",
        ))
        .stderr(predicate::str::contains(
            "Info Loading Unit-wise Main Competency Report...",
        ))
        .stdout(predicate::str::contains("Loading").not());
}

#[test]
fn json_output_has_no_loading_status() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_unit_main.json")
        .args(["--unit", "Pune", "--quiz-id", "q1", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading").not());
}

#[test]
fn export_writes_xlsx() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");
    report_cmd(&dir, "unit-sub", "report_unit_sub.json")
        .args(["--unit", "Pune", "--competency", "Effective Communication", "--export"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved"));

    let files: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("UnitWiseSubCompetencyReport_Effective Communication_"));
    assert!(files[0].ends_with(".xlsx"));
    let bytes = fs::read(out.join(&files[0])).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn missing_filters_exit_2() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "user-main", "report_user_main.json")
        .args(["--quiz-id", "q1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Please select unit(s) and a test."));
}

#[test]
fn unknown_competency_exit_2() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "user-sub", "report_user_sub.json")
        .args(["--unit", "Pune", "--competency", "Astrophysics"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid competency selected."));
}

#[test]
fn empty_report_is_no_data_not_error() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_empty.json")
        .args(["--unit", "Pune", "--quiz-id", "q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No data available"));
}

#[test]
fn empty_report_export_refused() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_empty.json")
        .args(["--unit", "Pune", "--quiz-id", "q1", "--export"])
        .arg("--out")
        .arg(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No data available to download"));
    let xlsx = fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "xlsx"))
        .count();
    assert_eq!(xlsx, 0);
}

#[test]
fn backend_error_message_is_shown() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, "unit-main", "report_error.json")
        .args(["--unit", "Pune", "--quiz-id", "q1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("quiz not found"));
}

#[test]
fn units_from_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".skillgridrc.json"),
        r#"{"units": ["Pune"]}"#,
    )
    .unwrap();
    let mut cmd = report_cmd(&dir, "unit-main", "report_unit_main.json");
    cmd.args(["--quiz-id", "q1", "--json"]);
    let parsed = stdout_json(&mut cmd);
    assert_eq!(parsed["rows"].as_array().unwrap().len(), 3);
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".skillgridrc.json");
    skillgrid_cmd(&dir)
        .arg("init")
        .arg("--dir")
        .arg(dir.path())
        .args(["--url", "http://reports.local/api", "--unit", "Pune"])
        .assert()
        .success();
    assert!(config_path.exists(), ".skillgridrc.json should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("\"baseUrl\": \"http://reports.local/api\""));
    assert!(content.contains("\"timeoutSecs\""));
    assert!(content.contains("Pune"));
}

#[test]
fn init_keeps_existing_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".skillgridrc.json");
    fs::write(&config_path, "{}").unwrap();
    skillgrid_cmd(&dir)
        .arg("init")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "{}");
}
