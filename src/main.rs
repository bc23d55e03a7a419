//! Skillgrid: competency score report CLI

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use skillgrid::client::{HttpBackend, FileBackend, ReportBackend};
use skillgrid::config::{resolve_settings, starter_config, CliOverrides, Settings, CONFIG_FILENAME};
use skillgrid::controller::{Filters, LoadOutcome, ScreenController};
use skillgrid::directory::{parse_department_list, parse_quiz_list, DirectoryIndex};
use skillgrid::export::{export_view, NO_ROWS_MESSAGE};
use skillgrid::reporter::{ConsoleReporter, JsonReporter};
use skillgrid::view::SortKey;
use skillgrid::{ReportError, ScreenKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Skillgrid: competency and quiz score reports
#[derive(Parser, Debug)]
#[command(name = "skillgrid")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: search .skillgridrc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend root URL (overrides SKILLGRID_BASE_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output format as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(flatten)]
    inputs: FileInputs,
}

/// Saved backend responses read from files instead of the HTTP API
#[derive(ClapArgs, Debug, Default)]
struct FileInputs {
    /// getSubCompetency response
    #[arg(long, global = true, value_name = "FILE")]
    directory_file: Option<PathBuf>,

    /// Report endpoint response
    #[arg(long, global = true, value_name = "FILE")]
    report_file: Option<PathBuf>,

    /// getUnitList response
    #[arg(long, global = true, value_name = "FILE")]
    units_file: Option<PathBuf>,

    /// getQuizList response
    #[arg(long, global = true, value_name = "FILE")]
    quizzes_file: Option<PathBuf>,

    /// getDepartmentList response
    #[arg(long, global = true, value_name = "FILE")]
    departments_file: Option<PathBuf>,
}

impl FileInputs {
    fn has_any(&self) -> bool {
        self.directory_file.is_some()
            || self.report_file.is_some()
            || self.units_file.is_some()
            || self.quizzes_file.is_some()
            || self.departments_file.is_some()
    }

    fn backend(&self) -> Result<FileBackend> {
        let mut backend = FileBackend::new();
        if let Some(path) = &self.directory_file {
            backend = backend.with_directory(read_json(path)?);
        }
        if let Some(path) = &self.report_file {
            backend = backend.with_report(read_json(path)?);
        }
        if let Some(path) = &self.units_file {
            backend = backend.with_units(read_json(path)?);
        }
        if let Some(path) = &self.quizzes_file {
            backend = backend.with_quizzes(read_json(path)?);
        }
        if let Some(path) = &self.departments_file {
            backend = backend.with_departments(read_json(path)?);
        }
        Ok(backend)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the units available for selection
    Units,

    /// List the quizzes (tests) available for selection
    Quizzes,

    /// List competencies with their abbreviation and max score
    Competencies {
        /// Show the topics of this competency instead
        #[arg(long, value_name = "NAME")]
        topics_of: Option<String>,
    },

    /// List the departments of the given units
    Departments {
        /// Unit name (repeatable)
        #[arg(long = "unit", value_name = "UNIT")]
        units: Vec<String>,
    },

    /// Build a report for one screen: unit-main, user-main, user-sub, unit-sub
    Report(ReportArgs),

    /// Create .skillgridrc.json with sensible defaults
    Init {
        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Backend root URL written into the config
        #[arg(long = "url", value_name = "URL")]
        url: Option<String>,

        /// Default unit (repeatable)
        #[arg(long = "unit", value_name = "UNIT")]
        units: Vec<String>,
    },
}

#[derive(ClapArgs, Debug)]
struct ReportArgs {
    /// Report screen
    screen: ScreenKind,

    /// Unit name (repeatable; default: units from the config file)
    #[arg(long = "unit", value_name = "UNIT")]
    units: Vec<String>,

    /// Select every unit the backend lists
    #[arg(long, conflicts_with = "units")]
    all_units: bool,

    /// Quiz name (quiz screens)
    #[arg(long)]
    quiz: Option<String>,

    /// Quiz id, used without looking it up (quiz screens)
    #[arg(long, conflicts_with = "quiz")]
    quiz_id: Option<String>,

    /// Competency name (sub-competency screens)
    #[arg(long)]
    competency: Option<String>,

    /// Case-insensitive search over the screen's text columns
    #[arg(long)]
    search: Option<String>,

    /// Header click (repeatable): sno, name, unit, department, totalScore,
    /// score_<id>, percentile_<id>, unitPercentile_<id>. Clicking the same
    /// column again goes asc -> desc -> unsorted.
    #[arg(long = "sort", value_name = "KEY")]
    sort: Vec<SortKey>,

    /// Write an .xlsx workbook
    #[arg(long)]
    export: bool,

    /// Output directory for the workbook (default: outputDir from config)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Disable colors
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("skillgrid=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_env("SKILLGRID_LOG")
            .unwrap_or_else(|_| "skillgrid=warn".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Commands::Init { dir, url, units } = &args.command {
        return run_init(dir.as_deref(), url.as_deref(), units);
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let out = match &args.command {
        Commands::Report(report) => report.out.clone(),
        _ => None,
    };
    let settings = resolve_settings(
        &cwd,
        args.config.as_deref(),
        &CliOverrides {
            base_url: args.base_url.clone(),
            timeout_secs: args.timeout,
            output_dir: out,
        },
    )?;

    if args.inputs.has_any() {
        debug!("using saved responses");
        let backend = args.inputs.backend()?;
        execute(backend, &args, &settings).await
    } else {
        debug!(base_url = %settings.base_url, "using backend");
        let backend = HttpBackend::new(&settings.base_url, settings.timeout)?;
        execute(backend, &args, &settings).await
    }
}

async fn execute<B: ReportBackend>(backend: B, args: &Args, settings: &Settings) -> Result<ExitCode> {
    let console = ConsoleReporter::new();
    let json = JsonReporter::new().pretty();

    match &args.command {
        Commands::Units => {
            let response = backend.unit_list().await.map_err(user_error)?;
            let units = skillgrid::directory::parse_unit_list(&response).map_err(user_error)?;
            if args.json {
                println!("{}", json.report_list(&units));
            } else {
                console.report_list("Units", &units);
            }
        }
        Commands::Quizzes => {
            let response = backend.quiz_list().await.map_err(user_error)?;
            let quizzes = parse_quiz_list(&response).map_err(user_error)?;
            if args.json {
                println!("{}", json.report_list(&quizzes));
            } else {
                let lines: Vec<String> = quizzes
                    .iter()
                    .map(|q| format!("{}  {}", q.id, q.name))
                    .collect();
                console.report_list("Quizzes", &lines);
            }
        }
        Commands::Competencies { topics_of } => {
            let response = backend.directory().await.map_err(user_error)?;
            let directory = DirectoryIndex::from_response(&response).map_err(user_error)?;
            let (title, entries) = match topics_of {
                Some(name) => {
                    let competency = directory
                        .competency_by_name(name)
                        .ok_or_else(|| user_error(ReportError::InvalidSelection(
                            skillgrid::controller::UNKNOWN_COMPETENCY.to_string(),
                        )))?;
                    (
                        format!("Topics of {}", competency.name),
                        directory.topics_of(&competency.name),
                    )
                }
                None => (
                    "Competencies".to_string(),
                    directory.competencies().iter().collect(),
                ),
            };
            if args.json {
                println!("{}", json.report_list(&entries));
            } else {
                let lines: Vec<String> = entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{:<6} {} (Out of {})",
                            e.abbreviation, e.name, e.max_score.label
                        )
                    })
                    .collect();
                console.report_list(&title, &lines);
            }
            if directory.skipped() > 0 {
                warn!(skipped = directory.skipped(), "directory entries without a usable id");
            }
        }
        Commands::Departments { units } => {
            let units = if units.is_empty() {
                settings.units.clone()
            } else {
                units.clone()
            };
            let response = backend.department_list(&units).await.map_err(user_error)?;
            let departments = parse_department_list(&response).map_err(user_error)?;
            if args.json {
                println!("{}", json.report_list(&departments));
            } else {
                console.report_list("Departments", &departments);
            }
        }
        Commands::Report(report) => return run_report(backend, report, args, settings).await,
        Commands::Init { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_report<B: ReportBackend>(
    backend: B,
    report: &ReportArgs,
    args: &Args,
    settings: &Settings,
) -> Result<ExitCode> {
    let mut console = ConsoleReporter::new();
    if report.no_color {
        console = console.without_colors();
    }
    if args.verbose {
        console = console.verbose();
    }

    let title = report.screen.title();
    if !args.json {
        console.report_loading(&format!("{} filters", title));
    }
    let controller = ScreenController::mount(report.screen, backend).await;
    console.report_notices(controller.notices());

    let units = if report.all_units {
        controller.units().await.map_err(user_error)?
    } else if report.units.is_empty() {
        settings.units.clone()
    } else {
        report.units.clone()
    };
    let filters = Filters {
        units,
        quiz: report.quiz.clone(),
        quiz_id: report.quiz_id.clone(),
        competency: report.competency.clone(),
    };

    if !args.json {
        console.report_loading(title);
    }
    let mut view = match controller.apply(&filters).await.map_err(user_error)? {
        LoadOutcome::Loaded(view) => view,
        LoadOutcome::NoData => {
            if report.export {
                anyhow::bail!(NO_ROWS_MESSAGE);
            }
            if args.json {
                println!("{}", JsonReporter::new().report_list::<Value>(&[]));
            } else {
                console.report_no_data(&ReportError::NoData.user_message());
            }
            return Ok(ExitCode::SUCCESS);
        }
        LoadOutcome::Stale { generation } => {
            anyhow::bail!("report load {} was superseded", generation)
        }
    };

    if let Some(term) = &report.search {
        view.set_search(term.as_str());
    }
    for key in &report.sort {
        view.click(key.clone());
    }

    if args.json {
        println!("{}", JsonReporter::new().pretty().report(&view));
    } else {
        console.report(&view);
    }

    if report.export {
        if let Err(e) = fs::create_dir_all(&settings.output_dir) {
            warn!(dir = %settings.output_dir.display(), error = %e, "could not create output directory");
        }
        let today = chrono::Local::now().date_naive();
        let path = export_view(&view, &settings.output_dir, &settings.fallback_dir, today)
            .map_err(user_error)?;
        eprintln!("{} Saved {}", "Done".green().bold(), path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn run_init(dir: Option<&Path>, url: Option<&str>, units: &[String]) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let json = starter_config(url.unwrap_or(skillgrid::config::DEFAULT_BASE_URL), units)?;
    fs::write(&config_path, json)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    eprintln!("{} Created {}", "Done".green().bold(), config_path.display());
    Ok(ExitCode::SUCCESS)
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Surface the inline message; the detail goes to the debug log
fn user_error(err: ReportError) -> anyhow::Error {
    debug!(error = %err, "request failed");
    anyhow::anyhow!(err.user_message())
}
