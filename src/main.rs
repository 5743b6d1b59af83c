//! LearnGap - learning-gap analysis CLI
//!
//! Loads an assessment response spreadsheet, analyses cohort and
//! per-student performance, and writes text or JSON reports plus an
//! optional multi-sheet spreadsheet export.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, unreadable input, missing columns, ...)

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use learngap::cli::Args;
use learngap::config::{Config, OutputFormat, CONFIG_FILE_NAME};
use learngap::loader::{LoadOptions, SheetLoader};
use learngap::models::{AnalysisResult, ResponseTable};
use learngap::report::{self, json};
use learngap::{analysis, AnalysisError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config can raise the log level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("LearnGap v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .learngap.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose the sheet, output format and export path.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis workflow. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("An input spreadsheet is required (--input)")?;
    let options = LoadOptions::from(&config.loader);

    // Handle --dry-run: load, check columns and exit
    if args.dry_run {
        return handle_dry_run(&input, options);
    }

    // Step 1: Load and analyse as a single unit of work
    let show_spinner = !args.quiet
        && !(config.report.format == OutputFormat::Json && config.report.output.is_none());
    let spinner = if show_spinner {
        Some(start_spinner(&input))
    } else {
        None
    };

    let outcome =
        analyze_with_timeout(input.clone(), options, config.general.timeout_seconds).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let outcome = outcome?;

    // JSON consumers get a failure envelope as well as the exit code
    if let Err(ref e) = outcome {
        if config.report.format == OutputFormat::Json {
            let text = json::encode_value(&json::failure_envelope(e))?;
            write_output(config.report.output.as_deref(), &text)?;
        }
    }
    let result = outcome?;

    info!(
        "Analysed {} students across {} questions",
        result.students.len(),
        result.cohort.question_wise().len()
    );

    // Step 2: Render the report
    let output = match config.report.format {
        OutputFormat::Text => report::generate_full_report(&result, config.report.top_n),
        OutputFormat::Json => json::encode_value(&json::success_envelope(&result)?)?,
    };
    write_output(config.report.output.as_deref(), &output)?;

    // Step 3: Optional spreadsheet export
    if let Some(ref export_path) = config.export.path {
        report::export_to_path(&result, Path::new(export_path))?;
        info!("Spreadsheet exported to {}", export_path);
    }

    if !args.quiet {
        print_summary(&result, &config, start_time.elapsed());
    }

    Ok(0)
}

/// Run the blocking load-and-analyse call, optionally bounded by a timeout.
///
/// The outer error covers the timeout and task failures; the inner result
/// is the analysis outcome itself.
async fn analyze_with_timeout(
    input: PathBuf,
    options: LoadOptions,
    timeout_seconds: Option<u64>,
) -> Result<Result<AnalysisResult, AnalysisError>> {
    let task = tokio::task::spawn_blocking(move || analysis::analyze_with(&input, &options));

    let joined = match timeout_seconds {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| anyhow!("Analysis timed out after {}s", secs))?,
        None => task.await,
    };

    joined.context("Analysis task failed")
}

fn start_spinner(input: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("Analysing {}", input.display()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Write to the output file, or stdout when none is configured.
fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn print_summary(result: &AnalysisResult, config: &Config, elapsed: Duration) {
    eprintln!("\n📊 Analysis Summary:");
    eprintln!("   Students: {}", result.students.len());
    eprintln!("   Questions: {}", result.cohort.question_wise().len());
    eprintln!(
        "   Weak questions (< 70%): {}",
        result.cohort.weak_questions().count()
    );
    if let Some(mean) = result.mean_student_accuracy() {
        eprintln!("   Average accuracy: {:.1}%", mean * 100.0);
    }
    eprintln!("   Duration: {:.2}s", elapsed.as_secs_f64());

    if let Some(ref output) = config.report.output {
        eprintln!("\n✅ Report saved to: {}", output);
    }
    if let Some(ref export) = config.export.path {
        eprintln!("✅ Spreadsheet saved to: {}", export);
    }
}

/// Handle --dry-run: load the sheet, print what would be analysed, exit.
fn handle_dry_run(input: &Path, options: LoadOptions) -> Result<i32> {
    eprintln!("\n🔍 Dry run: loading {} (no analysis)...\n", input.display());

    let table = SheetLoader::new(options).load_path(input)?;
    let (students, questions, skipped) = table_counts(&table);

    eprintln!("   All required columns present.");
    eprintln!("   Rows: {}", table.len());
    eprintln!("   Students: {}", students);
    eprintln!("   Questions: {}", questions);
    if skipped > 0 {
        eprintln!("   Rows without a student or question id: {}", skipped);
    }

    eprintln!("\n✅ Dry run complete. Nothing was analysed.");
    Ok(0)
}

fn table_counts(table: &ResponseTable) -> (usize, usize, usize) {
    let students: HashSet<&str> = table.groupable().map(|r| r.student_id.as_str()).collect();
    let questions: HashSet<&str> = table.with_question().map(|r| r.question_id.as_str()).collect();
    let skipped = table.len() - table.groupable().count();
    (students.len(), questions.len(), skipped)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // An explicit path must exist and parse
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
