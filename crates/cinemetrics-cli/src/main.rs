use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cinemetrics_catalog::{collect_records, FetchOutcome, RetryPolicy, RetryingSource, TmdbSource};
use cinemetrics_core::raw::{load_raw_records, save_raw_records};
use cinemetrics_core::{Config, Diagnostic, DiagnosticCode, RawRecord, RunReport, Severity, Table, Value};
use cinemetrics_engine::query::{self, DEFAULT_TOP};
use cinemetrics_engine::{AnalysisError, Analyzer, CsvFileSink, KpiRanking, PipelineOutput, TransformPipeline, Transformer};
use cinemetrics_viz::{ChartReport, Visualizer};

/// Config file picked up from the working directory
const DEFAULT_CONFIG: &str = "cinemetrics.toml";

/// Widest cell printed in terminal tables
const MAX_CELL_WIDTH: usize = 40;

/// Cinemetrics - movie catalog ETL and KPI analysis
#[derive(Parser)]
#[command(name = "cinemetrics")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: cinemetrics.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw movie records from the catalog API
    Fetch {
        /// Output file for raw records (default: paths.raw_records)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean raw records into the Clean Table CSV
    Transform {
        /// Raw records JSON (default: paths.raw_records)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Clean Table CSV (default: paths.clean_table)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print KPI rankings, franchise and director tables
    Analyze {
        /// Clean Table CSV (default: paths.clean_table)
        #[arg(long)]
        clean: Option<PathBuf>,

        /// Raw records for cast and director (default: paths.raw_records)
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Rows per ranking
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP)]
        top: usize,
    },

    /// Run the preset search queries
    Search {
        /// Clean Table CSV (default: paths.clean_table)
        #[arg(long)]
        clean: Option<PathBuf>,

        /// Raw records for cast and director (default: paths.raw_records)
        #[arg(long)]
        raw: Option<PathBuf>,
    },

    /// Render charts as SVG
    Visualize {
        /// Clean Table CSV (default: paths.clean_table)
        #[arg(long)]
        clean: Option<PathBuf>,

        /// Raw records for cast and director (default: paths.raw_records)
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Chart directory (default: paths.reports_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Fetch, transform, analyze and visualize in one go
    Run {
        /// Rows per ranking
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // API key may live in .env
    dotenvy::dotenv().ok();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Fetch { output } => fetch_command(&config, output).await,
        Commands::Transform { input, output } => transform_command(&config, input, output),
        Commands::Analyze { clean, raw, top } => analyze_command(&config, clean, raw, top),
        Commands::Search { clean, raw } => search_command(&config, clean, raw),
        Commands::Visualize { clean, raw, out_dir } => visualize_command(&config, clean, raw, out_dir),
        Commands::Run { top } => run_command(&config, top).await,
    }
}

/// Log to stderr; RUST_LOG wins unless --verbose is given
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!(
            "{} {} movies from {}",
            "Using".cyan(),
            config.source.movie_ids.len(),
            config.source.base_url
        );
    }

    Ok(config)
}

/// Fetch command - download raw records
async fn fetch_command(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.resolve(&config.paths.raw_records));

    let (outcome, retry_notes) = fetch_records(config).await?;
    save_raw_records(&outcome.records, &output)
        .with_context(|| format!("Failed to save raw records to {}", output.display()))?;

    print_fetch_summary(&outcome, &retry_notes, &output);
    Ok(())
}

/// Fetch every configured movie, retrying transient failures
async fn fetch_records(config: &Config) -> Result<(FetchOutcome, Vec<Diagnostic>)> {
    let api_key = config.api_key()?;
    let source = TmdbSource::from_config(&config.source, api_key)?;
    let source = RetryingSource::new(source, RetryPolicy::new(&config.source.retry));

    let delay = Duration::from_millis(config.source.request_delay_ms);
    let outcome = collect_records(&source, &config.source.movie_ids, delay).await;

    let mut notes = Vec::new();
    if source.retries() > 0 {
        notes.push(
            Diagnostic::new(
                DiagnosticCode::FetchRetried,
                Severity::Info,
                format!("{} request(s) retried after transient failures", source.retries()),
            )
            .with_stage("fetch"),
        );
    }

    Ok((outcome, notes))
}

/// Transform command - raw JSON to Clean Table CSV plus run report
fn transform_command(config: &Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.resolve(&config.paths.raw_records));
    let output = output.unwrap_or_else(|| config.resolve(&config.paths.clean_table));

    let records = load_raw_records(&input)
        .with_context(|| format!("Failed to load raw records from {}. Run the fetch step first.", input.display()))?;

    let result = transform_records(config, &records, &output, Vec::new())?;

    print_run_report(&result.report);
    if result.report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Run the pipeline, writing the Clean Table and its run report
///
/// `fetch_diagnostics` are folded into the report ahead of the
/// transformation diagnostics.
fn transform_records(
    config: &Config,
    records: &[RawRecord],
    output: &Path,
    fetch_diagnostics: Vec<Diagnostic>,
) -> Result<PipelineOutput> {
    let pipeline = TransformPipeline::new(Transformer::new(config.transform.clone()));
    let mut sink = CsvFileSink::new(output);
    let mut result = pipeline
        .run(records, &mut sink)
        .with_context(|| format!("Failed to write Clean Table to {}", output.display()))?;

    if !fetch_diagnostics.is_empty() {
        let mut report = RunReport::new();
        report.summary.records_fetched = result.report.summary.records_fetched;
        report.summary.fetch_failures = fetch_diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::FetchFailed)
            .count();
        report.record_stages(std::mem::take(&mut result.report.stages));
        report.extend_diagnostics(fetch_diagnostics);
        report.extend_diagnostics(std::mem::take(&mut result.report.diagnostics));
        report.output_sha256 = result.report.output_sha256.take();
        result.report = report;
    }

    let report_path = report_path_for(config, output);
    result
        .report
        .save_to_file(&report_path)
        .with_context(|| format!("Failed to save run report to {}", report_path.display()))?;
    tracing::info!("Run report saved to {}", report_path.display());

    Ok(result)
}

/// The configured report path for the configured table, otherwise a
/// run_report.json beside the table
fn report_path_for(config: &Config, output: &Path) -> PathBuf {
    if output == config.resolve(&config.paths.clean_table) {
        config.resolve(&config.paths.run_report)
    } else {
        output.with_file_name("run_report.json")
    }
}

/// Analyze command - KPI tables on the persisted Clean Table
fn analyze_command(config: &Config, clean: Option<PathBuf>, raw: Option<PathBuf>, top: usize) -> Result<()> {
    let analyzer = load_analyzer(config, clean, raw)?;
    print_analysis(&analyzer, top)
}

/// Search command - the preset advanced queries
fn search_command(config: &Config, clean: Option<PathBuf>, raw: Option<PathBuf>) -> Result<()> {
    let analyzer = load_analyzer(config, clean, raw)?;
    print_searches(&analyzer)
}

/// Visualize command - SVG charts
fn visualize_command(
    config: &Config,
    clean: Option<PathBuf>,
    raw: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let analyzer = load_analyzer(config, clean, raw)?;
    let out_dir = out_dir.unwrap_or_else(|| config.resolve(&config.paths.reports_dir));

    let report = Visualizer::new(analyzer.into_table(), out_dir).render_all()?;
    print_chart_report(&report);
    Ok(())
}

/// Run command - every step with one configuration
async fn run_command(config: &Config, top: usize) -> Result<()> {
    let raw_path = config.resolve(&config.paths.raw_records);
    let clean_path = config.resolve(&config.paths.clean_table);

    let (outcome, retry_notes) = fetch_records(config).await?;
    save_raw_records(&outcome.records, &raw_path)
        .with_context(|| format!("Failed to save raw records to {}", raw_path.display()))?;
    print_fetch_summary(&outcome, &retry_notes, &raw_path);

    let mut fetch_diagnostics = outcome.diagnostics();
    fetch_diagnostics.extend(retry_notes);
    let result = transform_records(config, &outcome.records, &clean_path, fetch_diagnostics)?;
    print_run_report(&result.report);

    let analyzer = Analyzer::new(result.table).enrich_with_credits(&outcome.records);
    print_analysis(&analyzer, top)?;
    print_searches(&analyzer)?;

    let charts = Visualizer::new(analyzer.into_table(), config.resolve(&config.paths.reports_dir)).render_all()?;
    print_chart_report(&charts);

    if result.report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Clean Table plus KPIs, joined with credits when raw records exist
fn load_analyzer(config: &Config, clean: Option<PathBuf>, raw: Option<PathBuf>) -> Result<Analyzer> {
    let clean = clean.unwrap_or_else(|| config.resolve(&config.paths.clean_table));
    let raw = raw.unwrap_or_else(|| config.resolve(&config.paths.raw_records));

    let analyzer = Analyzer::from_csv(&clean)?;

    if !raw.exists() {
        tracing::warn!("Raw records not found at {}; cast and director unavailable", raw.display());
        return Ok(analyzer);
    }

    let records = load_raw_records(&raw)
        .with_context(|| format!("Failed to load raw records from {}", raw.display()))?;
    Ok(analyzer.enrich_with_credits(&records))
}

fn print_analysis(analyzer: &Analyzer, top: usize) -> Result<()> {
    print_banner("Movie KPI Analysis");

    for kpi in KpiRanking::ALL {
        print_section(kpi.title(), analyzer.kpi_ranking(kpi, top))?;
    }

    print_section("Franchise vs. Standalone", analyzer.franchise_vs_standalone())?;
    print_section("Most Successful Franchises", analyzer.top_franchises(top))?;
    print_section("Most Successful Directors", analyzer.top_directors(top))?;

    println!("{}", "=".repeat(60).bright_blue());
    Ok(())
}

fn print_searches(analyzer: &Analyzer) -> Result<()> {
    print_banner("Advanced Searches");

    print_section(
        "Sci-Fi Action movies starring Bruce Willis",
        analyzer.rank(&query::willis_scifi_action()),
    )?;
    print_section(
        "Uma Thurman movies directed by Quentin Tarantino",
        analyzer.rank(&query::thurman_tarantino()),
    )?;

    println!("{}", "=".repeat(60).bright_blue());
    Ok(())
}

/// Print one analysis table; a missing column skips the section
fn print_section(title: &str, result: Result<Table, AnalysisError>) -> Result<()> {
    println!("{}", title.bold());

    match result {
        Ok(table) if table.is_empty() => println!("  {}", "(no matching movies)".dimmed()),
        Ok(table) => print_table(&table),
        Err(AnalysisError::ColumnNotFound(column)) => {
            println!("  {} column '{}' not available", "skipped:".yellow(), column);
        }
        Err(e) => return Err(e.into()),
    }

    println!();
    Ok(())
}

fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();
}

/// Fixed-width rendering of a table
fn print_table(table: &Table) {
    let cells: Vec<Vec<String>> = table
        .rows()
        .map(|row| row.values().iter().map(format_cell).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(&widths)
        .map(|(name, &w)| format!("{:<w$}", truncate(name, w)))
        .collect();
    println!("  {}", header.join("  ").bold());

    for row in &cells {
        let line: Vec<String> = row.iter().zip(&widths).map(|(cell, &w)| format!("{:<w$}", cell)).collect();
        println!("  {}", line.join("  ").trim_end());
    }
}

/// Cell text for the terminal: floats to two places, nulls as '-'
fn format_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "-".to_string(),
        Value::Float(v) if v.is_nan() => "-".to_string(),
        Value::Float(v) => format!("{:.2}", v),
        other => other.to_string(),
    };
    truncate(&text, MAX_CELL_WIDTH)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn print_fetch_summary(outcome: &FetchOutcome, notes: &[Diagnostic], output: &Path) {
    println!(
        "{} {} records ({} failed) to {}",
        "Fetched".green(),
        outcome.records.len(),
        outcome.failures.len(),
        output.display()
    );

    for diag in outcome.diagnostics().iter().chain(notes) {
        print_diagnostic(diag);
    }
}

/// Print run report summary to stdout
fn print_run_report(report: &RunReport) {
    print_banner("Transform Run Report");

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Records fetched: {}", report.summary.records_fetched);
    if report.summary.fetch_failures > 0 {
        println!("  Fetch failures:  {}", report.summary.fetch_failures.to_string().yellow());
    }
    println!("  Rows in:         {}", report.summary.rows_in);
    println!("  Rows out:        {}", report.summary.rows_out.to_string().green());

    if report.summary.errors > 0 {
        println!("  Errors:          {}", report.summary.errors.to_string().red().bold());
    } else {
        println!("  Errors:          {}", report.summary.errors.to_string().green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings:        {}", report.summary.warnings.to_string().yellow());
    } else {
        println!("  Warnings:        {}", report.summary.warnings.to_string().green());
    }

    if let Some(sha) = &report.output_sha256 {
        println!("  SHA-256:         {}", sha);
    }
    println!();

    println!("{}", "Stages:".bold());
    for stage in &report.stages {
        println!(
            "  {:<24} {:>5} -> {:<5} ({} dropped, {} columns)",
            stage.stage,
            stage.rows_in,
            stage.rows_out,
            stage.dropped(),
            stage.columns_out
        );
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No rows dropped".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            print_diagnostic(diag);
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

fn print_diagnostic(diag: &Diagnostic) {
    let severity_str = match diag.severity {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warn => "WARN".yellow().bold(),
        Severity::Info => "INFO".cyan(),
    };

    println!("  [{}] {}: {}", severity_str, diag.code, diag.message);
}

fn print_chart_report(report: &ChartReport) {
    for path in &report.written {
        println!("{} {}", "Chart saved to:".green(), path.display());
    }
    for diag in &report.skipped {
        print_diagnostic(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_options() {
        let cli = Cli::try_parse_from(["cinemetrics", "--verbose", "analyze", "--top", "3"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Analyze { top: 3, clean: None, raw: None }));
    }

    #[test]
    fn run_defaults_to_five_rows() {
        let cli = Cli::try_parse_from(["cinemetrics", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { top: 5 }));
    }

    #[test]
    fn cells_are_terminal_friendly() {
        assert_eq!(format_cell(&Value::Null), "-");
        assert_eq!(format_cell(&Value::Float(2799.439_1)), "2799.44");
        assert_eq!(format_cell(&Value::Int(7)), "7");
        assert_eq!(format_cell(&Value::Float(f64::NAN)), "-");
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "a".repeat(MAX_CELL_WIDTH + 10);
        let cell = format_cell(&Value::Text(long));
        assert_eq!(cell.chars().count(), MAX_CELL_WIDTH);
        assert!(cell.ends_with('…'));
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn report_sits_beside_custom_output() {
        let config = Config::default();
        let custom = PathBuf::from("/tmp/out/clean.csv");
        assert_eq!(report_path_for(&config, &custom), PathBuf::from("/tmp/out/run_report.json"));

        let default_table = config.resolve(&config.paths.clean_table);
        assert_eq!(
            report_path_for(&config, &default_table),
            config.resolve(&config.paths.run_report)
        );
    }

    #[test]
    fn empty_clean_table_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clean.csv");
        let records =
            cinemetrics_core::raw::parse_raw_records(r#"[{"id": 1, "title": "A", "status": "Rumored"}]"#).unwrap();

        let fetch_failed = Diagnostic::new(DiagnosticCode::FetchFailed, Severity::Warn, "Failed to fetch movie 2");
        let result = transform_records(&Config::default(), &records, &output, vec![fetch_failed]).unwrap();

        assert!(result.table.is_empty());
        assert!(result.report.has_errors());
        assert_eq!(result.report.summary.fetch_failures, 1);
        assert_eq!(result.report.diagnostics[0].code, DiagnosticCode::FetchFailed);
        assert!(output.exists());
        assert!(dir.path().join("run_report.json").exists());
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cinemetrics.toml");
        std::fs::write(&path, "[transform]\nmin_non_null = 4\n").unwrap();

        let config = load_config(Some(path.as_path()), false).unwrap();
        assert_eq!(config.transform.min_non_null, 4);
        assert_eq!(config.project_root.as_path(), dir.path());
        assert!(load_config(Some(dir.path().join("missing.toml").as_path()), false).is_err());
    }
}
