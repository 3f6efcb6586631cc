use clap::{Parser, Subcommand};
use classvacuum::config::Config;
use classvacuum::discovery::{open_archive, Repository};
use classvacuum::graph::{ingest_archive, IngestOptions};
use classvacuum::parser::DependencyExtractor;
use classvacuum::project::{ingest_from_repository, ProjectDescriptor, ProjectModel};
use classvacuum::report::{ReportFormat, Reporter};
use classvacuum::{DependencyTracker, NameFilter, VacuumAnalyzer};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// classvacuum - class-level dependency analysis for JVM archives
#[derive(Parser, Debug)]
#[command(name = "classvacuum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Root class prefix (can be specified multiple times)
    #[arg(long, value_name = "PREFIX", global = true)]
    root_prefix: Vec<String>,

    /// System namespace prefix excluded from dependencies (replaces the configured list)
    #[arg(long, value_name = "PREFIX", global = true)]
    system_prefix: Vec<String>,

    /// Local package repository root
    #[arg(long, value_name = "DIR", global = true)]
    repository: Option<PathBuf>,

    /// Fail on the first class that cannot be decoded
    #[arg(long, global = true)]
    strict: bool,

    /// Decode classes in parallel
    #[arg(long, global = true)]
    parallel: bool,

    /// Only list archives that can be removed
    #[arg(long, global = true)]
    removable_only: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the classes of one or more archives by depth and weight
    Track {
        /// Archives (.jar) or class directories
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
    /// Report which archives of a project are unused or duplicated
    Vacuum {
        /// Project descriptor file
        descriptor: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("classvacuum v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Track { archives } => run_track(&config, &cli, archives),
        Command::Vacuum { descriptor } => run_vacuum(&config, &cli, descriptor),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        let cwd = std::env::current_dir().into_diagnostic()?;
        Config::from_default_locations(&cwd)?
    };

    // Override with CLI arguments
    if !cli.root_prefix.is_empty() {
        config.roots = NameFilter {
            prefixes: cli.root_prefix.clone(),
            ..config.roots
        }
        .normalized();
    }
    if !cli.system_prefix.is_empty() {
        config.system = NameFilter {
            prefixes: cli.system_prefix.clone(),
            ..config.system
        }
        .normalized();
    }
    if let Some(repository) = &cli.repository {
        config.repository = Some(repository.clone());
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }
    config.strict |= cli.strict;
    config.parallel |= cli.parallel;
    config.report.removable_only |= cli.removable_only;

    Ok(config)
}

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn ingest_options(config: &Config) -> IngestOptions {
    IngestOptions {
        strict: config.strict,
        parallel: config.parallel,
    }
}

fn run_track(config: &Config, cli: &Cli, archives: &[PathBuf]) -> Result<()> {
    let start_time = Instant::now();
    let mut extractor = DependencyExtractor::new(config.system.clone());

    info!("Reading {} archives...", archives.len());
    let pb = progress_bar(archives.len(), cli.quiet);
    for path in archives {
        pb.set_message(path.display().to_string());
        let mut source = open_archive(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        ingest_archive(&mut extractor, &mut *source, ingest_options(config))
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to ingest {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish_and_clear();
    info!("Recorded {} classes", extractor.len());

    let tracked = DependencyTracker::new(config.roots.clone()).track(&extractor);

    let reporter = Reporter::new(config.report.format, cli.output.clone());
    reporter.report_tracked(&tracked)?;

    if !cli.quiet {
        eprintln!(
            "{}",
            format!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64()).dimmed()
        );
    }
    Ok(())
}

fn run_vacuum(config: &Config, cli: &Cli, descriptor_path: &Path) -> Result<()> {
    let start_time = Instant::now();

    let descriptor = ProjectDescriptor::load(descriptor_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid project descriptor {}", descriptor_path.display()))?;
    let repository_root = config
        .repository_root()
        .ok_or_else(|| miette::miette!("No repository configured and HOME is not set"))?;
    let repository = Repository::new(repository_root);
    info!("Resolving archives under {}", repository.root().display());

    let mut model = ProjectModel::new(descriptor, config.system.clone());
    let pb = progress_bar(model.archives().len(), cli.quiet);
    ingest_from_repository(&mut model, &repository, ingest_options(config), |archive, _| {
        pb.set_message(archive.coordinate.to_string());
        pb.inc(1);
    })
    .into_diagnostic()
    .wrap_err("Failed to load project")?;
    pb.finish_and_clear();

    model.analyze(&config.roots);
    let report = VacuumAnalyzer::new().classify(&model);

    let reporter = Reporter::new(config.report.format, cli.output.clone());
    reporter.report_vacuum(&report, config.report.removable_only)?;

    if !cli.quiet {
        eprintln!(
            "{}",
            format!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64()).dimmed()
        );
    }
    Ok(())
}
