//! Application entry point for codebook voice conversion.
//!
//! # Commands
//!
//! * `transform`: convert every WAV file of a folder with one codebook.
//! * `inspect`: print a codebook's header and summary statistics.
//! * `init-config`: write a default `settings.toml`.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line.
//! 3. Load [`TransformerConfig`] (explicit `--config`, else the platform
//!    default, else built-in defaults) and apply flag overrides.
//! 4. Run the command.  Fatal errors exit non-zero; failed items are listed
//!    but do not change the exit status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codebook_vc::{
    codebook::{Codebook, CodebookFile, CodebookSide},
    config::{AppPaths, TransformerConfig},
    pipeline::BatchTransformer,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Weighted-codebook voice conversion
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every WAV file in a folder
    Transform(TransformCommand),

    /// Print a codebook's header and statistics
    Inspect(InspectCommand),

    /// Write a default configuration file
    InitConfig(InitConfigCommand),
}

#[derive(Parser, Debug)]
struct TransformCommand {
    /// Folder holding the source recordings (*.wav)
    #[arg(short, long)]
    input: PathBuf,

    /// Folder for the converted recordings
    #[arg(short, long)]
    output: PathBuf,

    /// Trained codebook file
    #[arg(short, long)]
    codebook: PathBuf,

    /// Settings file (defaults to the platform settings.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report of every item to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Items converted concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Suffix appended to every output file stem
    #[arg(long)]
    suffix: Option<String>,

    /// Re-run feature analysis even when pitch tracks exist
    #[arg(long)]
    force_analysis: bool,
}

#[derive(Parser, Debug)]
struct InspectCommand {
    /// Path to the codebook file
    codebook: PathBuf,
}

#[derive(Parser, Debug)]
struct InitConfigCommand {
    /// Destination (defaults to the platform settings.toml)
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn transform(cmd: TransformCommand) -> Result<()> {
    let mut config = match &cmd.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            TransformerConfig::load_from(path)
                .with_context(|| format!("reading {}", path.display()))?
        }
        None => TransformerConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            TransformerConfig::default()
        }),
    };

    if let Some(workers) = cmd.workers {
        config.workers = workers;
    }
    if let Some(suffix) = cmd.suffix {
        config.output.suffix = suffix;
    }
    if cmd.force_analysis {
        config.pipeline.forced_reanalysis = true;
    }

    let report = BatchTransformer::with_defaults(&config)
        .run(&cmd.input, &cmd.output, &cmd.codebook)
        .context("transformation aborted")?;

    if let Some(path) = &cmd.report {
        report
            .save_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    println!(
        "{} of {} files converted into {}",
        report.converted(),
        report.len(),
        report.output_folder.display()
    );
    for failure in report.failures() {
        println!("  failed: {} ({:?})", failure.input.display(), failure.status);
    }
    Ok(())
}

fn inspect(cmd: InspectCommand) -> Result<()> {
    let mut file = CodebookFile::open(&cmd.codebook)
        .with_context(|| format!("opening {}", cmd.codebook.display()))?;
    let header = file.read_header()?;
    let codebook: Codebook = file.read_entries()?;

    println!("codebook:      {}", cmd.codebook.display());
    println!("entries:       {}", codebook.len());
    println!("LP order:      {}", header.lp_order);
    println!("sample rate:   {} Hz", header.sample_rate);
    println!(
        "frames:        {:.1} ms window, {:.1} ms skip",
        header.window_size_secs * 1_000.0,
        header.skip_size_secs * 1_000.0
    );

    match header.pitch {
        Some(pitch) => {
            println!(
                "source pitch:  mean {:.1} Hz, std dev {:.1} Hz",
                pitch.source.hertz.mean, pitch.source.hertz.std_dev
            );
            println!(
                "target pitch:  mean {:.1} Hz, std dev {:.1} Hz",
                pitch.target.hertz.mean, pitch.target.hertz.std_dev
            );
        }
        None => println!("pitch:         no statistics"),
    }

    let stats = codebook.stats();
    println!("source mean:   {}", join_hz(&stats.source_mean));
    println!("target mean:   {}", join_hz(&stats.target_mean));
    println!(
        "min variance:  source {:.1}, target {:.1}",
        min_of(stats.variance(CodebookSide::Source)),
        min_of(stats.variance(CodebookSide::Target))
    );
    Ok(())
}

fn join_hz(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.0}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn init_config(cmd: InitConfigCommand) -> Result<()> {
    let path = cmd.path.unwrap_or_else(|| AppPaths::new().settings_file);
    if path.exists() && !cmd.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    TransformerConfig::default()
        .save_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("codebook-vc {:?}", cli.command);

    match cli.command {
        Commands::Transform(cmd) => transform(cmd),
        Commands::Inspect(cmd) => inspect(cmd),
        Commands::InitConfig(cmd) => init_config(cmd),
    }
}
