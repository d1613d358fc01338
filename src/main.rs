use clap::{Parser, Subcommand};
use imgbatch::archive::{ArchiveReport, DirectorySink, write_archive};
use imgbatch::catalog::{OutputFormat, PRESETS};
use imgbatch::config::{self, BatchConfig};
use imgbatch::output;
use imgbatch::scheduler::Pipeline;
use imgbatch::source::{
    SourceError, SourceImage, SourceSet, collect_input_paths, parse_name_override,
};
use imgbatch::summary::summarize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgbatch")]
#[command(about = "Batch image optimizer for product photos")]
#[command(long_about = "\
Batch image optimizer for product photos

Every input image is resized to every selected preset and encoded into every
selected format. Output is one folder per preset:

  optimized-images/
  ├── product-zoom/
  │   ├── shoe.webp
  │   └── shoe.pdf
  ├── product-thumbnail/
  │   └── shoe.webp
  └── report.json

Derivatives are named after the input file without its extension; use
--name FILE=NAME to pick another base name for one input.

Images that fail to decode or encode are reported and skipped; the rest of
the batch still runs. Set RUST_LOG=info (or debug) for detailed logs.

Run 'imgbatch gen-config' to generate a documented imgbatch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./imgbatch.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Image files or directories to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Preset id to render (repeatable; default from config)
    #[arg(short, long = "preset", value_name = "ID")]
    presets: Vec<String>,

    /// Output format (repeatable; default from config)
    #[arg(short, long = "format", value_enum, value_name = "FMT")]
    formats: Vec<OutputFormat>,

    /// Maximum concurrent tasks
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Archive root directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output base name for an input file, e.g. --name IMG_0042.jpg=red-shoe (repeatable)
    #[arg(long = "name", value_name = "FILE=NAME", value_parser = parse_name_override)]
    names: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize images into the preset folder layout
    Run(RunArgs),
    /// List the built-in size presets
    Presets,
    /// Print a stock imgbatch.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let config = load_config(cli.config.as_deref())?;
            run(args, &config)?;
        }
        Command::Presets => {
            output::print_presets(PRESETS);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Structured logs to stderr; stdout is reserved for user-facing output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

fn apply_name_overrides(
    sources: &mut SourceSet,
    names: &[(String, String)],
) -> Result<(), SourceError> {
    for (file, name) in names {
        sources.rename_file(file, name)?;
    }
    Ok(())
}

fn run(args: RunArgs, config: &BatchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let presets = if args.presets.is_empty() {
        config.selection.presets.clone()
    } else {
        args.presets
    };
    let formats = if args.formats.is_empty() {
        config.selection.formats.clone()
    } else {
        args.formats
    };
    let out_dir = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let workers = config::effective_workers(&config.processing, args.jobs);

    let mut sources = SourceSet::new();
    for path in collect_input_paths(&args.inputs)? {
        sources.add(SourceImage::from_path(&path)?);
    }
    apply_name_overrides(&mut sources, &args.names)?;

    let pipeline = Pipeline::new(workers)?;
    println!(
        "==> Processing {} images × {} presets × {} formats on {} workers",
        sources.len(),
        presets.len(),
        formats.len(),
        pipeline.workers()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            println!("{}", output::format_batch_event(&event));
        }
    });
    let outcome = pipeline.run_batch(sources.as_slice(), &presets, &formats, Some(&tx));
    drop(tx);
    // Printer only exits by draining the channel
    if printer.join().is_err() {
        tracing::warn!("progress printer thread panicked; some progress lines may be missing");
    }
    let outcome = outcome?;

    let summary = summarize(&outcome.results);
    let mut sink = DirectorySink::new(&out_dir);
    let entries = write_archive(&outcome.results, &mut sink)?;
    let report_path = ArchiveReport::new(&entries, summary).write_to(&out_dir)?;

    println!();
    output::print_batch_output(&entries, &summary, outcome.submitted);
    println!("==> Archive: {}", out_dir.display());
    println!("==> Report: {}", report_path.display());
    Ok(())
}
