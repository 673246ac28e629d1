//! vnarc CLI - Command-line tool for visual-novel archive extraction.
//!
//! This is the main entry point for the vnarc command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use vnarc::prelude::*;

/// vnarc - visual-novel archive extraction tool
#[derive(Parser)]
#[command(name = "vnarc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and show a progress spinner instead
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every file from an archive
    Unpack {
        /// Path to the archive
        #[arg(short, long, env = "VNARC_INPUT")]
        input: PathBuf,

        /// Output directory (defaults to the current directory)
        #[arg(short, long, env = "VNARC_OUTPUT")]
        output: Option<PathBuf>,

        /// Skip detection and use this format (see `formats`)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// List the contents of an archive
    List {
        /// Path to the archive
        #[arg(short, long, env = "VNARC_INPUT")]
        input: PathBuf,

        /// Skip detection and use this format (see `formats`)
        #[arg(short, long)]
        format: Option<String>,

        /// Show offsets and sizes
        #[arg(short, long)]
        detailed: bool,
    },

    /// List supported archive formats in detection order
    Formats,

    /// Convert a PRS image to PNG
    PrsDecode {
        /// Input PRS file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let registry = Registry::with_defaults();

    match cli.command {
        Commands::Unpack {
            input,
            output,
            format,
        } => {
            cmd_unpack(&registry, &input, output, format.as_deref(), cli.quiet)?;
        }
        Commands::List {
            input,
            format,
            detailed,
        } => {
            cmd_list(&registry, &input, format.as_deref(), detailed)?;
        }
        Commands::Formats => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::PrsDecode { input, output } => {
            cmd_prs_decode(&input, &output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn select_decoder<'r>(
    registry: &'r Registry,
    input: &ArchiveInput,
    format: Option<&str>,
) -> Result<&'r dyn ArchiveDecoder> {
    let decoder = match format {
        Some(name) => registry.get(name)?,
        None => registry
            .detect(input)
            .with_context(|| format!("Failed to detect format of {}", input.name()))?,
    };
    tracing::info!("Format: {}", decoder.name());
    Ok(decoder)
}

fn cmd_unpack(
    registry: &Registry,
    path: &Path,
    output: Option<PathBuf>,
    format: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let input = ArchiveInput::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let decoder = select_decoder(registry, &input, format)?;

    if let Some(dir) = &output {
        fs::create_dir_all(dir)?;
    }

    let start = Instant::now();
    let mut sink = PersistedSink::new(output);

    if quiet {
        let mut progress = ProgressSink::new(&mut sink)?;
        registry
            .unpack(decoder, &input, &mut progress)
            .context("Failed to unpack archive")?;
        progress.finish();
    } else {
        registry
            .unpack(decoder, &input, &mut sink)
            .context("Failed to unpack archive")?;
    }

    println!(
        "Unpacked {} files in {:?} ({} failed)",
        sink.saved(),
        start.elapsed(),
        sink.failed()
    );

    Ok(())
}

fn cmd_list(registry: &Registry, path: &Path, format: Option<&str>, detailed: bool) -> Result<()> {
    let input = ArchiveInput::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let decoder = select_decoder(registry, &input, format)?;
    let entries = decoder.list(&input).context("Failed to read archive table")?;

    for entry in &entries {
        if detailed {
            println!(
                "{:>#12x} {:>12} {:>4} {}",
                entry.offset, entry.size, entry.prefix_len, entry.name
            );
        } else {
            println!("{}", entry.name);
        }
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_prs_decode(input: &Path, output: &Path) -> Result<()> {
    println!("Decoding PRS: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input file")?;
    if !PrsImage::is_prs(&data) {
        anyhow::bail!("Input file is not a PRS image");
    }

    let image = PrsImage::decode(&data).context("Failed to decode PRS image")?;
    let png = image.to_png().context("Failed to encode PNG")?;
    fs::write(output, png).context("Failed to write output file")?;

    println!("Decoded {}x{} image", image.width(), image.height());

    Ok(())
}

/// Sink wrapper that ticks a progress spinner for every deposited file.
///
/// The entry count is only known once the decoder has read its table, so
/// the spinner counts up instead of showing a bar.
struct ProgressSink<'a> {
    inner: &'a mut PersistedSink,
    bar: ProgressBar,
}

impl<'a> ProgressSink<'a> {
    fn new(inner: &'a mut PersistedSink) -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files ({per_sec})")?,
        );
        Ok(Self { inner, bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl FileSink for ProgressSink<'_> {
    fn deposit(
        &mut self,
        producer: &mut dyn FnMut() -> vnarc::archive::Result<VirtualFile>,
    ) -> vnarc::archive::Result<()> {
        let result = self.inner.deposit(producer);
        self.bar.inc(1);
        result
    }
}
