//! # Packstream CLI
//!
//! Command-line front end for the packstream encoders.
//!
//! ## Usage
//! ```bash
//! # Archive a directory into fixtures.tar.gz with reproducible timestamps
//! packstream tar ./fixtures --gzip --frozen-mtime 0 -o ./out
//!
//! # Compress and decompress single files
//! packstream gzip ./symfony.log
//! packstream gunzip ./symfony.log.gz -o ./restored
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use packstream::gzip::GZIP_SUFFIX;
use packstream::utils::format_bytes;
use packstream::{
    Compress, FileNode, Filesystem, FrozenClock, Gzip, Name, PackConfig, PackError, Result,
    SystemClock, Tar,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Packstream CLI - streaming tar and gzip for files and directories
#[derive(Parser)]
#[command(name = "packstream")]
#[command(version)]
#[command(about = "Archive and compress file trees without loading them into memory")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Gzip compression level (0-9), overrides the configuration
    #[arg(long, global = true)]
    level: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a file or directory into <name>.tar
    Tar {
        /// File or directory to archive
        source: PathBuf,

        /// Output directory (defaults to current)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compress the archive into <name>.tar.gz
        #[arg(long)]
        gzip: bool,

        /// Stamp every header with this Unix time instead of the current time
        #[arg(long, value_name = "SECS")]
        frozen_mtime: Option<i64>,
    },

    /// Compress a file into <name>.gz
    Gzip {
        /// File to compress
        file: PathBuf,

        /// Output directory (defaults to current)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decompress a .gz file
    Gunzip {
        /// File to decompress
        file: PathBuf,

        /// Output directory (defaults to current)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.level)?;

    match cli.command {
        Commands::Tar {
            source,
            output,
            gzip,
            frozen_mtime,
        } => cmd_tar(&config, &source, output, gzip, frozen_mtime),
        Commands::Gzip { file, output } => cmd_gzip(&config, &file, output),
        Commands::Gunzip { file, output } => cmd_gunzip(&config, &file, output),
    }
}

fn load_config(path: Option<&Path>, level: Option<u32>) -> Result<PackConfig> {
    let mut config = match path {
        Some(path) => PackConfig::from_file(path)?,
        None => PackConfig::default(),
    };
    if let Some(level) = level {
        config = config.with_compression_level(level);
    }
    config.validate()?;
    debug!("Using configuration {:?}", config);
    Ok(config)
}

/// Archive a file or directory
///
/// The tree is streamed from disk into the output file; with `--gzip` the
/// archive stream is compressed on the way out.
fn cmd_tar(
    config: &PackConfig,
    source: &Path,
    output: Option<PathBuf>,
    gzip: bool,
    frozen_mtime: Option<i64>,
) -> Result<()> {
    let start = Instant::now();
    let node = load_source(config, source)?;

    let encode = match frozen_mtime {
        Some(seconds) => Tar::encode(FrozenClock::at_unix(seconds)),
        None => Tar::encode(SystemClock),
    };
    let mut archive = encode.file(&node)?;
    if gzip {
        archive = compressor(config)?.file(&archive)?;
    }

    let target = mount_output(config, output)?;
    target.add(&archive.clone().into())?;

    report(&target, archive.name(), start)
}

/// Compress a single file
fn cmd_gzip(config: &PackConfig, file: &Path, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let node = load_source(config, file)?;
    let file = node
        .as_file()
        .ok_or_else(|| PackError::UnsupportedNode(format!("{} is a directory", node.name())))?;

    let compressed = compressor(config)?.file(file)?;
    let target = mount_output(config, output)?;
    target.add(&compressed.clone().into())?;

    report(&target, compressed.name(), start)
}

/// Decompress a single `.gz` file
fn cmd_gunzip(config: &PackConfig, file: &Path, output: Option<PathBuf>) -> Result<()> {
    let start = Instant::now();
    let node = load_source(config, file)?;
    let file = node
        .as_file()
        .ok_or_else(|| PackError::UnsupportedNode(format!("{} is a directory", node.name())))?;
    if !file.name().as_str().ends_with(GZIP_SUFFIX) || file.name().as_str() == GZIP_SUFFIX {
        return Err(PackError::InvalidName {
            name: file.name().to_string(),
            reason: "expected a .gz suffix",
        });
    }

    let decompressed = Gzip::decompress().file(file);
    let target = mount_output(config, output)?;
    target.add(&decompressed.clone().into())?;

    report(&target, decompressed.name(), start)
}

fn compressor(config: &PackConfig) -> Result<Compress> {
    Compress::with_level(config.compression_level)
}

/// Load `path` through a filesystem mounted on its parent directory
fn load_source(config: &PackConfig, path: &Path) -> Result<FileNode> {
    let path = std::fs::canonicalize(path).map_err(|_| PackError::NotFound(path.to_path_buf()))?;
    let parent = path.parent().ok_or_else(|| PackError::NotFound(path.clone()))?;
    let file_name = path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
        PackError::InvalidName {
            name: path.display().to_string(),
            reason: "not a valid UTF-8 file name",
        }
    })?;
    let name = Name::new(file_name)?;

    let fs = Filesystem::mount(parent, config.clone())?;
    fs.get(&name)?.ok_or(PackError::NotFound(path))
}

fn mount_output(config: &PackConfig, output: Option<PathBuf>) -> Result<Filesystem> {
    let output = output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output)?;
    Filesystem::mount(output, config.clone())
}

fn report(target: &Filesystem, name: &Name, start: Instant) -> Result<()> {
    let path = target.root().join(name.as_str());
    let size = std::fs::metadata(&path)?.len();

    println!(
        "{} Wrote {} ({}) in {:.2?}",
        "✓".green().bold(),
        path.display().to_string().cyan(),
        format_bytes(size),
        start.elapsed()
    );
    Ok(())
}
