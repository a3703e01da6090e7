//! Plumb CLI - object store plumbing commands.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use plumb_storage::{CompressionLevel, StoreConfig};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Plumb - a content-addressed object store with git-compatible plumbing
#[derive(Parser, Debug)]
#[command(name = "plumb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Storage root directory
    #[arg(
        long,
        env = "PLUMB_GIT_DIR",
        default_value = plumb_storage::DEFAULT_GIT_DIR,
        global = true
    )]
    git_dir: PathBuf,

    /// Compression level for written objects (none, fast, default, best)
    #[arg(long, default_value = "default", global = true)]
    compression: CompressionLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty storage root
    Init,

    /// Show the kind, size or content of an object
    CatFile {
        #[command(flatten)]
        mode: CatFileMode,
        /// Object hash (40 hex characters)
        object: String,
    },

    /// Compute the blob hash of a file, optionally storing it
    HashObject {
        /// Write the object into the store
        #[arg(short)]
        write: bool,
        /// File to hash
        file: PathBuf,
    },

    /// List the entries of a tree object
    LsTree {
        /// Print entry names only
        #[arg(long)]
        name_only: bool,
        /// Tree hash (40 hex characters)
        tree: String,
    },

    /// Snapshot a directory into tree objects and print the root hash
    WriteTree {
        /// Directory to snapshot (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct CatFileMode {
    /// Print the object kind
    #[arg(short = 't')]
    kind: bool,
    /// Print the object size
    #[arg(short = 's')]
    size: bool,
    /// Pretty-print the object content
    #[arg(short = 'p')]
    pretty: bool,
    /// Exit with zero status if the object exists and is valid
    #[arg(short = 'e')]
    exists: bool,
}

impl CatFileMode {
    /// `None` for `-e`, which only reports through the exit code.
    fn into_command(self) -> Option<commands::CatFile> {
        if self.exists {
            return None;
        }
        [
            (self.kind, commands::CatFile::Kind),
            (self.size, commands::CatFile::Size),
            (self.pretty, commands::CatFile::Pretty),
        ]
        .into_iter()
        .find_map(|(set, command)| set.then_some(command))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("plumb={log_level},plumb_storage={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = StoreConfig {
        git_dir: cli.git_dir,
        compression: cli.compression,
        ..StoreConfig::default()
    };
    tracing::debug!(git_dir = %config.git_dir.display(), "using storage root");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Init => commands::init(&config, &mut out).context("failed to initialize")?,
        Commands::CatFile { mode, object } => match mode.into_command() {
            Some(mode) => commands::cat_file(&config, mode, &object, &mut out)
                .with_context(|| format!("failed to read object {object}"))?,
            None => {
                if !commands::object_exists(&config, &object)? {
                    return Ok(ExitCode::FAILURE);
                }
            }
        },
        Commands::HashObject { write, file } => {
            commands::hash_object(&config, &file, write, &mut out)
                .with_context(|| format!("failed to hash {}", file.display()))?;
        }
        Commands::LsTree { name_only, tree } => {
            commands::ls_tree(&config, &tree, name_only, &mut out)
                .with_context(|| format!("failed to list tree {tree}"))?;
        }
        Commands::WriteTree { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from("."));
            commands::write_tree(&config, &path, &mut out)
                .with_context(|| format!("failed to write tree for {}", path.display()))?;
        }
        Commands::Version => writeln!(out, "plumb {}", env!("CARGO_PKG_VERSION"))?,
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
