//! ModelKeep CLI - inspect and prune a directory of trained model artifacts.
//!
//! Provides the `mkeep` command on top of `modelkeep-registry`.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::args::{FilterArgs, IdentityArgs, RetentionArgs};
use commands::{best, list, name, retention};

/// ModelKeep CLI - model artifact retention
///
/// Names model artifacts from their metadata, ranks them by accuracy and
/// prunes dominated ones while always keeping the best model.
#[derive(Parser, Debug)]
#[command(name = "mkeep", author, version, about = "ModelKeep - model artifact retention")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Retention config file (defaults to ./modelkeep.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models in a directory
    List {
        /// Model directory
        dir: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the best model in a directory
    ///
    /// Without --traindata-version the highest version present is used.
    Best {
        /// Model directory
        dir: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the highest traindata version present in a directory
    MaxVersion {
        /// Model directory
        dir: PathBuf,
    },

    /// Format a model file name from its metadata
    Name {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Combined accuracy (defaults to the mean of train and val)
        #[arg(long)]
        combined: Option<f64>,

        /// Train accuracy; omit to print the base name only
        #[arg(long, requires = "val")]
        train: Option<f64>,

        /// Validation accuracy
        #[arg(long, requires = "train")]
        val: Option<f64>,

        /// Epoch
        #[arg(long, default_value_t = 0)]
        epoch: u32,

        /// Save format (h5, tf)
        #[arg(long, default_value = "tf")]
        save_format: String,
    },

    /// Delete models dominated by other models of the same identity
    Prune {
        /// Model directory (overrides model_dir from the config file)
        dir: Option<PathBuf>,

        #[command(flatten)]
        retention: RetentionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a trained artifact to the registry, then prune
    ///
    /// The artifact is copied in under its encoded name only if it is not
    /// dominated by a model already in the directory.
    Submit {
        /// Model directory (overrides model_dir from the config file)
        dir: Option<PathBuf>,

        /// Serialized model produced by the trainer (file or savedmodel directory)
        #[arg(long = "from")]
        source: PathBuf,

        /// Raw train metric value
        #[arg(long)]
        train: f64,

        /// Raw validation metric value
        #[arg(long)]
        val: f64,

        /// Epoch that produced the model
        #[arg(long)]
        epoch: u32,

        #[command(flatten)]
        retention: RetentionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // If no command provided, show help
    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::List { dir, filter, json } => list::execute(&dir, &filter, json),
        Command::Best { dir, filter, json } => best::execute(&dir, &filter, json),
        Command::MaxVersion { dir } => list::max_version(&dir),
        Command::Name { identity, combined, train, val, epoch, save_format } => {
            name::execute(&identity, combined, train.zip(val), epoch, &save_format)
        }
        Command::Prune { dir, retention: opts, json } => {
            let config = config::load_config(args.config.as_deref())?;
            retention::prune(config.as_ref(), dir, &opts, json)
        }
        Command::Submit { dir, source, train, val, epoch, retention: opts, json } => {
            let config = config::load_config(args.config.as_deref())?;
            let metrics = retention::SubmittedMetrics { train, val, epoch };
            retention::submit(config.as_ref(), dir, source, metrics, &opts, json)
        }
    }
}
