//! Offline inspection of job results and local marketplace state.
//!
//! Logging goes to stderr; stdout carries JSON only.
//!
//! Usage:
//!   vault-inspect inspect result.zip --path /iexec_out/result.json --out ./downloads
//!   vault-inspect hidden list
//!   vault-inspect hidden add 0xabc...
//!   vault-inspect config

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tradevault::result::{classify, ExtractedOutcome, ResultBundle};
use tradevault::{HiddenSet, JsonFileStore, VaultConfig};

#[derive(Parser)]
#[command(name = "vault-inspect", version, about = "Inspect job results and local marketplace state")]
struct Cli {
    /// Override the data directory holding local storage
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify and interpret a result file
    Inspect {
        file: PathBuf,
        /// Entry to select inside a result archive
        #[arg(long)]
        path: Option<String>,
        #[arg(long, value_enum, default_value_t = ContainerMode::Auto)]
        container: ContainerMode,
        /// Write the selected file into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage locally hidden (delisted) resources
    Hidden {
        #[command(subcommand)]
        action: HiddenAction,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Subcommand)]
enum HiddenAction {
    List,
    Add { address: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContainerMode {
    Auto,
    Yes,
    No,
}

impl ContainerMode {
    const fn as_flag(self) -> Option<bool> {
        match self {
            Self::Auto => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }
}

#[derive(Serialize)]
struct InspectReport {
    mime: &'static str,
    entry: Option<String>,
    size: usize,
    written_to: Option<PathBuf>,
    #[serde(flatten)]
    outcome: ExtractedOutcome,
}

fn init_logging_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn inspect(
    file: PathBuf,
    path: Option<String>,
    container: ContainerMode,
    out: Option<PathBuf>,
) -> Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let bundle = ResultBundle {
        bytes,
        container: container.as_flag(),
        path_hint: path,
    };
    let content = classify(&bundle)?;
    let outcome = ExtractedOutcome::from_content(&content);
    let written_to = out.map(|dir| content.write_to(&dir)).transpose()?;
    if let Some(path) = &written_to {
        info!("Wrote {}", path.display());
    }

    print_json(&InspectReport {
        mime: content.mime(),
        entry: content.entry_path.clone(),
        size: content.bytes.len(),
        written_to,
        outcome,
    })
}

fn main() -> Result<()> {
    init_logging_stderr();
    let cli = Cli::parse();

    let mut config = VaultConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Command::Inspect {
            file,
            path,
            container,
            out,
        } => inspect(file, path, container, out),
        Command::Hidden { action } => {
            let hidden = HiddenSet::new(JsonFileStore::new(config.store_path()));
            match action {
                HiddenAction::List => print_json(&hidden.load()),
                HiddenAction::Add { address } => {
                    let added = hidden.insert(&address)?;
                    info!("{} {}", if added { "Hid" } else { "Already hidden:" }, address);
                    print_json(&hidden.load())
                }
            }
        }
        Command::Config => print_json(&config),
    }
}
