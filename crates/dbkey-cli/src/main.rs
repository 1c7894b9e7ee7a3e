// dbkey — command-line entry point
//
// Parses arguments, installs a stderr log subscriber (stdout carries only the
// key or JSON), and dispatches to the extraction pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbkey_core::extractor::read_input;
use dbkey_core::{
    ErrorKind, ExtractorConfig, KeyExtractor, Stage, StageError, WrapVersion, WrappedKey,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbkey")]
#[command(version, about = "Recover the local message database key", long_about = None)]
struct Cli {
    /// JSON settings file (see ExtractorConfig)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Base directory replacing the roaming config dir (%APPDATA%)
    #[arg(long, global = true)]
    roaming_dir: Option<PathBuf>,

    /// Base directory replacing the local app data dir (%LOCALAPPDATA%)
    #[arg(long, global = true)]
    local_dir: Option<PathBuf>,

    /// Application directory name under the base directories
    #[arg(long, global = true)]
    app_dir_name: Option<String>,

    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unwrap and print the database key
    Extract {
        #[arg(long)]
        json: bool,
    },

    /// Describe the wrapped key in config.json without decrypting it
    Inspect {
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved input file paths
    Paths {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct FailureReport<'a> {
    stage: Stage,
    kind: ErrorKind,
    message: String,
    hint: &'a str,
}

#[derive(Serialize)]
struct KeyOutput<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct Inspection {
    path: PathBuf,
    version: WrapVersion,
    nonce: String,
    ciphertext_len: usize,
    total_len: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dbkey=info,dbkey_core=info"
    } else {
        "dbkey=warn,dbkey_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;
    let extractor = KeyExtractor::new(config);

    match cli.command {
        Commands::Extract { json } => match extractor.run() {
            Ok(key) => {
                if json {
                    let output = KeyOutput { key: key.expose() };
                    println!("{}", serde_json::to_string(&output)?);
                } else {
                    println!("{}", key.expose());
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report_failure(&e, json),
        },

        Commands::Inspect { json } => match inspect(&extractor) {
            Ok(found) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&found)?);
                } else {
                    println!("file:        {}", found.path.display());
                    println!("version:     {}", found.version.as_str());
                    println!("nonce:       {}", found.nonce);
                    println!("ciphertext:  {} bytes", found.ciphertext_len);
                    println!("total:       {} bytes", found.total_len);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report_failure(&e, json),
        },

        Commands::Paths { json } => match extractor.resolve_paths() {
            Ok(paths) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&paths)?);
                } else {
                    println!("local state: {}", paths.local_state.display());
                    println!("config:      {}", paths.config.display());
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report_failure(&e, json),
        },
    }
}

/// Settings file first, then individual flags on top.
fn build_config(cli: &Cli) -> Result<ExtractorConfig> {
    let mut config = match &cli.settings {
        Some(path) => {
            let loaded = ExtractorConfig::load(path)
                .with_context(|| format!("load settings {}", path.display()))?;
            tracing::debug!(path = %path.display(), "settings loaded");
            loaded
        }
        None => ExtractorConfig::default(),
    };
    if let Some(dir) = &cli.roaming_dir {
        config.roaming_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.local_dir {
        config.local_dir = Some(dir.clone());
    }
    if let Some(name) = &cli.app_dir_name {
        config.app_dir_name = name.clone();
    }
    Ok(config)
}

fn inspect(extractor: &KeyExtractor) -> std::result::Result<Inspection, StageError> {
    let paths = extractor.resolve_paths()?;
    let contents = read_input(&paths.config).map_err(|source| StageError {
        stage: Stage::ReadConfig,
        source,
    })?;
    let wrapped = dbkey_core::wrapped_key::resolve_wrapped_key(&contents).map_err(|source| {
        StageError {
            stage: Stage::ResolveWrappedKey,
            source,
        }
    })?;
    let parsed = WrappedKey::parse(&wrapped).map_err(|source| StageError {
        stage: Stage::UnwrapKey,
        source,
    })?;
    Ok(Inspection {
        path: paths.config,
        version: parsed.version,
        nonce: hex::encode(parsed.nonce),
        ciphertext_len: parsed.ciphertext.len(),
        total_len: parsed.total_len(),
    })
}

fn report_failure(err: &StageError, json: bool) -> Result<ExitCode> {
    tracing::debug!(stage = %err.stage, kind = %err.source.kind(), "pipeline stopped");
    if json {
        let report = FailureReport {
            stage: err.stage,
            kind: err.source.kind(),
            message: err.source.to_string(),
            hint: err.source.hint(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("Error: {err}");
        eprintln!("Kind:  {}", err.source.kind());
        eprintln!("Hint:  {}", err.source.hint());
    }
    Ok(ExitCode::FAILURE)
}
