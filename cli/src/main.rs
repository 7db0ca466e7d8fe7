use clap::Parser;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kiwigen_compiler::{
    compile_schema_to_rust, decode_binary_schema, schema_to_json, ExtraField, KiwiError,
};

#[derive(Parser, Debug)]
#[command(name = "kiwigen", version)]
#[command(about = "Converts binary Kiwi schemas into Rust source", long_about = None)]
struct Cli {
    /// Binary schema file to read
    schema: PathBuf,

    /// Output `.rs` file (if omitted, prints to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wrap the generated code in `pub mod <MODULE> { .. }`
    #[arg(short, long)]
    module: Option<String>,

    /// Adds an extra field to a struct or message. May be repeated.
    #[arg(short, long, value_name = "STRUCT:FIELD:TYPE")]
    extra: Vec<String>,

    /// Print the decoded schema as JSON instead of generating Rust
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{}: Not found", .0.display())]
    NotFound(PathBuf),

    #[error("Failed reading {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed decoding schema: {0}")]
    Decode(KiwiError),

    #[error(transparent)]
    Extra(KiwiError),

    #[error("Failed generating output: {0}")]
    Generate(KiwiError),

    #[error("Failed writing output: {0}")]
    Write(io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so generated code on stdout stays clean. `RUST_LOG`
/// overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let extras = cli
        .extra
        .iter()
        .map(|text| ExtraField::parse(text))
        .collect::<Result<Vec<_>, _>>()
        .map_err(CliError::Extra)?;
    let extras = ExtraField::group(extras);

    let data = fs::read(&cli.schema).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => CliError::NotFound(cli.schema.clone()),
        _ => CliError::Read {
            path:   cli.schema.clone(),
            source: err,
        },
    })?;
    debug!(path = %cli.schema.display(), bytes = data.len(), "read schema");

    let schema = decode_binary_schema(&data).map_err(CliError::Decode)?;
    info!(definitions = schema.definitions.len(), "decoded schema");

    let text = if cli.json {
        schema_to_json(&schema).map_err(CliError::Generate)?
    } else {
        compile_schema_to_rust(&schema, cli.module.as_deref(), &extras).map_err(CliError::Generate)?
    };

    match &cli.output {
        Some(out_path) => {
            fs::write(out_path, text).map_err(CliError::Write)?;
            info!(path = %out_path.display(), "wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}
