//! `lasvalidate`: checks LAS / LAZ files and optionally repairs their header.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lasrepair::{RepairOptions, ValidateConfig};

/// Process exit status, errors are negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Status {
    Success = 0,
    UnknownError = -1,
    WrongCommandLineSyntax = -2,
    NoInputSpecified = -3,
    InputFileNotFound = -4,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status as i32 as u8)
    }
}

/// Validates LAS and LAZ files against their own points.
#[derive(Debug, Parser)]
#[command(name = "lasvalidate", version, about, long_about = None)]
struct Cli {
    /// Files to validate, wildcards are expanded.
    #[arg(short, long = "input", num_args = 1..)]
    input: Vec<String>,

    /// Overwrite the header fields that disagree with the points.
    #[arg(long)]
    repair: bool,

    /// Number of files validated at the same time.
    #[arg(long, default_value_t = 1)]
    cores: usize,

    /// Print a report of every file and the verdicts.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn is_pattern(input: &str) -> bool {
    input.contains(|c| matches!(c, '*' | '?' | '['))
}

/// Expands the wildcards of every input, every input must name at least one file.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, Status> {
    let mut paths = Vec::new();
    for input in inputs {
        if !is_pattern(input) {
            let path = PathBuf::from(input);
            if !path.is_file() {
                tracing::error!("cannot find '{}'", input);
                return Err(Status::InputFileNotFound);
            }
            paths.push(path);
            continue;
        }
        let matches = glob::glob(input).map_err(|e| {
            tracing::error!("bad wildcard '{}': {}", input, e);
            Status::WrongCommandLineSyntax
        })?;
        let before = paths.len();
        for entry in matches {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("{}", e),
            }
        }
        if paths.len() == before {
            tracing::error!("no file matches '{}'", input);
            return Err(Status::InputFileNotFound);
        }
    }
    Ok(paths)
}

fn run(cli: Cli) -> Status {
    if cli.input.is_empty() {
        tracing::error!("no input specified");
        return Status::NoInputSpecified;
    }
    let paths = match expand_inputs(&cli.input) {
        Ok(paths) => paths,
        Err(status) => return status,
    };

    let config = ValidateConfig {
        repair: if cli.repair {
            RepairOptions::apply()
        } else {
            RepairOptions::report_only()
        },
        cores: cli.cores,
        verbose: cli.verbose,
    };

    #[cfg(feature = "parallel")]
    let tally = if config.cores > 1 {
        lasrepair::par_validate_files(&paths, &config)
    } else {
        lasrepair::validate_files(&paths, &config)
    };
    #[cfg(not(feature = "parallel"))]
    let tally = {
        if config.cores > 1 {
            tracing::warn!("built without the 'parallel' feature, --cores is ignored");
        }
        lasrepair::validate_files(&paths, &config)
    };

    if paths.len() > 1 {
        tracing::info!("{}", tally);
    }
    Status::Success
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Status::Success.into(),
                _ => Status::WrongCommandLineSyntax.into(),
            };
        }
    };
    init_tracing(cli.verbose);

    match std::panic::catch_unwind(move || run(cli)) {
        Ok(status) => status.into(),
        Err(_) => Status::UnknownError.into(),
    }
}
