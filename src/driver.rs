//! Validation of whole files, one after the other or in parallel.

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::Path;

use crate::errors::Result;
use crate::las::file::{FileFormat, LasReader};
use crate::repair::{repair_header, RepairOptions};
use crate::stats::{accumulate, InventoryReport, LasInventory, LasSummary, SummaryReport};
use crate::validate::{assemble_verdict, FileOutcome, HeaderRules, RuleValidator, ValidationTally};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ValidateConfig {
    pub repair: RepairOptions,
    /// Number of files validated at the same time, used by `par_validate_files`
    pub cores: usize,
    pub verbose: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            repair: RepairOptions::report_only(),
            cores: 1,
            verbose: false,
        }
    }
}

fn open_reader<'a>(path: &Path) -> Result<LasReader<'a>> {
    let file = File::open(path)?;
    LasReader::new(BufReader::new(file))
}

/// Validates one file, and repairs its header when asked to and needed.
pub fn validate_file<P: AsRef<Path>>(path: P, config: &ValidateConfig) -> Result<FileOutcome> {
    let path = path.as_ref();
    FileFormat::from_path(path)?;

    let mut reader = open_reader(path)?;
    let mut stats = (LasSummary::new(), LasInventory::new());
    accumulate(&mut reader, &mut stats)?;
    let (summary, inventory) = stats;
    let header = reader.into_header();

    if config.verbose {
        tracing::info!(
            path = %path.display(),
            "\n{}{}",
            SummaryReport::new(&summary).with_quantizer(header.quantizer()),
            InventoryReport::new(&inventory)
        );
    }

    let status = HeaderRules.validate(&header, &summary);
    for message in status.fails() {
        tracing::warn!(path = %path.display(), "FAIL: {}", message);
    }
    for message in status.warnings() {
        tracing::warn!(path = %path.display(), "WARNING: {}", message);
    }

    let report = if !status.verdict().is_pass() && config.repair.is_apply() {
        let mut source = open_reader(path)?;
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        Some(repair_header(
            path,
            &mut source,
            &header,
            &mut file,
            config.repair,
        )?)
    } else {
        None
    };

    let outcome = assemble_verdict(status, report.as_ref());
    tracing::info!(
        path = %path.display(),
        verdict = %outcome.verdict,
        repaired = outcome.repaired,
        "done"
    );
    Ok(outcome)
}

fn tally_file<P: AsRef<Path>>(path: P, config: &ValidateConfig) -> ValidationTally {
    let mut tally = ValidationTally::default();
    match validate_file(&path, config) {
        Ok(outcome) => tally.add(&outcome),
        Err(e) => {
            tracing::error!(path = %path.as_ref().display(), "{}", e);
            tally.add_error();
        }
    }
    tally
}

/// Validates the files in order, a file that cannot be read counts as failed.
pub fn validate_files<P: AsRef<Path>>(paths: &[P], config: &ValidateConfig) -> ValidationTally {
    paths
        .iter()
        .map(|path| tally_file(path, config))
        .fold(ValidationTally::default(), ValidationTally::merge)
}

/// Just like [`validate_files`] but each file is validated in a rayon thread,
/// using at most `config.cores` threads.
///
/// [`validate_files`]: fn.validate_files.html
#[cfg(feature = "parallel")]
pub fn par_validate_files<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &ValidateConfig,
) -> ValidationTally {
    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

    let run = || {
        paths
            .par_iter()
            .map(|path| tally_file(path, config))
            .reduce(ValidationTally::default, ValidationTally::merge)
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.cores.max(1))
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            tracing::warn!("could not build a pool of {} threads: {}", config.cores, e);
            run()
        }
    }
}
