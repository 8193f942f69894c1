//! Pass / fail / warning verdicts.
//!
//! A [`RuleValidator`] looks at a header and the summary of its points and produces a
//! [`ValidatorStatus`], the messages of every rule that failed or warned.
//! [`assemble_verdict`] combines it with the outcome of a header repair, if one ran.
//!
//! [`RuleValidator`]: trait.RuleValidator.html
//! [`ValidatorStatus`]: struct.ValidatorStatus.html
//! [`assemble_verdict`]: fn.assemble_verdict.html

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::las::header::HeaderSnapshot;
use crate::repair::{plan_repairs, CheckOutcome, RepairOptions, RepairReport};
use crate::stats::{LasSummary, PointAccumulator};

/// Bit set of the verdict of one or many files.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Verdict(u32);

impl Verdict {
    pub const PASS: Verdict = Verdict(0);
    pub const FAIL: Verdict = Verdict(1);
    pub const WARNING: Verdict = Verdict(2);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self == Verdict::PASS
    }

    pub fn is_fail(self) -> bool {
        self.0 & Verdict::FAIL.0 != 0
    }

    pub fn is_warning(self) -> bool {
        self.0 & Verdict::WARNING.0 != 0
    }
}

impl BitOr for Verdict {
    type Output = Verdict;

    fn bitor(self, rhs: Verdict) -> Verdict {
        Verdict(self.0 | rhs.0)
    }
}

impl BitOrAssign for Verdict {
    fn bitor_assign(&mut self, rhs: Verdict) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_fail() {
            f.write_str("fail")
        } else if self.is_warning() {
            f.write_str("warning")
        } else {
            f.write_str("pass")
        }
    }
}

/// What the rule based validation found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidatorStatus {
    fails: Vec<String>,
    warnings: Vec<String>,
}

impl ValidatorStatus {
    pub fn fail<S: Into<String>>(&mut self, message: S) {
        self.fails.push(message.into());
    }

    pub fn warn<S: Into<String>>(&mut self, message: S) {
        self.warnings.push(message.into());
    }

    pub fn fails(&self) -> &[String] {
        &self.fails
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn verdict(&self) -> Verdict {
        let mut verdict = Verdict::PASS;
        if !self.fails.is_empty() {
            verdict |= Verdict::FAIL;
        }
        if !self.warnings.is_empty() {
            verdict |= Verdict::WARNING;
        }
        verdict
    }
}

pub trait RuleValidator {
    fn validate(&self, header: &HeaderSnapshot, summary: &LasSummary) -> ValidatorStatus;
}

/// Checks the header against the points, and the points against what the format allows.
#[derive(Debug, Default, Copy, Clone)]
pub struct HeaderRules;

impl RuleValidator for HeaderRules {
    fn validate(&self, header: &HeaderSnapshot, summary: &LasSummary) -> ValidatorStatus {
        let mut status = ValidatorStatus::default();
        for message in header.diagnostics().fails() {
            status.fail(message.clone());
        }
        for message in header.diagnostics().warnings() {
            status.warn(message.clone());
        }

        if !summary.is_active() {
            status.fail("file contains no point records");
            return status;
        }

        let plan = plan_repairs(header, summary, RepairOptions::report_only());
        for report in plan.checks() {
            match report.outcome {
                CheckOutcome::Inconsistent => {
                    status.fail(format!("{} in header differs from the points", report.check))
                }
                CheckOutcome::Unrepairable(reason) => status.fail(reason.to_string()),
                _ => {}
            }
        }

        let by_return = &summary.number_of_points_by_return;
        if by_return[0] != 0 {
            status.warn(format!("there are {} points with return number 0", by_return[0]));
        }
        if !header.version.has_extended_counts() {
            for return_number in [6usize, 7].iter() {
                if by_return[*return_number] != 0 {
                    status.warn(format!(
                        "there are {} points with return number {}, LAS {} has only 5 slots",
                        by_return[*return_number], return_number, header.version
                    ));
                }
            }
        }
        if summary.number_of_returns[0] != 0 {
            status.warn(format!(
                "there are {} points with a number of returns of given pulse of 0",
                summary.number_of_returns[0]
            ));
        }
        for (axis, name) in ['X', 'Y', 'Z'].iter().enumerate() {
            if summary.has_serious_fluff(axis) {
                status.warn(format!("all {} coordinates share their last two digits", name));
            }
        }
        status
    }
}

/// The verdict of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub verdict: Verdict,
    /// A repair ran and left the header consistent.
    pub repaired: bool,
    pub status: ValidatorStatus,
}

pub fn assemble_verdict(status: ValidatorStatus, repair: Option<&RepairReport>) -> FileOutcome {
    let repaired = repair
        .map(|report| report.any_repaired() && report.is_consistent())
        .unwrap_or(false);
    FileOutcome {
        verdict: status.verdict(),
        repaired,
        status,
    }
}

/// Counts of the verdicts over many files.
///
/// Files that were repaired are counted in `repaired` instead of `fail` or `warning`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ValidationTally {
    pub pass: u32,
    pub warning: u32,
    pub fail: u32,
    pub repaired: u32,
    pub total: Verdict,
}

impl ValidationTally {
    pub fn add(&mut self, outcome: &FileOutcome) {
        self.total |= outcome.verdict;
        if outcome.verdict.is_pass() {
            self.pass += 1;
        } else if outcome.repaired {
            self.repaired += 1;
        } else if outcome.verdict.is_fail() {
            self.fail += 1;
        } else {
            self.warning += 1;
        }
    }

    /// A file that could not be read at all.
    pub fn add_error(&mut self) {
        self.total |= Verdict::FAIL;
        self.fail += 1;
    }

    pub fn merge(mut self, other: ValidationTally) -> Self {
        self.pass += other.pass;
        self.warning += other.warning;
        self.fail += other.fail;
        self.repaired += other.repaired;
        self.total |= other.total;
        self
    }

    pub fn files(&self) -> u32 {
        self.pass + self.warning + self.fail + self.repaired
    }
}

impl fmt::Display for ValidationTally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "total {} (pass={}, warning={}, fail={}, repaired={})",
            self.total, self.pass, self.warning, self.fail, self.repaired
        )
    }
}
