//! Header repair.
//!
//! The points of a file are the ground truth: they are drained through a [`LasSummary`]
//! and four independent checks compare the result with the header:
//!
//! - the total number of point records (legacy `u32` field, and the `u64` one of LAS 1.4)
//! - the legacy number of points by return
//! - the extended number of points by return (LAS 1.4)
//! - the bounding box
//!
//! Each check yields at most one [`Patch`]: the complete new content of one fixed width
//! header field. Nothing else of the file is ever touched.
//!
//! [`LasSummary`]: ../stats/summary/struct.LasSummary.html
//! [`Patch`]: struct.Patch.html

use std::fmt;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use num_traits::ToPrimitive;

use crate::errors::{LasRepairError, Result};
use crate::las::file::{FileFormat, PointSource};
use crate::las::header::HeaderSnapshot;
use crate::las::offsets::HeaderField;
use crate::stats::{accumulate, LasSummary, PointAccumulator};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RepairMode {
    /// Inconsistent fields are overwritten.
    Apply,
    /// Inconsistent fields are only reported.
    ReportOnly,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RepairOptions {
    pub mode: RepairMode,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self::report_only()
    }
}

impl RepairOptions {
    pub fn apply() -> Self {
        Self {
            mode: RepairMode::Apply,
        }
    }

    pub fn report_only() -> Self {
        Self {
            mode: RepairMode::ReportOnly,
        }
    }

    pub fn is_apply(&self) -> bool {
        self.mode == RepairMode::Apply
    }
}

/// The four checks run on every header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RepairCheck {
    PointCount,
    PointsByReturn,
    ExtendedPointsByReturn,
    BoundingBox,
}

impl RepairCheck {
    pub const ALL: [RepairCheck; 4] = [
        RepairCheck::PointCount,
        RepairCheck::PointsByReturn,
        RepairCheck::ExtendedPointsByReturn,
        RepairCheck::BoundingBox,
    ];
}

impl fmt::Display for RepairCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RepairCheck::PointCount => "number of point records",
            RepairCheck::PointsByReturn => "number of points by return",
            RepairCheck::ExtendedPointsByReturn => "extended number of points by return",
            RepairCheck::BoundingBox => "bounding box",
        };
        f.write_str(name)
    }
}

/// Why a field could not be given its true value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnrepairableReason {
    /// The number of point records does not fit the `u32` field and the header has no 64 bit one.
    PointCountOverflow { count: u64 },
    /// Same for one of the legacy points by return slots.
    PointsByReturnOverflow { return_number: u8, count: u64 },
}

impl fmt::Display for UnrepairableReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnrepairableReason::PointCountOverflow { count } => write!(
                f,
                "real number of point records ({}) exceeds {}",
                count,
                u32::MAX
            ),
            UnrepairableReason::PointsByReturnOverflow {
                return_number,
                count,
            } => write!(
                f,
                "for return {} real number of points by return ({}) exceeds {}",
                return_number,
                count,
                u32::MAX
            ),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Correct,
    Repaired,
    /// The field is wrong but the options asked not to write.
    Inconsistent,
    NotApplicable,
    /// There were no points to compare against.
    Skipped,
    Unrepairable(UnrepairableReason),
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            CheckOutcome::Correct | CheckOutcome::NotApplicable | CheckOutcome::Skipped
        )
    }
}

/// New content of one header field.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub field: HeaderField,
    pub bytes: Vec<u8>,
}

impl Patch {
    fn from_u32s(field: HeaderField, values: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self { field, bytes }
    }

    fn from_u64s(field: HeaderField, values: &[u64]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self { field, bytes }
    }

    fn from_f64s(field: HeaderField, values: &[f64]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for value in values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self { field, bytes }
    }

    /// Overwrites the field, in a single write of exactly the field's width.
    pub fn write_to<W: Write + Seek>(&self, dst: &mut W) -> Result<()> {
        if self.bytes.len() != self.field.width() {
            return Err(LasRepairError::PatchSizeMismatch {
                field: self.field,
                len: self.bytes.len(),
                expected: self.field.width(),
            });
        }
        dst.seek(SeekFrom::Start(self.field.offset()))?;
        dst.write_all(&self.bytes)?;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub check: RepairCheck,
    pub outcome: CheckOutcome,
}

/// Outcome of every check, in the order of [`RepairCheck::ALL`].
///
/// [`RepairCheck::ALL`]: enum.RepairCheck.html#associatedconstant.ALL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub checks: Vec<CheckReport>,
    pub patches_written: usize,
}

impl RepairReport {
    pub fn outcome(&self, check: RepairCheck) -> Option<CheckOutcome> {
        self.checks
            .iter()
            .find(|report| report.check == check)
            .map(|report| report.outcome)
    }

    pub fn any_repaired(&self) -> bool {
        self.checks
            .iter()
            .any(|report| report.outcome == CheckOutcome::Repaired)
    }

    pub fn any_inconsistent(&self) -> bool {
        self.checks
            .iter()
            .any(|report| report.outcome == CheckOutcome::Inconsistent)
    }

    pub fn any_unrepairable(&self) -> bool {
        self.checks
            .iter()
            .any(|report| matches!(report.outcome, CheckOutcome::Unrepairable(_)))
    }

    /// Every field is now consistent with the points.
    pub fn is_consistent(&self) -> bool {
        self.checks
            .iter()
            .all(|report| report.outcome.is_ok() || report.outcome == CheckOutcome::Repaired)
    }
}

/// The patches needed to make a header agree with its points.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairPlan {
    checks: Vec<CheckReport>,
    patches: Vec<Patch>,
    mode: RepairMode,
}

impl RepairPlan {
    pub fn checks(&self) -> &[CheckReport] {
        &self.checks
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Writes every patch (unless the plan was made in report only mode) and flushes.
    pub fn apply<W: Write + Seek>(self, dst: &mut W) -> Result<RepairReport> {
        let mut patches_written = 0;
        if self.mode == RepairMode::Apply {
            for patch in &self.patches {
                patch.write_to(dst)?;
                patches_written += 1;
            }
            dst.flush()?;
        }
        Ok(RepairReport {
            checks: self.checks,
            patches_written,
        })
    }

    /// The report of the plan, without writing anything.
    pub fn into_report(self) -> RepairReport {
        RepairReport {
            checks: self.checks,
            patches_written: 0,
        }
    }
}

struct Planner {
    mode: RepairMode,
    checks: Vec<CheckReport>,
    patches: Vec<Patch>,
}

impl Planner {
    fn finish(
        &mut self,
        check: RepairCheck,
        patches: Vec<Patch>,
        unrepairable: Option<UnrepairableReason>,
    ) {
        let outcome = if let Some(reason) = unrepairable {
            CheckOutcome::Unrepairable(reason)
        } else if patches.is_empty() {
            CheckOutcome::Correct
        } else if self.mode == RepairMode::Apply {
            CheckOutcome::Repaired
        } else {
            CheckOutcome::Inconsistent
        };
        self.patches.extend(patches);
        self.checks.push(CheckReport { check, outcome });
    }

    fn skip(&mut self, check: RepairCheck, outcome: CheckOutcome) {
        self.checks.push(CheckReport { check, outcome });
    }
}

fn check_point_count(planner: &mut Planner, header: &HeaderSnapshot, count: u64) {
    let mut patches = Vec::new();
    let mut unrepairable = None;
    let legacy = header.legacy_number_of_point_records;

    let new_legacy = if header.point_format.is_extended() {
        Some(0)
    } else {
        match count.to_u32() {
            Some(count) => Some(count),
            None if header.extended.is_some() => Some(0),
            None => {
                tracing::warn!(
                    count,
                    stored = legacy,
                    "real number of point records exceeds {}, cannot repair",
                    u32::MAX
                );
                unrepairable = Some(UnrepairableReason::PointCountOverflow { count });
                None
            }
        }
    };
    if let Some(new_legacy) = new_legacy.filter(|value| *value != legacy) {
        tracing::info!(
            stored = legacy,
            real = count,
            new = new_legacy,
            "legacy number of point records is wrong"
        );
        patches.push(Patch::from_u32s(HeaderField::LegacyPointCount, &[new_legacy]));
    }

    if let Some(extended) = &header.extended {
        if extended.number_of_point_records != count {
            tracing::info!(
                stored = extended.number_of_point_records,
                real = count,
                "extended number of point records is wrong"
            );
            patches.push(Patch::from_u64s(HeaderField::ExtendedPointCount, &[count]));
        }
    }
    if patches.is_empty() && unrepairable.is_none() {
        tracing::debug!(count, "number of point records in header is correct");
    }
    planner.finish(RepairCheck::PointCount, patches, unrepairable);
}

fn check_points_by_return(planner: &mut Planner, header: &HeaderSnapshot, summary: &LasSummary) {
    let stored = header.legacy_number_of_points_by_return;
    let mut values = stored;
    let mut unrepairable = None;

    if header.point_format.is_extended() {
        values = [0; 5];
    } else {
        for (slot, value) in values.iter_mut().enumerate() {
            let return_number = slot + 1;
            let count = summary.number_of_points_by_return[return_number];
            if u64::from(*value) == count {
                continue;
            }
            match count.to_u32() {
                Some(count) => *value = count,
                None if header.extended.is_some() => *value = 0,
                None => {
                    tracing::warn!(
                        return_number,
                        count,
                        "real number of points by return exceeds {}, cannot repair",
                        u32::MAX
                    );
                    unrepairable.get_or_insert(UnrepairableReason::PointsByReturnOverflow {
                        return_number: return_number as u8,
                        count,
                    });
                }
            }
        }
    }

    let mut patches = Vec::new();
    if values != stored {
        tracing::info!(?stored, new = ?values, "legacy number of points by return is wrong");
        patches.push(Patch::from_u32s(HeaderField::LegacyPointsByReturn, &values));
    }
    planner.finish(RepairCheck::PointsByReturn, patches, unrepairable);
}

fn check_extended_points_by_return(
    planner: &mut Planner,
    header: &HeaderSnapshot,
    summary: &LasSummary,
) {
    let extended = match &header.extended {
        Some(extended) => extended,
        None => {
            return planner.skip(
                RepairCheck::ExtendedPointsByReturn,
                CheckOutcome::NotApplicable,
            )
        }
    };
    let mut real = [0u64; 15];
    real.copy_from_slice(&summary.number_of_points_by_return[1..]);

    let mut patches = Vec::new();
    if real != extended.number_of_points_by_return {
        tracing::info!(
            stored = ?extended.number_of_points_by_return,
            real = ?real,
            "extended number of points by return is wrong"
        );
        patches.push(Patch::from_u64s(HeaderField::ExtendedPointsByReturn, &real));
    }
    planner.finish(RepairCheck::ExtendedPointsByReturn, patches, None);
}

fn check_bounding_box(planner: &mut Planner, header: &HeaderSnapshot, summary: &LasSummary) {
    let real = match summary.bounds(header.quantizer()) {
        Some(bounds) => bounds.to_array(),
        None => return planner.skip(RepairCheck::BoundingBox, CheckOutcome::Skipped),
    };
    let stored = header.bounds.to_array();

    let mut patches = Vec::new();
    if real != stored {
        tracing::info!(?stored, ?real, "bounding box is wrong");
        patches.push(Patch::from_f64s(HeaderField::BoundingBox, &real));
    }
    planner.finish(RepairCheck::BoundingBox, patches, None);
}

/// Compares the header to the summary of its points.
///
/// This only computes what would be written, see [`RepairPlan::apply`].
///
/// [`RepairPlan::apply`]: struct.RepairPlan.html#method.apply
pub fn plan_repairs(
    header: &HeaderSnapshot,
    summary: &LasSummary,
    options: RepairOptions,
) -> RepairPlan {
    let mut planner = Planner {
        mode: options.mode,
        checks: Vec::with_capacity(RepairCheck::ALL.len()),
        patches: Vec::new(),
    };
    if !summary.is_active() {
        tracing::debug!("no points, header checks are skipped");
        for check in RepairCheck::ALL.iter() {
            planner.skip(*check, CheckOutcome::Skipped);
        }
    } else {
        check_point_count(&mut planner, header, summary.number_of_point_records);
        check_points_by_return(&mut planner, header, summary);
        check_extended_points_by_return(&mut planner, header, summary);
        check_bounding_box(&mut planner, header, summary);
    }
    RepairPlan {
        checks: planner.checks,
        patches: planner.patches,
        mode: options.mode,
    }
}

/// Reads every point of `source` and repairs the header of `file` accordingly.
///
/// `path` is only used to make sure the file is a LAS or LAZ file,
/// nothing is read or written when it is not.
pub fn repair_header<S, F>(
    path: &Path,
    source: &mut S,
    header: &HeaderSnapshot,
    file: &mut F,
    options: RepairOptions,
) -> Result<RepairReport>
where
    S: PointSource + ?Sized,
    F: Write + Seek,
{
    FileFormat::from_path(path)?;
    let mut summary = LasSummary::new();
    accumulate(source, &mut summary)?;
    let report = plan_repairs(header, &summary, options).apply(file)?;
    if report.patches_written > 0 {
        tracing::info!(
            path = %path.display(),
            patches = report.patches_written,
            "header was repaired"
        );
    }
    Ok(report)
}
