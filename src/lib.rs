//! Validation and in-place header repair of LAS and LAZ files.
//!
//! Every point of a file is read and summarized, the summary is the ground truth
//! the header is compared to. When asked to, the fields of the header that disagree
//! with the points are overwritten, at their fixed offsets, without touching
//! the point data.
//!
//! The fields that can be repaired are:
//!
//! - the number of point records (legacy and LAS 1.4 fields)
//! - the number of points by return (legacy and LAS 1.4 fields)
//! - the bounding box
//!
//! # Examples
//!
//! ```no_run
//! use lasrepair::{validate_file, RepairOptions, ValidateConfig};
//!
//! # fn main() -> lasrepair::Result<()> {
//! let config = ValidateConfig {
//!     repair: RepairOptions::apply(),
//!     ..Default::default()
//! };
//! let outcome = validate_file("lidar.laz", &config)?;
//! println!("{} (repaired: {})", outcome.verdict, outcome.repaired);
//! # Ok(())
//! # }
//! ```
//!
//! The pieces can also be used on their own, for example to only compute what would be repaired:
//!
//! ```no_run
//! use lasrepair::las::file::LasReader;
//! use lasrepair::stats::{accumulate, LasSummary};
//! use lasrepair::{plan_repairs, RepairOptions};
//!
//! # fn main() -> lasrepair::Result<()> {
//! let mut reader = LasReader::new(std::io::BufReader::new(std::fs::File::open("lidar.las")?))?;
//! let mut summary = LasSummary::new();
//! accumulate(&mut reader, &mut summary)?;
//!
//! let plan = plan_repairs(reader.header(), &summary, RepairOptions::report_only());
//! for patch in plan.patches() {
//!     println!("{:?} at offset {}", patch.field, patch.field.offset());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Parallelism
//!
//! This crate has an optional feature 'parallel'.
//! When using this feature, [`par_validate_files`] validates many files at once.
//!
//! [`par_validate_files`]: driver/fn.par_validate_files.html

pub mod driver;
pub mod errors;
pub mod las;
pub mod repair;
pub mod stats;
pub mod validate;

#[cfg(feature = "parallel")]
pub use driver::par_validate_files;
pub use driver::{validate_file, validate_files, ValidateConfig};
pub use errors::{LasRepairError, Result};
pub use las::file::{FileFormat, LasReader};
pub use las::header::{HeaderSnapshot, Version};
pub use las::offsets::HeaderField;
pub use repair::{
    plan_repairs, repair_header, CheckOutcome, RepairCheck, RepairMode, RepairOptions,
    RepairPlan, RepairReport, UnrepairableReason,
};
pub use validate::{
    assemble_verdict, FileOutcome, HeaderRules, RuleValidator, ValidationTally, ValidatorStatus,
    Verdict,
};
