//! Definitions of error related things.

use std::path::PathBuf;

use crate::las::offsets::HeaderField;

/// Errors of this crate
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LasRepairError {
    /// The file does not belong to the LAS / LAZ family
    #[error("can only repair header for LAS or LAZ files, got '{}'", .0.display())]
    UnsupportedFileFormat(PathBuf),
    /// The first 4 bytes are not "LASF"
    #[error("file signature is {0:?} instead of \"LASF\"")]
    InvalidSignature([u8; 4]),
    /// The point format id is not supported
    #[error("point format {0} is not supported")]
    UnsupportedPointFormat(u8),
    /// Compressed points but no laszip vlr in the file
    #[error("point data is compressed but no laszip vlr was found")]
    MissingLasZipVlr,
    /// Error from the LAZ decompressor
    #[error("laszip error: {0}")]
    LasZip(#[from] laz::LasZipError),
    /// Wrapper around and io error from the std lib
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A patch does not have the width of the header field it targets
    #[error("patch for {field:?} is {len} bytes but the field is {expected} bytes wide")]
    PatchSizeMismatch {
        field: HeaderField,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, LasRepairError>;
