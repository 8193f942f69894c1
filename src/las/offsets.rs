//! Fixed byte offsets of the header fields that can be repaired.
//!
//! The offsets follow the LAS 1.4 public header block layout and are the same
//! for every version that has the field. They must never be derived from the
//! `header_size` stored in the file.

/// A repairable, fixed width field of the public header block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HeaderField {
    /// `u32` legacy number of point records
    LegacyPointCount,
    /// `[u32; 5]` legacy number of points by return
    LegacyPointsByReturn,
    /// `[f64; 6]` max x, min x, max y, min y, max z, min z
    BoundingBox,
    /// `u64` number of point records (LAS 1.4)
    ExtendedPointCount,
    /// `[u64; 15]` number of points by return (LAS 1.4)
    ExtendedPointsByReturn,
}

impl HeaderField {
    #[cfg(test)]
    pub(crate) const ALL: [HeaderField; 5] = [
        HeaderField::LegacyPointCount,
        HeaderField::LegacyPointsByReturn,
        HeaderField::BoundingBox,
        HeaderField::ExtendedPointCount,
        HeaderField::ExtendedPointsByReturn,
    ];

    pub const fn offset(self) -> u64 {
        match self {
            HeaderField::LegacyPointCount => 107,
            HeaderField::LegacyPointsByReturn => 111,
            HeaderField::BoundingBox => 179,
            HeaderField::ExtendedPointCount => 247,
            HeaderField::ExtendedPointsByReturn => 255,
        }
    }

    /// Width in bytes.
    pub const fn width(self) -> usize {
        match self {
            HeaderField::LegacyPointCount => 4,
            HeaderField::LegacyPointsByReturn => 5 * 4,
            HeaderField::BoundingBox => 6 * 8,
            HeaderField::ExtendedPointCount => 8,
            HeaderField::ExtendedPointsByReturn => 15 * 8,
        }
    }

    pub const fn end(self) -> u64 {
        self.offset() + self.width() as u64
    }

    /// Only present in LAS 1.4 headers.
    pub const fn is_extended(self) -> bool {
        matches!(
            self,
            HeaderField::ExtendedPointCount | HeaderField::ExtendedPointsByReturn
        )
    }
}

// Other fixed positions of the public header block, needed to decode it.
pub(crate) const VERSION_MAJOR: u64 = 24;
pub(crate) const HEADER_SIZE: u64 = 94;
pub(crate) const SCALE_FACTORS: u64 = 131;
pub(crate) const START_OF_WAVEFORM_DATA: u64 = 227;

/// Size of the public header block for LAS 1.0 to 1.2
pub const LAS_1_2_HEADER_SIZE: u16 = 227;
/// Size of the public header block for LAS 1.3
pub const LAS_1_3_HEADER_SIZE: u16 = 235;
/// Size of the public header block for LAS 1.4
pub const LAS_1_4_HEADER_SIZE: u16 = 375;
