//! The summary profile, ground truth for the header repair.

use crate::las::header::{Bounds, Quantizer};
use crate::las::point::{Classification, PointView};
use crate::stats::{ChannelExtrema, LowDigitFluff, PointAccumulator};

/// Point counts for the classification codes 0 to 31.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LegacyClassificationHistogram([u64; 32]);

impl LegacyClassificationHistogram {
    fn add(&mut self, code: u8) {
        self.0[usize::from(code & 0x1f)] += 1;
    }

    pub fn get(&self, code: u8) -> u64 {
        self.0.get(usize::from(code)).copied().unwrap_or(0)
    }

    /// `(code, count)` of the codes that were seen.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, count)| **count != 0)
            .map(|(code, count)| (code as u8, *count))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// Point counts for the classification codes 32 to 255,
/// only extended point formats can store them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtendedClassificationHistogram([u64; 224]);

impl Default for ExtendedClassificationHistogram {
    fn default() -> Self {
        Self([0; 224])
    }
}

impl ExtendedClassificationHistogram {
    const FIRST_CODE: u8 = 32;

    fn add(&mut self, code: u8) {
        debug_assert!(code >= Self::FIRST_CODE);
        if let Some(count) = self.0.get_mut(usize::from(code.wrapping_sub(Self::FIRST_CODE))) {
            *count += 1;
        }
    }

    pub fn get(&self, code: u8) -> u64 {
        if code < Self::FIRST_CODE {
            return 0;
        }
        self.0[usize::from(code - Self::FIRST_CODE)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, count)| **count != 0)
            .map(|(i, count)| (i as u8 + Self::FIRST_CODE, *count))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// Number of points with a given flag set, and their classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlagCounter {
    pub total: u64,
    by_classification: [u64; 256],
}

impl Default for FlagCounter {
    fn default() -> Self {
        Self {
            total: 0,
            by_classification: [0; 256],
        }
    }
}

impl FlagCounter {
    fn add(&mut self, classification: u8) {
        self.total += 1;
        self.by_classification[usize::from(classification)] += 1;
    }

    pub fn by_classification(&self, classification: u8) -> u64 {
        self.by_classification[usize::from(classification)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.by_classification
            .iter()
            .enumerate()
            .filter(|(_, count)| **count != 0)
            .map(|(code, count)| (code as u8, *count))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LasSummary {
    pub number_of_point_records: u64,
    /// indexed by return number, index 0 counts invalid points
    pub number_of_points_by_return: [u64; 16],
    /// indexed by number of returns of the pulse
    pub number_of_returns: [u64; 16],
    pub classification: LegacyClassificationHistogram,
    pub extended_classification: ExtendedClassificationHistogram,
    pub flagged_synthetic: FlagCounter,
    pub flagged_keypoint: FlagCounter,
    pub flagged_withheld: FlagCounter,
    pub flagged_extended_overlap: FlagCounter,
    extrema: Option<ChannelExtrema>,
    fluff: LowDigitFluff<4>,
}

impl LasSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first point was added.
    pub fn extrema(&self) -> Option<&ChannelExtrema> {
        self.extrema.as_ref()
    }

    /// Bounding box of the points in real world coordinates.
    pub fn bounds(&self, quantizer: &Quantizer) -> Option<Bounds> {
        self.extrema.map(|e| Bounds {
            max_x: quantizer.get_x(e.x.max),
            min_x: quantizer.get_x(e.x.min),
            max_y: quantizer.get_y(e.y.max),
            min_y: quantizer.get_y(e.y.min),
            max_z: quantizer.get_z(e.z.max),
            min_z: quantizer.get_z(e.z.min),
        })
    }

    /// Every point shares the last digit of the first point on that axis.
    pub fn has_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 0, self.number_of_point_records)
    }

    /// Same for the last two digits.
    pub fn has_serious_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 1, self.number_of_point_records)
    }

    pub fn has_very_serious_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 2, self.number_of_point_records)
    }

    pub fn has_extremely_serious_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 3, self.number_of_point_records)
    }

    pub fn has_fluff_on_any_axis(&self) -> bool {
        (0..3).any(|axis| self.has_fluff(axis))
    }

    pub fn has_serious_fluff_on_any_axis(&self) -> bool {
        (0..3).any(|axis| self.has_serious_fluff(axis))
    }

    pub fn has_very_serious_fluff_on_any_axis(&self) -> bool {
        (0..3).any(|axis| self.has_very_serious_fluff(axis))
    }

    pub fn has_extremely_serious_fluff_on_any_axis(&self) -> bool {
        (0..3).any(|axis| self.has_extremely_serious_fluff(axis))
    }
}

impl PointAccumulator for LasSummary {
    fn add<P: PointView + ?Sized>(&mut self, point: &P) {
        self.number_of_point_records += 1;
        self.number_of_points_by_return[usize::from(point.resolved_return_number() & 0xf)] += 1;
        self.number_of_returns[usize::from(point.resolved_number_of_returns() & 0xf)] += 1;

        let classification = point.resolved_classification();
        match classification {
            Classification::Legacy(code) => self.classification.add(code),
            Classification::Extended(code) => self.extended_classification.add(code),
        }
        let code = classification.code();
        if point.synthetic_flag() {
            self.flagged_synthetic.add(code);
        }
        if point.keypoint_flag() {
            self.flagged_keypoint.add(code);
        }
        if point.withheld_flag() {
            self.flagged_withheld.add(code);
        }
        if point.extended_overlap_flag() {
            self.flagged_extended_overlap.add(code);
        }

        let xyz = point.xyz();
        if let Some(extrema) = self.extrema.as_mut() {
            extrema.update(point);
        } else {
            self.extrema = Some(ChannelExtrema::from_point(point));
            self.fluff.set_reference(xyz);
        }
        self.fluff.observe(xyz);
    }

    fn number_of_point_records(&self) -> u64 {
        self.number_of_point_records
    }
}
