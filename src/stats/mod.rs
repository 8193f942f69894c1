//! Streaming statistics gathered over every point of a file.
//!
//! Two profiles exist:
//!
//! - [`LasSummary`] is what the header repair works from: return and classification
//!   histograms, flag counters, extrema and the detection of coordinates that all share
//!   the low digits of the first point.
//! - [`LasInventory`] keeps the return pulse histograms, the extrema of every field,
//!   the coordinates whose low digits are all zero and the wave packet indices in use.
//!
//! Both are fed one point at a time through [`PointAccumulator::add`].
//!
//! [`LasSummary`]: summary/struct.LasSummary.html
//! [`LasInventory`]: inventory/struct.LasInventory.html
//! [`PointAccumulator::add`]: trait.PointAccumulator.html#tymethod.add

pub mod inventory;
pub mod report;
pub mod summary;

pub use inventory::LasInventory;
pub use report::{InventoryReport, SummaryReport};
pub use summary::LasSummary;

use crate::errors::Result;
use crate::las::file::PointSource;
use crate::las::point::PointView;

/// Something that can be fed the points of a file, in file order.
pub trait PointAccumulator {
    /// Adds a point, this never fails.
    fn add<P: PointView + ?Sized>(&mut self, point: &P);

    fn number_of_point_records(&self) -> u64;

    /// true once at least one point was added
    fn is_active(&self) -> bool {
        self.number_of_point_records() > 0
    }
}

impl<A: PointAccumulator, B: PointAccumulator> PointAccumulator for (A, B) {
    fn add<P: PointView + ?Sized>(&mut self, point: &P) {
        self.0.add(point);
        self.1.add(point);
    }

    fn number_of_point_records(&self) -> u64 {
        self.0.number_of_point_records()
    }
}

/// Drains the source into the accumulator.
pub fn accumulate<S, A>(source: &mut S, accumulator: &mut A) -> Result<()>
where
    S: PointSource + ?Sized,
    A: PointAccumulator + ?Sized,
{
    while let Some(point) = source.read_next() {
        accumulator.add(point?);
    }
    Ok(())
}

/// Running minimum and maximum of one channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MinMax<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> MinMax<T> {
    pub fn new(value: T) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn update(&mut self, value: T) {
        if value < self.min {
            self.min = value;
        } else if value > self.max {
            self.max = value;
        }
    }
}

/// Extrema of every scalar channel of the points seen so far.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChannelExtrema {
    pub x: MinMax<i32>,
    pub y: MinMax<i32>,
    pub z: MinMax<i32>,
    pub intensity: MinMax<u16>,
    pub point_source_id: MinMax<u16>,
    pub scan_angle_rank: MinMax<i8>,
    pub extended_scan_angle: MinMax<i16>,
    pub user_data: MinMax<u8>,
    pub gps_time: MinMax<f64>,
    pub red: MinMax<u16>,
    pub green: MinMax<u16>,
    pub blue: MinMax<u16>,
    pub nir: MinMax<u16>,
}

impl ChannelExtrema {
    pub fn from_point<P: PointView + ?Sized>(point: &P) -> Self {
        Self {
            x: MinMax::new(point.x()),
            y: MinMax::new(point.y()),
            z: MinMax::new(point.z()),
            intensity: MinMax::new(point.intensity()),
            point_source_id: MinMax::new(point.point_source_id()),
            scan_angle_rank: MinMax::new(point.scan_angle_rank()),
            extended_scan_angle: MinMax::new(point.extended_scan_angle()),
            user_data: MinMax::new(point.user_data()),
            gps_time: MinMax::new(point.gps_time()),
            red: MinMax::new(point.red()),
            green: MinMax::new(point.green()),
            blue: MinMax::new(point.blue()),
            nir: MinMax::new(point.nir()),
        }
    }

    pub fn update<P: PointView + ?Sized>(&mut self, point: &P) {
        self.x.update(point.x());
        self.y.update(point.y());
        self.z.update(point.z());
        self.intensity.update(point.intensity());
        self.point_source_id.update(point.point_source_id());
        self.scan_angle_rank.update(point.scan_angle_rank());
        self.extended_scan_angle.update(point.extended_scan_angle());
        self.user_data.update(point.user_data());
        self.gps_time.update(point.gps_time());
        self.red.update(point.red());
        self.green.update(point.green());
        self.blue.update(point.blue());
        self.nir.update(point.nir());
    }

    /// Grid extrema of one axis (0: x, 1: y, 2: z).
    pub fn axis(&self, axis: usize) -> MinMax<i32> {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

const DIGIT_MODULI: [i32; 4] = [10, 100, 1_000, 10_000];

/// Counts, per axis, the points whose low decimal digits match a reference.
///
/// The test at a given width only runs when the narrower one matched,
/// so `hits[axis][d + 1] <= hits[axis][d]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LowDigitFluff<const DEPTH: usize> {
    reference: [[i32; DEPTH]; 3],
    hits: [[u64; DEPTH]; 3],
}

impl<const DEPTH: usize> Default for LowDigitFluff<DEPTH> {
    fn default() -> Self {
        Self {
            reference: [[0; DEPTH]; 3],
            hits: [[0; DEPTH]; 3],
        }
    }
}

impl<const DEPTH: usize> LowDigitFluff<DEPTH> {
    /// Takes the low digits of `xyz` as the pattern later points are compared to.
    pub fn set_reference(&mut self, xyz: [i32; 3]) {
        for (reference, coordinate) in self.reference.iter_mut().zip(xyz.iter()) {
            for (digits, modulus) in reference.iter_mut().zip(DIGIT_MODULI.iter()) {
                *digits = coordinate % modulus;
            }
        }
    }

    pub fn observe(&mut self, xyz: [i32; 3]) {
        for axis in 0..3 {
            for depth in 0..DEPTH {
                if xyz[axis] % DIGIT_MODULI[depth] != self.reference[axis][depth] {
                    break;
                }
                self.hits[axis][depth] += 1;
            }
        }
    }

    pub fn hits(&self, axis: usize, depth: usize) -> u64 {
        self.hits[axis][depth]
    }

    /// true when every one of the `total` points matched at this width.
    pub fn all_match(&self, axis: usize, depth: usize, total: u64) -> bool {
        total > 0 && self.hits[axis][depth] == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::las::point::PointRecord;

    #[test]
    fn test_min_max_single_pass() {
        let mut range = MinMax::new(5);
        for v in [3, 9, 9, 5, -1, 12].iter() {
            range.update(*v);
        }
        assert_eq!(range, MinMax { min: -1, max: 12 });
    }

    #[test]
    fn test_min_max_ignores_nan() {
        let mut range = MinMax::new(1.0f64);
        range.update(f64::NAN);
        range.update(3.0);
        assert_eq!(range.min, 1.0);
        assert_eq!(range.max, 3.0);
    }

    #[test]
    fn test_fluff_short_circuits() {
        let mut fluff = LowDigitFluff::<3>::default();
        // 105 % 10 != 0, the 100 test must not run even if 105 % 100 were 0
        fluff.observe([105, 200, 1000]);
        assert_eq!(fluff.hits(0, 0), 0);
        assert_eq!(fluff.hits(0, 1), 0);
        assert_eq!(fluff.hits(1, 0), 1);
        assert_eq!(fluff.hits(1, 1), 1);
        assert_eq!(fluff.hits(1, 2), 0);
        assert_eq!(fluff.hits(2, 2), 1);
    }

    #[test]
    fn test_fluff_with_reference() {
        let mut fluff = LowDigitFluff::<4>::default();
        fluff.set_reference([12345, -17, 0]);
        fluff.observe([12345, -17, 0]);
        fluff.observe([99345, -27, 10]);
        assert!(fluff.all_match(0, 2, 2));
        assert!(!fluff.all_match(0, 3, 2));
        assert!(fluff.all_match(1, 0, 2));
        assert!(!fluff.all_match(1, 1, 2));
        assert!(fluff.all_match(2, 0, 2));
        assert!(!fluff.all_match(2, 0, 0));
    }

    #[test]
    fn test_accumulate_pair() {
        let points = vec![PointRecord::default(); 4];
        let mut pair = (LasSummary::default(), LasInventory::default());
        accumulate(&mut points.iter(), &mut pair).unwrap();
        assert_eq!(pair.number_of_point_records(), 4);
        assert_eq!(pair.1.number_of_point_records(), 4);
        assert!(pair.is_active());
    }
}
