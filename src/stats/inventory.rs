use crate::las::point::PointView;
use crate::stats::{ChannelExtrema, LowDigitFluff, PointAccumulator};

/// The inventory profile: what a point cloud contains, field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct LasInventory {
    pub number_of_point_records: u64,
    pub number_of_points_by_return: [u64; 16],
    pub number_of_returns: [u64; 16],
    /// `[number_of_returns][return_number]`
    pub return_count_for_return_number: [[u64; 16]; 16],
    extrema: Option<ChannelExtrema>,
    fluff: LowDigitFluff<3>,
    wave_packet_index_mask: [u32; 8],
}

impl Default for LasInventory {
    fn default() -> Self {
        Self {
            number_of_point_records: 0,
            number_of_points_by_return: [0; 16],
            number_of_returns: [0; 16],
            return_count_for_return_number: [[0; 16]; 16],
            extrema: None,
            // the reference stays at zero, hits count round coordinates
            fluff: LowDigitFluff::default(),
            wave_packet_index_mask: [0; 8],
        }
    }
}

impl LasInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extrema(&self) -> Option<&ChannelExtrema> {
        self.extrema.as_ref()
    }

    pub fn has_wave_packet_index(&self, index: u8) -> bool {
        let index = u32::from(index);
        self.wave_packet_index_mask[(index / 32) as usize] & (1u32 << (index % 32)) != 0
    }

    pub fn wave_packet_indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |index| self.has_wave_packet_index(*index))
    }

    /// Every coordinate of the axis is a multiple of 10.
    pub fn has_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 0, self.number_of_point_records)
    }

    /// ... of 100.
    pub fn has_serious_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 1, self.number_of_point_records)
    }

    /// ... of 1000.
    pub fn has_very_serious_fluff(&self, axis: usize) -> bool {
        self.fluff.all_match(axis, 2, self.number_of_point_records)
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
}

impl PointAccumulator for LasInventory {
    fn add<P: PointView + ?Sized>(&mut self, point: &P) {
        let return_number = usize::from(point.resolved_return_number() & 0xf);
        let number_of_returns = usize::from(point.resolved_number_of_returns() & 0xf);
        self.number_of_point_records += 1;
        self.number_of_points_by_return[return_number] += 1;
        self.number_of_returns[number_of_returns] += 1;
        self.return_count_for_return_number[number_of_returns][return_number] += 1;

        match self.extrema.as_mut() {
            Some(extrema) => extrema.update(point),
            None => self.extrema = Some(ChannelExtrema::from_point(point)),
        }
        self.fluff.observe(point.xyz());

        if let Some(index) = point.wave_packet_index() {
            let index = u32::from(index);
            self.wave_packet_index_mask[(index / 32) as usize] |= 1u32 << (index % 32);
        }
    }

    fn number_of_point_records(&self) -> u64 {
        self.number_of_point_records
    }
}
