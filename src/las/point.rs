//! Decoded point records and the read-only view the accumulators consume.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_traits::clamp;

use crate::errors::{LasRepairError, Result};

/// Description of one of the point formats defined by the LAS standard (0 to 10).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PointFormat {
    id: u8,
}

impl PointFormat {
    pub fn new(id: u8) -> Result<Self> {
        if id <= 10 {
            Ok(Self { id })
        } else {
            Err(LasRepairError::UnsupportedPointFormat(id))
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Formats 6 to 10 use the 4 bit returns and the 8 bit classification.
    pub fn is_extended(&self) -> bool {
        self.id >= 6
    }

    pub fn has_gps_time(&self) -> bool {
        self.id != 0 && self.id != 2
    }

    pub fn has_rgb(&self) -> bool {
        matches!(self.id, 2 | 3 | 5 | 7 | 8 | 10)
    }

    pub fn has_nir(&self) -> bool {
        matches!(self.id, 8 | 10)
    }

    pub fn has_wave_packet(&self) -> bool {
        matches!(self.id, 4 | 5 | 9 | 10)
    }

    /// Size of a record without extra bytes.
    pub fn record_size(&self) -> u16 {
        let mut size = if self.is_extended() { 30 } else { 20 };
        if self.has_gps_time() && !self.is_extended() {
            size += 8;
        }
        if self.has_rgb() {
            size += 6;
        }
        if self.has_nir() {
            size += 2;
        }
        if self.has_wave_packet() {
            size += WavePacket::SIZE as u16;
        }
        size
    }
}

/// Classification code of a point, tagged with the table it belongs to.
///
/// Legacy codes (0 to 31) fit the 5 bits of formats 0 to 5,
/// codes 32 to 255 can only be stored by the extended formats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    Legacy(u8),
    Extended(u8),
}

impl Classification {
    pub fn code(self) -> u8 {
        match self {
            Classification::Legacy(code) | Classification::Extended(code) => code,
        }
    }
}

/// Read-only accessors over one decoded point.
///
/// Points of the extended formats also answer the legacy accessors
/// with values derived from their extended fields.
pub trait PointView {
    fn x(&self) -> i32;
    fn y(&self) -> i32;
    fn z(&self) -> i32;
    fn intensity(&self) -> u16;

    fn is_extended_point_type(&self) -> bool;

    fn return_number(&self) -> u8; // 3 bits
    fn number_of_returns(&self) -> u8; // 3 bits
    fn extended_return_number(&self) -> u8; // 4 bits
    fn extended_number_of_returns(&self) -> u8; // 4 bits

    fn classification(&self) -> u8; // 5 bits
    fn extended_classification(&self) -> u8;

    fn synthetic_flag(&self) -> bool;
    fn keypoint_flag(&self) -> bool;
    fn withheld_flag(&self) -> bool;
    fn extended_overlap_flag(&self) -> bool;

    fn scan_angle_rank(&self) -> i8;
    fn extended_scan_angle(&self) -> i16;
    fn user_data(&self) -> u8;
    fn point_source_id(&self) -> u16;
    fn gps_time(&self) -> f64;

    fn red(&self) -> u16;
    fn green(&self) -> u16;
    fn blue(&self) -> u16;
    fn nir(&self) -> u16;

    /// Descriptor index of the wave packet, `None` when the point has none.
    fn wave_packet_index(&self) -> Option<u8>;

    fn xyz(&self) -> [i32; 3] {
        [self.x(), self.y(), self.z()]
    }

    /// Return number, taken from the extended field for extended points.
    fn resolved_return_number(&self) -> u8 {
        if self.is_extended_point_type() {
            self.extended_return_number()
        } else {
            self.return_number()
        }
    }

    fn resolved_number_of_returns(&self) -> u8 {
        if self.is_extended_point_type() {
            self.extended_number_of_returns()
        } else {
            self.number_of_returns()
        }
    }

    fn resolved_classification(&self) -> Classification {
        if self.is_extended_point_type() && self.extended_classification() > 31 {
            Classification::Extended(self.extended_classification())
        } else {
            Classification::Legacy(self.classification())
        }
    }
}

#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct WavePacket {
    pub descriptor_index: u8,
    pub offset: u64,
    pub size: u32,
    pub return_point: f32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

impl WavePacket {
    pub const SIZE: usize = 29;

    pub fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            descriptor_index: src.read_u8()?,
            offset: src.read_u64::<LittleEndian>()?,
            size: src.read_u32::<LittleEndian>()?,
            return_point: src.read_f32::<LittleEndian>()?,
            dx: src.read_f32::<LittleEndian>()?,
            dy: src.read_f32::<LittleEndian>()?,
            dz: src.read_f32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u8(self.descriptor_index)?;
        dst.write_u64::<LittleEndian>(self.offset)?;
        dst.write_u32::<LittleEndian>(self.size)?;
        dst.write_f32::<LittleEndian>(self.return_point)?;
        dst.write_f32::<LittleEndian>(self.dx)?;
        dst.write_f32::<LittleEndian>(self.dy)?;
        dst.write_f32::<LittleEndian>(self.dz)?;
        Ok(())
    }
}

fn scan_angle_rank_from_extended(scan_angle: i16) -> i8 {
    let rank = (0.006f32 * f32::from(scan_angle)).round() as i32;
    clamp(rank, i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

fn extended_scan_angle_from_rank(rank: i8) -> i16 {
    (f32::from(rank) / 0.006f32).round() as i16
}

/// A point of any format, with both legacy and extended fields populated.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct PointRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub intensity: u16,

    pub extended_point_type: bool,

    pub return_number: u8,
    pub number_of_returns: u8,
    pub extended_return_number: u8,
    pub extended_number_of_returns: u8,

    pub classification: u8,
    pub extended_classification: u8,

    pub synthetic: bool,
    pub keypoint: bool,
    pub withheld: bool,
    pub overlap: bool,

    pub scanner_channel: u8,
    pub scan_direction_flag: bool,
    pub edge_of_flight_line: bool,

    pub scan_angle_rank: i8,
    pub extended_scan_angle: i16,
    pub user_data: u8,
    pub point_source_id: u16,
    pub gps_time: f64,

    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub nir: u16,

    pub wave_packet: Option<WavePacket>,
}

impl PointRecord {
    /// Decodes one record of the given format, extra bytes are ignored.
    pub fn read_from<R: Read>(src: &mut R, format: PointFormat) -> std::io::Result<Self> {
        let mut point = PointRecord {
            x: src.read_i32::<LittleEndian>()?,
            y: src.read_i32::<LittleEndian>()?,
            z: src.read_i32::<LittleEndian>()?,
            intensity: src.read_u16::<LittleEndian>()?,
            extended_point_type: format.is_extended(),
            ..Default::default()
        };

        if format.is_extended() {
            let bit_fields = src.read_u8()?;
            point.extended_return_number = bit_fields & 0b0000_1111;
            point.extended_number_of_returns = (bit_fields & 0b1111_0000) >> 4;
            let flags = src.read_u8()?;
            point.synthetic = flags & 0b0000_0001 != 0;
            point.keypoint = flags & 0b0000_0010 != 0;
            point.withheld = flags & 0b0000_0100 != 0;
            point.overlap = flags & 0b0000_1000 != 0;
            point.scanner_channel = (flags & 0b0011_0000) >> 4;
            point.scan_direction_flag = flags & 0b0100_0000 != 0;
            point.edge_of_flight_line = flags & 0b1000_0000 != 0;
            point.extended_classification = src.read_u8()?;
            point.user_data = src.read_u8()?;
            point.extended_scan_angle = src.read_i16::<LittleEndian>()?;
            point.point_source_id = src.read_u16::<LittleEndian>()?;
            point.gps_time = src.read_f64::<LittleEndian>()?;

            point.return_number = point.extended_return_number.min(7);
            point.number_of_returns = point.extended_number_of_returns.min(7);
            point.classification = if point.extended_classification < 32 {
                point.extended_classification
            } else {
                0
            };
            point.scan_angle_rank = scan_angle_rank_from_extended(point.extended_scan_angle);
        } else {
            let bit_fields = src.read_u8()?;
            point.return_number = bit_fields & 0x7;
            point.number_of_returns = (bit_fields >> 3) & 0x7;
            point.scan_direction_flag = ((bit_fields >> 6) & 0x1) != 0;
            point.edge_of_flight_line = ((bit_fields >> 7) & 0x1) != 0;
            let classification = src.read_u8()?;
            point.classification = classification & 0x1f;
            point.synthetic = classification & 0x20 != 0;
            point.keypoint = classification & 0x40 != 0;
            point.withheld = classification & 0x80 != 0;
            point.scan_angle_rank = src.read_i8()?;
            point.user_data = src.read_u8()?;
            point.point_source_id = src.read_u16::<LittleEndian>()?;
            if format.has_gps_time() {
                point.gps_time = src.read_f64::<LittleEndian>()?;
            }

            point.extended_return_number = point.return_number;
            point.extended_number_of_returns = point.number_of_returns;
            point.extended_classification = point.classification;
            point.extended_scan_angle = extended_scan_angle_from_rank(point.scan_angle_rank);
        }

        if format.has_rgb() {
            point.red = src.read_u16::<LittleEndian>()?;
            point.green = src.read_u16::<LittleEndian>()?;
            point.blue = src.read_u16::<LittleEndian>()?;
        }
        if format.has_nir() {
            point.nir = src.read_u16::<LittleEndian>()?;
        }
        if format.has_wave_packet() {
            point.wave_packet = Some(WavePacket::read_from(src)?);
        }
        Ok(point)
    }

    /// Encodes the record in the given format, the reverse of [`read_from`].
    ///
    /// [`read_from`]: #method.read_from
    pub fn write_to<W: Write>(&self, dst: &mut W, format: PointFormat) -> std::io::Result<()> {
        dst.write_i32::<LittleEndian>(self.x)?;
        dst.write_i32::<LittleEndian>(self.y)?;
        dst.write_i32::<LittleEndian>(self.z)?;
        dst.write_u16::<LittleEndian>(self.intensity)?;

        if format.is_extended() {
            dst.write_u8(
                (self.extended_number_of_returns & 0xf) << 4 | (self.extended_return_number & 0xf),
            )?;
            let flags = (self.synthetic as u8)
                | (self.keypoint as u8) << 1
                | (self.withheld as u8) << 2
                | (self.overlap as u8) << 3
                | (self.scanner_channel & 0x3) << 4
                | (self.scan_direction_flag as u8) << 6
                | (self.edge_of_flight_line as u8) << 7;
            dst.write_u8(flags)?;
            dst.write_u8(self.extended_classification)?;
            dst.write_u8(self.user_data)?;
            dst.write_i16::<LittleEndian>(self.extended_scan_angle)?;
            dst.write_u16::<LittleEndian>(self.point_source_id)?;
            dst.write_f64::<LittleEndian>(self.gps_time)?;
        } else {
            dst.write_u8(
                (self.edge_of_flight_line as u8) << 7
                    | (self.scan_direction_flag as u8) << 6
                    | (self.number_of_returns & 0x7) << 3
                    | (self.return_number & 0x7),
            )?;
            dst.write_u8(
                (self.withheld as u8) << 7
                    | (self.keypoint as u8) << 6
                    | (self.synthetic as u8) << 5
                    | (self.classification & 0x1f),
            )?;
            dst.write_i8(self.scan_angle_rank)?;
            dst.write_u8(self.user_data)?;
            dst.write_u16::<LittleEndian>(self.point_source_id)?;
            if format.has_gps_time() {
                dst.write_f64::<LittleEndian>(self.gps_time)?;
            }
        }

        if format.has_rgb() {
            dst.write_u16::<LittleEndian>(self.red)?;
            dst.write_u16::<LittleEndian>(self.green)?;
            dst.write_u16::<LittleEndian>(self.blue)?;
        }
        if format.has_nir() {
            dst.write_u16::<LittleEndian>(self.nir)?;
        }
        if format.has_wave_packet() {
            self.wave_packet.unwrap_or_default().write_to(dst)?;
        }
        Ok(())
    }
}

impl PointView for PointRecord {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn z(&self) -> i32 {
        self.z
    }

    fn intensity(&self) -> u16 {
        self.intensity
    }

    fn is_extended_point_type(&self) -> bool {
        self.extended_point_type
    }

    fn return_number(&self) -> u8 {
        self.return_number
    }

    fn number_of_returns(&self) -> u8 {
        self.number_of_returns
    }

    fn extended_return_number(&self) -> u8 {
        self.extended_return_number
    }

    fn extended_number_of_returns(&self) -> u8 {
        self.extended_number_of_returns
    }

    fn classification(&self) -> u8 {
        self.classification
    }

    fn extended_classification(&self) -> u8 {
        self.extended_classification
    }

    fn synthetic_flag(&self) -> bool {
        self.synthetic
    }

    fn keypoint_flag(&self) -> bool {
        self.keypoint
    }

    fn withheld_flag(&self) -> bool {
        self.withheld
    }

    fn extended_overlap_flag(&self) -> bool {
        self.overlap
    }

    fn scan_angle_rank(&self) -> i8 {
        self.scan_angle_rank
    }

    fn extended_scan_angle(&self) -> i16 {
        self.extended_scan_angle
    }

    fn user_data(&self) -> u8 {
        self.user_data
    }

    fn point_source_id(&self) -> u16 {
        self.point_source_id
    }

    fn gps_time(&self) -> f64 {
        self.gps_time
    }

    fn red(&self) -> u16 {
        self.red
    }

    fn green(&self) -> u16 {
        self.green
    }

    fn blue(&self) -> u16 {
        self.blue
    }

    fn nir(&self) -> u16 {
        self.nir
    }

    fn wave_packet_index(&self) -> Option<u8> {
        self.wave_packet.map(|w| w.descriptor_index)
    }
}
