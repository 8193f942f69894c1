//! The public header block of a LAS file, as seen by the validator.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::{LasRepairError, Result};
use crate::las::offsets::{
    HEADER_SIZE, LAS_1_2_HEADER_SIZE, LAS_1_3_HEADER_SIZE, LAS_1_4_HEADER_SIZE, SCALE_FACTORS,
    START_OF_WAVEFORM_DATA, VERSION_MAJOR,
};
use crate::las::point::PointFormat;

const IS_COMPRESSED_MASK: u8 = 0x80;

fn is_point_format_compressed(point_format_id: u8) -> bool {
    point_format_id & IS_COMPRESSED_MASK == IS_COMPRESSED_MASK
}

fn point_format_id_compressed_to_uncompressed(point_format_id: u8) -> u8 {
    point_format_id & 0x3f
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// LAS 1.4 added the 64 bit point counts
    pub fn has_extended_counts(&self) -> bool {
        *self >= Version::new(1, 4)
    }

    pub fn has_waveform_start(&self) -> bool {
        *self >= Version::new(1, 3)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Scale and offset of each axis, used to turn the integer
/// coordinates stored in points into real world coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quantizer {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            scale: [0.01; 3],
            offset: [0.0; 3],
        }
    }
}

impl Quantizer {
    pub fn new(scale: [f64; 3], offset: [f64; 3]) -> Self {
        Self { scale, offset }
    }

    pub fn get(&self, axis: usize, value: i32) -> f64 {
        self.scale[axis] * f64::from(value) + self.offset[axis]
    }

    pub fn get_x(&self, x: i32) -> f64 {
        self.get(0, x)
    }

    pub fn get_y(&self, y: i32) -> f64 {
        self.get(1, y)
    }

    pub fn get_z(&self, z: i32) -> f64 {
        self.get(2, z)
    }
}

/// Layout of the bytes that follow the standard fields of each point record.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    extra_bytes: u16,
}

impl AttributeSchema {
    pub fn new(extra_bytes: u16) -> Self {
        Self { extra_bytes }
    }

    pub fn extra_bytes(&self) -> u16 {
        self.extra_bytes
    }
}

/// Problems found while decoding the header that do not prevent reading the points.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderDiagnostics {
    fails: Vec<String>,
    warnings: Vec<String>,
}

impl HeaderDiagnostics {
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

    pub fn has_fails(&self) -> bool {
        !self.fails.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Bounding box, fields in the order they are stored in the header.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub max_x: f64,
    pub min_x: f64,
    pub max_y: f64,
    pub min_y: f64,
    pub max_z: f64,
    pub min_z: f64,
}

impl Bounds {
    pub fn from_array(values: [f64; 6]) -> Self {
        Self {
            max_x: values[0],
            min_x: values[1],
            max_y: values[2],
            min_y: values[3],
            max_z: values[4],
            min_z: values[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.max_x, self.min_x, self.max_y, self.min_y, self.max_z, self.min_z,
        ]
    }
}

/// Fields only present in LAS 1.4 headers.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ExtendedHeader {
    pub start_of_first_evlr: u64,
    pub number_of_evlrs: u32,
    pub number_of_point_records: u64,
    pub number_of_points_by_return: [u64; 15],
}

/// The header fields the validator and the repair engine work with.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSnapshot {
    pub version: Version,
    pub global_encoding: u16,
    pub header_size: u16,
    pub offset_to_points: u32,
    pub number_of_vlrs: u32,
    pub point_format: PointFormat,
    pub is_compressed: bool,
    pub point_size: u16,
    pub legacy_number_of_point_records: u32,
    pub legacy_number_of_points_by_return: [u32; 5],
    pub bounds: Bounds,
    /// LAS 1.3 and higher only
    pub start_of_waveform_data: Option<u64>,
    /// LAS 1.4 only
    pub extended: Option<ExtendedHeader>,
    quantizer: Quantizer,
    attributes: AttributeSchema,
    diagnostics: HeaderDiagnostics,
}

impl HeaderSnapshot {
    /// Creates a snapshot with empty counts, mostly useful to build files.
    pub fn new(version: Version, point_format: PointFormat) -> Self {
        let header_size = if version.has_extended_counts() {
            LAS_1_4_HEADER_SIZE
        } else if version.has_waveform_start() {
            LAS_1_3_HEADER_SIZE
        } else {
            LAS_1_2_HEADER_SIZE
        };
        Self {
            version,
            global_encoding: 0,
            header_size,
            offset_to_points: u32::from(header_size),
            number_of_vlrs: 0,
            point_format,
            is_compressed: false,
            point_size: point_format.record_size(),
            legacy_number_of_point_records: 0,
            legacy_number_of_points_by_return: [0; 5],
            bounds: Bounds::default(),
            start_of_waveform_data: if version.has_waveform_start() {
                Some(0)
            } else {
                None
            },
            extended: if version.has_extended_counts() {
                Some(ExtendedHeader::default())
            } else {
                None
            },
            quantizer: Quantizer::default(),
            attributes: AttributeSchema::default(),
            diagnostics: HeaderDiagnostics::default(),
        }
    }

    pub fn with_quantizer(mut self, quantizer: Quantizer) -> Self {
        self.quantizer = quantizer;
        self
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn attributes(&self) -> &AttributeSchema {
        &self.attributes
    }

    pub fn diagnostics(&self) -> &HeaderDiagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut HeaderDiagnostics {
        &mut self.diagnostics
    }

    /// The number of points the header claims.
    ///
    /// The 64 bit field holds it when the header has one, the legacy field otherwise.
    pub fn declared_point_count(&self) -> u64 {
        match self.extended {
            Some(extended) => extended.number_of_point_records,
            None => u64::from(self.legacy_number_of_point_records),
        }
    }

    pub fn read_from<R: Read + Seek>(src: &mut R) -> Result<Self> {
        src.seek(SeekFrom::Start(0))?;
        let mut signature = [0u8; 4];
        src.read_exact(&mut signature)?;
        if &signature != b"LASF" {
            return Err(LasRepairError::InvalidSignature(signature));
        }
        let _file_source_id = src.read_u16::<LittleEndian>()?;
        let global_encoding = src.read_u16::<LittleEndian>()?;

        src.seek(SeekFrom::Start(VERSION_MAJOR))?;
        let version = Version::new(src.read_u8()?, src.read_u8()?);

        src.seek(SeekFrom::Start(HEADER_SIZE))?;
        let header_size = src.read_u16::<LittleEndian>()?;
        let offset_to_points = src.read_u32::<LittleEndian>()?;
        let number_of_vlrs = src.read_u32::<LittleEndian>()?;
        let raw_point_format_id = src.read_u8()?;
        let point_size = src.read_u16::<LittleEndian>()?;
        let legacy_number_of_point_records = src.read_u32::<LittleEndian>()?;
        let mut legacy_number_of_points_by_return = [0u32; 5];
        src.read_u32_into::<LittleEndian>(&mut legacy_number_of_points_by_return)?;

        src.seek(SeekFrom::Start(SCALE_FACTORS))?;
        let mut scale = [0f64; 3];
        src.read_f64_into::<LittleEndian>(&mut scale)?;
        let mut offset = [0f64; 3];
        src.read_f64_into::<LittleEndian>(&mut offset)?;
        let mut bounds = [0f64; 6];
        src.read_f64_into::<LittleEndian>(&mut bounds)?;

        let is_compressed = is_point_format_compressed(raw_point_format_id);
        let point_format_id = point_format_id_compressed_to_uncompressed(raw_point_format_id);
        let point_format = PointFormat::new(point_format_id)?;

        let mut diagnostics = HeaderDiagnostics::default();
        if version.major != 1 || version.minor > 4 {
            diagnostics.warn(format!("unknown LAS version {}", version));
        }
        if point_format.is_extended() && !version.has_extended_counts() {
            diagnostics.warn(format!(
                "point format {} requires LAS 1.4 but version is {}",
                point_format.id(),
                version
            ));
        }
        if offset_to_points < u32::from(header_size) {
            diagnostics.fail(format!(
                "offset to point data {} is smaller than header size {}",
                offset_to_points, header_size
            ));
        }
        if point_size < point_format.record_size() {
            diagnostics.fail(format!(
                "point data record length {} is too small for point format {} ({} bytes)",
                point_size,
                point_format.id(),
                point_format.record_size()
            ));
        }
        let attributes = AttributeSchema::new(point_size.saturating_sub(point_format.record_size()));

        let start_of_waveform_data =
            if version.has_waveform_start() && header_size >= LAS_1_3_HEADER_SIZE {
                src.seek(SeekFrom::Start(START_OF_WAVEFORM_DATA))?;
                Some(src.read_u64::<LittleEndian>()?)
            } else {
                None
            };

        let extended = if version.has_extended_counts() {
            if header_size >= LAS_1_4_HEADER_SIZE {
                let start_of_first_evlr = src.read_u64::<LittleEndian>()?;
                let number_of_evlrs = src.read_u32::<LittleEndian>()?;
                let number_of_point_records = src.read_u64::<LittleEndian>()?;
                let mut number_of_points_by_return = [0u64; 15];
                src.read_u64_into::<LittleEndian>(&mut number_of_points_by_return)?;
                Some(ExtendedHeader {
                    start_of_first_evlr,
                    number_of_evlrs,
                    number_of_point_records,
                    number_of_points_by_return,
                })
            } else {
                diagnostics.fail(format!(
                    "header size {} is too small for LAS {} ({} bytes)",
                    header_size, version, LAS_1_4_HEADER_SIZE
                ));
                None
            }
        } else {
            None
        };

        Ok(Self {
            version,
            global_encoding,
            header_size,
            offset_to_points,
            number_of_vlrs,
            point_format,
            is_compressed,
            point_size,
            legacy_number_of_point_records,
            legacy_number_of_points_by_return,
            bounds: Bounds::from_array(bounds),
            start_of_waveform_data,
            extended,
            quantizer: Quantizer::new(scale, offset),
            attributes,
            diagnostics,
        })
    }

    /// Writes the public header block, padded with zeros up to `header_size`.
    ///
    /// Fields the snapshot does not keep (GUID, system identifier, ...) are written as zeros.
    pub fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        let mut buf = Vec::with_capacity(usize::from(self.header_size));
        buf.write_all(b"LASF")?;
        buf.write_u16::<LittleEndian>(0)?;
        buf.write_u16::<LittleEndian>(self.global_encoding)?;
        buf.write_all(&[0u8; 16])?;
        buf.write_u8(self.version.major)?;
        buf.write_u8(self.version.minor)?;
        buf.write_all(&[0u8; 64])?;
        buf.write_u16::<LittleEndian>(0)?;
        buf.write_u16::<LittleEndian>(0)?;
        buf.write_u16::<LittleEndian>(self.header_size)?;
        buf.write_u32::<LittleEndian>(self.offset_to_points)?;
        buf.write_u32::<LittleEndian>(self.number_of_vlrs)?;
        let mut point_format_id = self.point_format.id();
        if self.is_compressed {
            point_format_id |= IS_COMPRESSED_MASK;
        }
        buf.write_u8(point_format_id)?;
        buf.write_u16::<LittleEndian>(self.point_size)?;
        buf.write_u32::<LittleEndian>(self.legacy_number_of_point_records)?;
        for count in self.legacy_number_of_points_by_return.iter() {
            buf.write_u32::<LittleEndian>(*count)?;
        }
        for value in self
            .quantizer
            .scale
            .iter()
            .chain(self.quantizer.offset.iter())
            .chain(self.bounds.to_array().iter())
        {
            buf.write_f64::<LittleEndian>(*value)?;
        }
        if let Some(start) = self.start_of_waveform_data {
            buf.write_u64::<LittleEndian>(start)?;
        }
        if let Some(extended) = &self.extended {
            buf.write_u64::<LittleEndian>(extended.start_of_first_evlr)?;
            buf.write_u32::<LittleEndian>(extended.number_of_evlrs)?;
            buf.write_u64::<LittleEndian>(extended.number_of_point_records)?;
            for count in extended.number_of_points_by_return.iter() {
                buf.write_u64::<LittleEndian>(*count)?;
            }
        }
        if buf.len() < usize::from(self.header_size) {
            buf.resize(usize::from(self.header_size), 0);
        }
        dst.write_all(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(!Version::new(1, 3).has_extended_counts());
        assert!(Version::new(1, 4).has_extended_counts());
        assert!(Version::new(1, 3).has_waveform_start());
        assert!(!Version::new(1, 2).has_waveform_start());
        assert_eq!(Version::new(1, 2).to_string(), "1.2");
    }

    #[test]
    fn test_quantizer() {
        let q = Quantizer::new([0.01, 0.1, 0.001], [100.0, 200.0, 0.0]);
        assert_eq!(q.get_x(150), 101.5);
        assert_eq!(q.get_y(-10), 199.0);
        assert_eq!(q.get_z(2500), 2.5);
    }

    #[test]
    fn test_bounds_file_order() {
        let b = Bounds::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(b.max_x, 1.0);
        assert_eq!(b.min_z, 6.0);
        assert_eq!(b.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_bad_signature() {
        let mut src = std::io::Cursor::new(vec![0u8; 400]);
        match HeaderSnapshot::read_from(&mut src) {
            Err(LasRepairError::InvalidSignature(sig)) => assert_eq!(sig, [0u8; 4]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_then_read_keeps_repairable_fields() {
        let mut header = HeaderSnapshot::new(Version::new(1, 4), PointFormat::new(7).unwrap())
            .with_quantizer(Quantizer::new([0.001; 3], [10.0, 20.0, 30.0]));
        header.legacy_number_of_point_records = 3;
        header.legacy_number_of_points_by_return = [1, 1, 1, 0, 0];
        header.bounds = Bounds::from_array([5.0, 1.0, 6.0, 2.0, 7.0, 3.0]);
        header.extended.as_mut().unwrap().number_of_point_records = 3;
        header.extended.as_mut().unwrap().number_of_points_by_return[14] = 9;

        let mut buf = std::io::Cursor::new(Vec::new());
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.get_ref().len(), usize::from(LAS_1_4_HEADER_SIZE));

        let read = HeaderSnapshot::read_from(&mut buf).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_declared_point_count() {
        let mut header = HeaderSnapshot::new(Version::new(1, 4), PointFormat::new(6).unwrap());
        header.legacy_number_of_point_records = 0;
        header.extended.as_mut().unwrap().number_of_point_records = 5_000_000_000;
        assert_eq!(header.declared_point_count(), 5_000_000_000);

        let mut header = HeaderSnapshot::new(Version::new(1, 2), PointFormat::new(1).unwrap());
        header.legacy_number_of_point_records = 12;
        assert_eq!(header.declared_point_count(), 12);

        let mut header = HeaderSnapshot::new(Version::new(1, 4), PointFormat::new(1).unwrap());
        header.legacy_number_of_point_records = 20;
        header.extended.as_mut().unwrap().number_of_point_records = 25;
        assert_eq!(header.declared_point_count(), 25);
        header.extended.as_mut().unwrap().number_of_point_records = 7;
        assert_eq!(header.declared_point_count(), 7);
    }
}
