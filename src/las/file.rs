//! Reading points out of LAS and LAZ files.
//!
//! There is just enough here to feed every point of a file to the accumulators,
//! LAZ decompression is delegated to the `laz` crate.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use laz::{LasZipDecompressor, LazVlr};

use crate::errors::{LasRepairError, Result};
use crate::las::header::HeaderSnapshot;
use crate::las::point::{PointRecord, PointView};

const LASZIP_USER_ID: &str = "laszip encoded";
const LASZIP_RECORD_ID: u16 = 22204;
const WAVEFORM_DATA_INTERNAL: u16 = 0x2;

/// The two members of the LAS family the tool accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileFormat {
    Las,
    Laz,
}

impl FileFormat {
    /// Decides the format from the extension, case insensitive.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("las") => Ok(FileFormat::Las),
            Some("laz") => Ok(FileFormat::Laz),
            _ => Err(LasRepairError::UnsupportedFileFormat(path.to_path_buf())),
        }
    }
}

pub struct Vlr {
    user_id: [u8; 16],
    record_id: u16,
    #[allow(dead_code)]
    description: [u8; 32],
    data: Vec<u8>,
}

impl Vlr {
    pub fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
        src.read_u16::<LittleEndian>()?; // reserved
        let mut user_id = [0u8; 16];
        src.read_exact(&mut user_id)?;

        let record_id = src.read_u16::<LittleEndian>()?;
        let record_length = src.read_u16::<LittleEndian>()?;

        let mut description = [0u8; 32];
        src.read_exact(&mut description)?;

        let mut data = vec![0u8; usize::from(record_length)];
        src.read_exact(&mut data)?;

        Ok(Self {
            user_id,
            record_id,
            description,
            data,
        })
    }

    pub fn user_id(&self) -> String {
        String::from_utf8_lossy(&self.user_id)
            .trim_end_matches(|c| c as u8 == 0)
            .to_owned()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn is_laszip_vlr(&self) -> bool {
        self.record_id == LASZIP_RECORD_ID && self.user_id() == LASZIP_USER_ID
    }
}

/// Reads the vlrs that follow the header and returns the laszip one, if any.
pub fn read_vlrs_and_get_laszip_vlr<R: Read + Seek>(
    src: &mut R,
    header: &HeaderSnapshot,
) -> Result<Option<LazVlr>> {
    src.seek(SeekFrom::Start(u64::from(header.header_size)))?;
    let mut laszip_vlr = None;
    for _ in 0..header.number_of_vlrs {
        let vlr = Vlr::read_from(src)?;
        if vlr.is_laszip_vlr() {
            laszip_vlr = Some(LazVlr::from_buffer(vlr.data())?);
        }
    }
    Ok(laszip_vlr)
}

/// A source of points, read one after the other in file order.
pub trait PointSource {
    type Point: PointView + ?Sized;

    fn read_next(&mut self) -> Option<Result<&Self::Point>>;
}

impl<'p, P: PointView> PointSource for std::slice::Iter<'p, P> {
    type Point = P;

    fn read_next(&mut self) -> Option<Result<&P>> {
        self.next().map(Ok)
    }
}

trait LasPointReader {
    fn read_next_into(&mut self, buffer: &mut [u8]) -> std::io::Result<()>;
}

struct RawPointReader<R: Read> {
    src: R,
}

impl<R: Read> LasPointReader for RawPointReader<R> {
    fn read_next_into(&mut self, buffer: &mut [u8]) -> std::io::Result<()> {
        self.src.read_exact(buffer)
    }
}

impl<'a, R: Read + Seek + Send + 'a> LasPointReader for LasZipDecompressor<'a, R> {
    fn read_next_into(&mut self, buffer: &mut [u8]) -> std::io::Result<()> {
        self.decompress_one(buffer)
    }
}

/// Number of whole records stored between the start of the points and the end of the point block.
fn count_raw_records<R: Seek>(src: &mut R, header: &mut HeaderSnapshot) -> Result<u64> {
    let start = u64::from(header.offset_to_points);
    let mut end = src.seek(SeekFrom::End(0))?;
    if let Some(extended) = header.extended {
        if extended.number_of_evlrs > 0 && extended.start_of_first_evlr > start {
            end = end.min(extended.start_of_first_evlr);
        }
    }
    if let Some(waveform_start) = header.start_of_waveform_data {
        if header.global_encoding & WAVEFORM_DATA_INTERNAL != 0 && waveform_start > start {
            end = end.min(waveform_start);
        }
    }
    if end <= start || header.point_size == 0 {
        return Ok(0);
    }
    let point_size = u64::from(header.point_size);
    let trailing = (end - start) % point_size;
    if trailing != 0 {
        header.diagnostics_mut().warn(format!(
            "{} trailing bytes after the last point record",
            trailing
        ));
    }
    Ok((end - start) / point_size)
}

/// Reader that decodes every point of a LAS or LAZ file.
pub struct LasReader<'a> {
    header: HeaderSnapshot,
    point_reader: Box<dyn LasPointReader + 'a>,
    internal_buffer: Vec<u8>,
    point: PointRecord,
    number_of_points: u64,
    current_index: u64,
}

impl<'a> LasReader<'a> {
    pub fn new<R: Read + Seek + Send + 'a>(mut src: R) -> Result<Self> {
        let mut header = HeaderSnapshot::read_from(&mut src)?;
        let laszip_vlr = read_vlrs_and_get_laszip_vlr(&mut src, &header)?;

        let mut number_of_points = if header.is_compressed {
            header.declared_point_count()
        } else {
            count_raw_records(&mut src, &mut header)?
        };
        if header.point_size < header.point_format.record_size() {
            tracing::warn!(
                point_size = header.point_size,
                point_format = header.point_format.id(),
                "point records are too short to be decoded"
            );
            number_of_points = 0;
        }
        if number_of_points != header.declared_point_count() {
            tracing::debug!(
                declared = header.declared_point_count(),
                stored = number_of_points,
                "number of stored point records differs from the header"
            );
        }

        src.seek(SeekFrom::Start(u64::from(header.offset_to_points)))?;
        let point_reader: Box<dyn LasPointReader + 'a> = if header.is_compressed {
            let vlr = laszip_vlr.ok_or(LasRepairError::MissingLasZipVlr)?;
            Box::new(LasZipDecompressor::new(src, vlr)?)
        } else {
            Box::new(RawPointReader { src })
        };
        let internal_buffer = vec![0u8; usize::from(header.point_size)];
        Ok(Self {
            header,
            point_reader,
            internal_buffer,
            point: PointRecord::default(),
            number_of_points,
            current_index: 0,
        })
    }

    pub fn header(&self) -> &HeaderSnapshot {
        &self.header
    }

    pub fn into_header(self) -> HeaderSnapshot {
        self.header
    }

    /// Number of point records this reader will yield.
    pub fn number_of_points(&self) -> u64 {
        self.number_of_points
    }
}

impl<'a> PointSource for LasReader<'a> {
    type Point = PointRecord;

    fn read_next(&mut self) -> Option<Result<&PointRecord>> {
        if self.current_index >= self.number_of_points {
            return None;
        }
        if let Err(e) = self.point_reader.read_next_into(&mut self.internal_buffer) {
            if self.header.is_compressed && e.kind() == std::io::ErrorKind::UnexpectedEof {
                tracing::warn!(
                    declared = self.number_of_points,
                    stored = self.current_index,
                    "compressed point data ends before the declared number of point records"
                );
                self.number_of_points = self.current_index;
                return None;
            }
            return Some(Err(e.into()));
        }
        self.current_index += 1;
        match PointRecord::read_from(&mut self.internal_buffer.as_slice(), self.header.point_format) {
            Ok(point) => {
                self.point = point;
                Some(Ok(&self.point))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
