#![allow(dead_code)]

use std::io::Write;

use lasrepair::las::header::{HeaderSnapshot, Quantizer, Version};
use lasrepair::las::point::{PointFormat, PointRecord};
use lasrepair::stats::{LasSummary, PointAccumulator};

/// `n` points spread over 3 returns, extended formats get extended fields.
pub fn sample_points(n: usize, format: PointFormat) -> Vec<PointRecord> {
    (0..n)
        .map(|i| {
            let i = i as i32;
            let return_number = (i % 3 + 1) as u8;
            PointRecord {
                x: 1_000 + i * 7,
                y: -500 + i * 13,
                z: 250 - i * 3,
                intensity: (i % 200) as u16,
                extended_point_type: format.is_extended(),
                return_number,
                number_of_returns: 3,
                extended_return_number: return_number,
                extended_number_of_returns: 3,
                classification: (i % 10) as u8,
                extended_classification: (i % 10) as u8,
                gps_time: f64::from(i) * 0.5,
                ..Default::default()
            }
        })
        .collect()
}

pub fn summarize(points: &[PointRecord]) -> LasSummary {
    let mut summary = LasSummary::new();
    for point in points {
        summary.add(point);
    }
    summary
}

/// A header that agrees with the points in every field the repair looks at.
pub fn consistent_header(minor: u8, format: PointFormat, points: &[PointRecord]) -> HeaderSnapshot {
    let summary = summarize(points);
    let mut header = HeaderSnapshot::new(Version::new(1, minor), format)
        .with_quantizer(Quantizer::new([0.01, 0.01, 0.001], [300_000.0, 4_500_000.0, 0.0]));
    if !format.is_extended() {
        header.legacy_number_of_point_records = summary.number_of_point_records as u32;
        for (slot, value) in header
            .legacy_number_of_points_by_return
            .iter_mut()
            .enumerate()
        {
            *value = summary.number_of_points_by_return[slot + 1] as u32;
        }
    }
    if let Some(extended) = header.extended.as_mut() {
        extended.number_of_point_records = summary.number_of_point_records;
        extended
            .number_of_points_by_return
            .copy_from_slice(&summary.number_of_points_by_return[1..]);
    }
    if let Some(bounds) = summary.bounds(header.quantizer()) {
        header.bounds = bounds;
    }
    header
}

pub fn las_bytes(header: &HeaderSnapshot, points: &[PointRecord]) -> Vec<u8> {
    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    bytes.resize(header.offset_to_points as usize, 0);
    for point in points {
        point.write_to(&mut bytes, header.point_format).unwrap();
    }
    bytes
}

/// Same as `las_bytes` but with the points compressed, behind a laszip vlr.
pub fn laz_bytes(header: &HeaderSnapshot, points: &[PointRecord]) -> Vec<u8> {
    let items =
        laz::LazItemRecordBuilder::default_for_point_format_id(header.point_format.id(), 0)
            .unwrap();
    let vlr = laz::LazVlr::from_laz_items(items);
    let mut vlr_data = Vec::new();
    vlr.write_to(&mut vlr_data).unwrap();

    let mut header = header.clone();
    header.is_compressed = true;
    header.number_of_vlrs = 1;
    header.offset_to_points = u32::from(header.header_size) + 54 + vlr_data.len() as u32;

    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    bytes.extend_from_slice(&0u16.to_le_bytes());
    let mut user_id = [0u8; 16];
    user_id[..14].copy_from_slice(b"laszip encoded");
    bytes.extend_from_slice(&user_id);
    bytes.extend_from_slice(&22204u16.to_le_bytes());
    bytes.extend_from_slice(&(vlr_data.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 32]);
    bytes.extend_from_slice(&vlr_data);
    assert_eq!(bytes.len(), header.offset_to_points as usize);

    let mut raw_points = Vec::new();
    for point in points {
        point.write_to(&mut raw_points, header.point_format).unwrap();
    }
    let mut output = std::io::Cursor::new(bytes);
    output.set_position(header.offset_to_points as u64);
    {
        let mut compressor = laz::LasZipCompressor::new(&mut output, vlr).unwrap();
        for raw_point in raw_points.chunks_exact(header.point_size as usize) {
            compressor.compress_one(raw_point).unwrap();
        }
        compressor.done().unwrap();
    }
    output.into_inner()
}

/// Writes the bytes to a temporary file with the given extension.
pub fn temp_file(bytes: &[u8], extension: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("lasrepair")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

pub fn read_header(path: &std::path::Path) -> HeaderSnapshot {
    let mut file = std::fs::File::open(path).unwrap();
    HeaderSnapshot::read_from(&mut file).unwrap()
}
