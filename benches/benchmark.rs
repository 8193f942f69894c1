use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};

use lasrepair::las::file::LasReader;
use lasrepair::las::header::{HeaderSnapshot, Version};
use lasrepair::las::point::{PointFormat, PointRecord};
use lasrepair::stats::{accumulate, LasInventory, LasSummary, PointAccumulator};

const NUM_POINTS: i32 = 50_000;

struct RawPointsData {
    format: PointFormat,
    points_data: Vec<u8>,
}

impl RawPointsData {
    fn cycling_iterator(&self) -> std::iter::Cycle<std::slice::ChunksExact<u8>> {
        self.points_data
            .chunks_exact(usize::from(self.format.record_size()))
            .cycle()
    }
}

fn sample_point(i: i32, format: PointFormat) -> PointRecord {
    PointRecord {
        x: i * 17,
        y: -i * 3,
        z: i % 1000,
        intensity: (i % 4096) as u16,
        extended_point_type: format.is_extended(),
        return_number: (i % 5 + 1) as u8,
        number_of_returns: 5,
        extended_return_number: (i % 5 + 1) as u8,
        extended_number_of_returns: 5,
        classification: (i % 12) as u8,
        extended_classification: (i % 70) as u8,
        gps_time: f64::from(i) * 0.001,
        ..Default::default()
    }
}

fn raw_points_data(format_id: u8) -> RawPointsData {
    let format = PointFormat::new(format_id).unwrap();
    let mut points_data = Vec::new();
    for i in 0..NUM_POINTS {
        sample_point(i, format)
            .write_to(&mut points_data, format)
            .unwrap();
    }
    RawPointsData {
        format,
        points_data,
    }
}

fn las_file(format_id: u8) -> Vec<u8> {
    let data = raw_points_data(format_id);
    let mut header = HeaderSnapshot::new(Version::new(1, 4), data.format);
    header.extended.as_mut().unwrap().number_of_point_records = NUM_POINTS as u64;
    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    bytes.extend_from_slice(&data.points_data);
    bytes
}

fn point_decoding_benchmark(c: &mut Criterion) {
    for format_id in [1u8, 6].iter() {
        let data = raw_points_data(*format_id);
        c.bench_function(&format!("point_{}_decoding", format_id), move |b| {
            let mut raw_pts_iter = data.cycling_iterator();
            b.iter(|| {
                let mut raw_point = raw_pts_iter.next().unwrap();
                PointRecord::read_from(&mut raw_point, data.format).unwrap()
            });
        });
    }
}

fn summary_accumulation_benchmark(c: &mut Criterion) {
    let points: Vec<_> = (0..NUM_POINTS)
        .map(|i| sample_point(i, PointFormat::new(6).unwrap()))
        .collect();

    c.bench_function("summary_accumulation", |b| {
        let mut pts_iter = points.iter().cycle();
        let mut summary = LasSummary::new();
        b.iter(|| summary.add(pts_iter.next().unwrap()));
    });

    c.bench_function("summary_and_inventory_accumulation", |b| {
        let mut pts_iter = points.iter().cycle();
        let mut stats = (LasSummary::new(), LasInventory::new());
        b.iter(|| stats.add(pts_iter.next().unwrap()));
    });
}

fn whole_file_benchmark(c: &mut Criterion) {
    let bytes = las_file(7);
    c.bench_function("whole_file_summary", move |b| {
        b.iter(|| {
            let mut reader = LasReader::new(Cursor::new(bytes.as_slice())).unwrap();
            let mut summary = LasSummary::new();
            accumulate(&mut reader, &mut summary).unwrap();
            summary.number_of_point_records
        });
    });
}

criterion_group!(
    benches,
    point_decoding_benchmark,
    summary_accumulation_benchmark,
    whole_file_benchmark
);
criterion_main!(benches);
