mod common;

use std::fs::{File, OpenOptions};
use std::io::BufReader;

use lasrepair::las::header::Bounds;
use lasrepair::las::point::PointFormat;
use lasrepair::{
    repair_header, validate_file, CheckOutcome, LasReader, LasRepairError, RepairCheck,
    RepairOptions, ValidateConfig,
};

fn repair_in_place(path: &std::path::Path, options: RepairOptions) -> lasrepair::RepairReport {
    let mut reader = LasReader::new(BufReader::new(File::open(path).unwrap())).unwrap();
    let header = reader.header().clone();
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    repair_header(path, &mut reader, &header, &mut file, options).unwrap()
}

#[test]
fn test_repair_legacy_count_of_las_1_2() {
    let format = PointFormat::new(3).unwrap();
    let points = common::sample_points(150, format);
    let mut header = common::consistent_header(2, format, &points);
    header.legacy_number_of_point_records = 100;
    let bytes = common::las_bytes(&header, &points);
    let file = common::temp_file(&bytes, "las");

    let report = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(report.patches_written, 1);
    assert_eq!(
        report.outcome(RepairCheck::PointCount),
        Some(CheckOutcome::Repaired)
    );

    let repaired = std::fs::read(file.path()).unwrap();
    assert_eq!(repaired.len(), bytes.len());
    assert_eq!(&repaired[107..111], &150u32.to_le_bytes());
    assert_eq!(&repaired[..107], &bytes[..107]);
    assert_eq!(&repaired[111..], &bytes[111..]);
}

#[test]
fn test_repair_extended_format_on_las_1_4() {
    let format = PointFormat::new(6).unwrap();
    let points = common::sample_points(42, format);
    let mut header = common::consistent_header(4, format, &points);
    header.legacy_number_of_point_records = 42;
    header.extended.as_mut().unwrap().number_of_point_records = 0;
    let file = common::temp_file(&common::las_bytes(&header, &points), "LAS");

    repair_in_place(file.path(), RepairOptions::apply());

    let repaired = common::read_header(file.path());
    assert_eq!(repaired.legacy_number_of_point_records, 0);
    assert_eq!(repaired.extended.unwrap().number_of_point_records, 42);
}

#[test]
fn test_repair_every_field_then_nothing() {
    let format = PointFormat::new(1).unwrap();
    let points = common::sample_points(30, format);
    let expected = common::consistent_header(4, format, &points);

    let mut header = expected.clone();
    header.legacy_number_of_point_records = 1;
    header.legacy_number_of_points_by_return = [0; 5];
    let extended = header.extended.as_mut().unwrap();
    extended.number_of_point_records = 99;
    extended.number_of_points_by_return = [7; 15];
    header.bounds = Bounds::default();
    let file = common::temp_file(&common::las_bytes(&header, &points), "las");

    let first = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(first.patches_written, 5);
    assert!(first.is_consistent());
    assert_eq!(common::read_header(file.path()), expected);

    let second = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(second.patches_written, 0);
    assert!(second
        .checks
        .iter()
        .all(|check| check.outcome == CheckOutcome::Correct));
}

#[test]
fn test_bounding_box_is_one_write() {
    let format = PointFormat::new(0).unwrap();
    let points = common::sample_points(10, format);
    let mut header = common::consistent_header(2, format, &points);
    let real_max_x = header.bounds.max_x;
    header.bounds.max_x -= 5.0;
    let bytes = common::las_bytes(&header, &points);
    let file = common::temp_file(&bytes, "las");

    let report = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(report.patches_written, 1);

    let repaired = std::fs::read(file.path()).unwrap();
    assert_eq!(&repaired[179..187], &real_max_x.to_le_bytes());
    assert_eq!(&repaired[187..227], &bytes[187..227]);
}

#[test]
fn test_report_only_leaves_file_untouched() {
    let format = PointFormat::new(1).unwrap();
    let points = common::sample_points(12, format);
    let mut header = common::consistent_header(3, format, &points);
    header.legacy_number_of_points_by_return = [1, 1, 1, 1, 1];
    let bytes = common::las_bytes(&header, &points);
    let file = common::temp_file(&bytes, "las");

    let report = repair_in_place(file.path(), RepairOptions::report_only());
    assert_eq!(
        report.outcome(RepairCheck::PointsByReturn),
        Some(CheckOutcome::Inconsistent)
    );
    assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
}

#[test]
fn test_point_count_comes_from_the_file_size() {
    let format = PointFormat::new(2).unwrap();
    let points = common::sample_points(25, format);
    let mut header = common::consistent_header(2, format, &points);
    header.legacy_number_of_point_records = 1_000;
    let file = common::temp_file(&common::las_bytes(&header, &points), "las");

    let reader = LasReader::new(BufReader::new(File::open(file.path()).unwrap())).unwrap();
    assert_eq!(reader.number_of_points(), 25);
    drop(reader);

    repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(
        common::read_header(file.path()).legacy_number_of_point_records,
        25
    );
}

#[test]
fn test_laz_file_is_read_through_the_decompressor() {
    let format = PointFormat::new(1).unwrap();
    let points = common::sample_points(64, format);
    let mut header = common::consistent_header(2, format, &points);
    header.bounds.min_z = -1000.0;
    let file = common::temp_file(&common::laz_bytes(&header, &points), "laz");

    let report = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(
        report.outcome(RepairCheck::BoundingBox),
        Some(CheckOutcome::Repaired)
    );
    assert_eq!(
        report.outcome(RepairCheck::PointCount),
        Some(CheckOutcome::Correct)
    );
    let repaired = common::read_header(file.path());
    assert!(repaired.is_compressed);
    assert_ne!(repaired.bounds.min_z, -1000.0);
}

#[test]
fn test_laz_file_with_overstated_extended_count() {
    let format = PointFormat::new(1).unwrap();
    let points = common::sample_points(20, format);
    let mut header = common::consistent_header(4, format, &points);
    assert_eq!(header.legacy_number_of_point_records, 20);
    header.extended.as_mut().unwrap().number_of_point_records = 25;
    let file = common::temp_file(&common::laz_bytes(&header, &points), "laz");

    let report = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(
        report.outcome(RepairCheck::PointCount),
        Some(CheckOutcome::Repaired)
    );
    assert_eq!(report.patches_written, 1);

    let repaired = common::read_header(file.path());
    assert_eq!(repaired.legacy_number_of_point_records, 20);
    assert_eq!(repaired.extended.unwrap().number_of_point_records, 20);

    let again = repair_in_place(file.path(), RepairOptions::apply());
    assert_eq!(again.patches_written, 0);
}

#[test]
fn test_other_extensions_are_rejected() {
    let format = PointFormat::new(0).unwrap();
    let points = common::sample_points(3, format);
    let mut header = common::consistent_header(2, format, &points);
    header.legacy_number_of_point_records = 0;
    let bytes = common::las_bytes(&header, &points);
    let file = common::temp_file(&bytes, "bin");

    let result = validate_file(
        file.path(),
        &ValidateConfig {
            repair: RepairOptions::apply(),
            ..Default::default()
        },
    );
    assert!(matches!(
        result,
        Err(LasRepairError::UnsupportedFileFormat(_))
    ));
    assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
}

#[test]
fn test_bad_signature_is_an_error() {
    let file = common::temp_file(&[0u8; 400], "las");
    let result = LasReader::new(File::open(file.path()).unwrap());
    assert!(matches!(result, Err(LasRepairError::InvalidSignature(_))));
}
