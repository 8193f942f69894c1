//! Human readable renditions of the accumulated statistics.

use std::fmt;

use crate::las::header::Quantizer;
use crate::stats::summary::FlagCounter;
use crate::stats::{LasInventory, LasSummary, PointAccumulator};

const CLASS_NAMES: [&str; 32] = [
    "never classified",
    "unclassified",
    "ground",
    "low vegetation",
    "medium vegetation",
    "high vegetation",
    "building",
    "noise",
    "keypoint",
    "water",
    "rail",
    "road surface",
    "overlap",
    "wire guard",
    "wire conductor",
    "transmission tower",
    "wire connector",
    "bridge deck",
    "high noise",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
];

/// ASPRS name of a legacy classification code.
pub fn class_name(code: u8) -> &'static str {
    CLASS_NAMES.get(usize::from(code)).copied().unwrap_or("user defined")
}

const AXES: [char; 3] = ['X', 'Y', 'Z'];

fn write_flag_breakdown(f: &mut fmt::Formatter, name: &str, counter: &FlagCounter) -> fmt::Result {
    if counter.total == 0 {
        return Ok(());
    }
    writeln!(f, "  +-> flagged as {}: {}", name, counter.total)?;
    for (code, count) in counter.iter() {
        writeln!(f, "  +---> {:>10}  {} ({})", count, class_name(code), code)?;
    }
    Ok(())
}

/// Lasinfo style report of a [`LasSummary`].
///
/// [`LasSummary`]: ../summary/struct.LasSummary.html
pub struct SummaryReport<'a> {
    summary: &'a LasSummary,
    quantizer: Option<&'a Quantizer>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(summary: &'a LasSummary) -> Self {
        Self {
            summary,
            quantizer: None,
        }
    }

    /// Also prints the bounding box in real world coordinates.
    pub fn with_quantizer(mut self, quantizer: &'a Quantizer) -> Self {
        self.quantizer = Some(quantizer);
        self
    }
}

impl<'a> fmt::Display for SummaryReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = self.summary;
        writeln!(f, "number of point records: {}", s.number_of_point_records)?;
        if !s.is_active() {
            return Ok(());
        }
        if s.number_of_points_by_return[0] != 0 {
            writeln!(
                f,
                "WARNING: there are {} points with return number 0",
                s.number_of_points_by_return[0]
            )?;
        }
        for return_number in [6usize, 7].iter() {
            if s.number_of_points_by_return[*return_number] != 0 {
                writeln!(
                    f,
                    "WARNING: there are {} points with return number {}",
                    s.number_of_points_by_return[*return_number], return_number
                )?;
            }
        }

        write!(f, "number of returns of given pulse:")?;
        for count in s.number_of_returns[1..].iter() {
            write!(f, " {}", count)?;
        }
        writeln!(f)?;
        if s.number_of_returns[0] != 0 {
            writeln!(
                f,
                "WARNING: there are {} points with a number of returns of given pulse of 0",
                s.number_of_returns[0]
            )?;
        }

        if let Some(bounds) = self.quantizer.and_then(|q| s.bounds(q)) {
            writeln!(f, "min x y z: {} {} {}", bounds.min_x, bounds.min_y, bounds.min_z)?;
            writeln!(f, "max x y z: {} {} {}", bounds.max_x, bounds.max_y, bounds.max_z)?;
        }

        writeln!(f, "histogram of classification of points:")?;
        for (code, count) in s.classification.iter() {
            writeln!(f, "  {:>15}  {} ({})", count, class_name(code), code)?;
        }
        write_flag_breakdown(f, "synthetic", &s.flagged_synthetic)?;
        write_flag_breakdown(f, "keypoints", &s.flagged_keypoint)?;
        write_flag_breakdown(f, "withheld", &s.flagged_withheld)?;
        write_flag_breakdown(f, "extended overlap", &s.flagged_extended_overlap)?;
        if s.extended_classification.total() != 0 {
            writeln!(f, "histogram of extended classification of points:")?;
            for (code, count) in s.extended_classification.iter() {
                writeln!(f, "  {:>15}  extended classification ({})", count, code)?;
            }
        }

        for (axis, name) in AXES.iter().enumerate() {
            if s.has_extremely_serious_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates share the last four digits", name)?;
            } else if s.has_very_serious_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates share the last three digits", name)?;
            } else if s.has_serious_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates share the last two digits", name)?;
            } else if s.has_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates share the last digit", name)?;
            }
        }
        Ok(())
    }
}

/// Extrema, fluff and wave packet usage of a [`LasInventory`].
///
/// [`LasInventory`]: ../inventory/struct.LasInventory.html
pub struct InventoryReport<'a> {
    inventory: &'a LasInventory,
}

impl<'a> InventoryReport<'a> {
    pub fn new(inventory: &'a LasInventory) -> Self {
        Self { inventory }
    }
}

impl<'a> fmt::Display for InventoryReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inventory = self.inventory;
        writeln!(f, "number of point records: {}", inventory.number_of_point_records)?;
        let e = match inventory.extrema() {
            Some(e) => e,
            None => return Ok(()),
        };
        writeln!(f, "  X          {:>12} {:>12}", e.x.min, e.x.max)?;
        writeln!(f, "  Y          {:>12} {:>12}", e.y.min, e.y.max)?;
        writeln!(f, "  Z          {:>12} {:>12}", e.z.min, e.z.max)?;
        writeln!(f, "  intensity  {:>12} {:>12}", e.intensity.min, e.intensity.max)?;
        writeln!(f, "  scan_angle {:>12} {:>12}", e.scan_angle_rank.min, e.scan_angle_rank.max)?;
        writeln!(
            f,
            "  ext_angle  {:>12} {:>12}",
            e.extended_scan_angle.min, e.extended_scan_angle.max
        )?;
        writeln!(f, "  user_data  {:>12} {:>12}", e.user_data.min, e.user_data.max)?;
        writeln!(
            f,
            "  source_id  {:>12} {:>12}",
            e.point_source_id.min, e.point_source_id.max
        )?;
        writeln!(f, "  gps_time   {:>12} {:>12}", e.gps_time.min, e.gps_time.max)?;
        writeln!(
            f,
            "  R G B      {} {} {} / {} {} {}",
            e.red.min, e.green.min, e.blue.min, e.red.max, e.green.max, e.blue.max
        )?;
        writeln!(f, "  NIR        {:>12} {:>12}", e.nir.min, e.nir.max)?;

        for (axis, name) in AXES.iter().enumerate() {
            if inventory.has_very_serious_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates are multiples of 1000", name)?;
            } else if inventory.has_serious_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates are multiples of 100", name)?;
            } else if inventory.has_fluff(axis) {
                writeln!(f, "WARNING: all {} coordinates are multiples of 10", name)?;
            }
        }

        let indices: Vec<String> = inventory
            .wave_packet_indices()
            .map(|index| index.to_string())
            .collect();
        if !indices.is_empty() {
            writeln!(f, "wave packet descriptor indices in use: {}", indices.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::las::point::PointRecord;

    #[test]
    fn test_class_names() {
        assert_eq!(class_name(2), "ground");
        assert_eq!(class_name(18), "high noise");
        assert_eq!(class_name(25), "reserved");
        assert_eq!(class_name(64), "user defined");
    }

    #[test]
    fn test_summary_report_mentions_anomalies() {
        let mut summary = LasSummary::new();
        for x in [10, 20, 30].iter() {
            summary.add(&PointRecord {
                x: *x,
                y: *x + 1,
                z: 0,
                classification: 2,
                keypoint: true,
                ..Default::default()
            });
        }
        let text = SummaryReport::new(&summary)
            .with_quantizer(&Quantizer::default())
            .to_string();
        assert!(text.contains("number of point records: 3"));
        assert!(text.contains("3 points with return number 0"));
        assert!(text.contains("ground (2)"));
        assert!(text.contains("flagged as keypoints: 3"));
        assert!(text.contains("all X coordinates share the last digit"));
        assert!(text.contains("all Z coordinates share the last four digits"));
        assert!(text.contains("max x y z: 0.3"));
    }

    #[test]
    fn test_empty_reports() {
        let summary = LasSummary::new();
        assert_eq!(SummaryReport::new(&summary).to_string(), "number of point records: 0\n");
        let inventory = LasInventory::new();
        assert_eq!(InventoryReport::new(&inventory).to_string(), "number of point records: 0\n");
    }
}
