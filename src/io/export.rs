//! CSV export for load profiles, study reports and parameter sweeps.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::{StudyReport, SweepPoint};
use crate::sim::load_profile::LoadProfile;

const PROFILE_HEADER: [&str; 4] = ["slot", "load_kw", "capacity_kw", "over_capacity"];
const REPORT_HEADER: [&str; 6] = [
    "policy", "trials", "gc_mean", "gc_std", "par_mean", "par_std",
];
const SWEEP_HEADER: [&str; 3] = ["param", "gc_mean", "gc_std"];

fn create(path: &Path) -> io::Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Exports a load profile to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_profile_csv(
    profile: &LoadProfile,
    capacity_kw: f64,
    path: &Path,
) -> io::Result<()> {
    write_profile_csv(profile, capacity_kw, create(path)?)
}

/// Writes one row per slot: the load, the capacity threshold, and whether
/// the load exceeds it.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_profile_csv(
    profile: &LoadProfile,
    capacity_kw: f64,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PROFILE_HEADER)?;

    for (slot, load) in profile.as_slice().iter().enumerate() {
        wtr.write_record(&[
            slot.to_string(),
            format!("{load:.4}"),
            format!("{capacity_kw:.4}"),
            (*load > capacity_kw).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a study report to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_report_csv(report: &StudyReport, path: &Path) -> io::Result<()> {
    write_report_csv(report, create(path)?)
}

/// Writes one row per policy of the report. PAR columns hold `n/a` when the
/// run carried no load.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_report_csv(report: &StudyReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(REPORT_HEADER)?;

    for row in &report.rows {
        let (par_mean, par_std) = match &row.par {
            Some(par) => (format!("{:.6}", par.mean), format!("{:.6}", par.std_dev)),
            None => ("n/a".to_string(), "n/a".to_string()),
        };
        wtr.write_record(&[
            row.label.to_string(),
            row.gc.samples.to_string(),
            format!("{:.6}", row.gc.mean),
            format!("{:.6}", row.gc.std_dev),
            par_mean,
            par_std,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports sweep points to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sweep_csv(points: &[SweepPoint], path: &Path) -> io::Result<()> {
    write_sweep_csv(points, create(path)?)
}

/// Writes one row per swept parameter value.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sweep_csv(points: &[SweepPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SWEEP_HEADER)?;

    for p in points {
        wtr.write_record(&[
            format!("{:.4}", p.param),
            format!("{:.6}", p.gc.mean),
            format!("{:.6}", p.gc.std_dev),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
