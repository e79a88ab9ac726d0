//! Writers for the artefacts produced by the batch commands.
//!
//! Cleaned trips and zones go to CSV, logs and summaries to pretty JSON, and
//! the ranking to a fixed-width text report.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::RankedZone;
use crate::cleaning::{CleanTrip, TripRecord};
use crate::error::PipelineError;
use crate::zones::ZoneTable;

/// Creates the parent directory of `path` if it is missing.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Writes every clean trip to `path` and the first `sample_size` of them to
/// `sample_path`, in one pass.
pub fn write_clean_trips(
    path: &Path,
    sample_path: &Path,
    sample_size: usize,
    trips: &[CleanTrip],
    zones: &ZoneTable,
) -> Result<usize, PipelineError> {
    ensure_parent(path)?;
    ensure_parent(sample_path)?;
    debug!(path = %path.display(), rows = trips.len(), "Writing clean trips");

    let mut full = WriterBuilder::new().from_path(path)?;
    let mut sample = WriterBuilder::new().from_path(sample_path)?;

    let mut sampled = 0;
    for (i, trip) in trips.iter().enumerate() {
        let record = TripRecord::from_clean(trip, zones);
        full.serialize(&record)?;
        if i < sample_size {
            sample.serialize(&record)?;
            sampled += 1;
        }
    }

    // headers are only emitted with the first record
    if trips.is_empty() {
        full.write_record(TRIP_COLUMNS)?;
        sample.write_record(TRIP_COLUMNS)?;
    }

    full.flush()?;
    sample.flush()?;
    Ok(sampled)
}

/// Column names of a clean trip row, matching [`TripRecord`].
pub const TRIP_COLUMNS: [&str; 24] = [
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "rate_code_id",
    "pickup_location_id",
    "dropoff_location_id",
    "payment_type",
    "fare_amount",
    "tip_amount",
    "tolls_amount",
    "total_amount",
    "trip_duration_mins",
    "avg_speed_mph",
    "tip_percentage",
    "hour_of_day",
    "time_of_day",
    "day_of_week",
    "is_weekend",
    "pickup_borough",
    "pickup_zone",
    "dropoff_borough",
    "dropoff_zone",
];

/// Writes the zone table with friendly column names.
pub fn write_zones(path: &Path, zones: &ZoneTable) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut writer = WriterBuilder::new().from_path(path)?;
    if zones.is_empty() {
        writer.write_record(["location_id", "borough", "zone", "service_zone"])?;
    }
    for zone in zones.zones() {
        writer.serialize(zone)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialises `value` as indented JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

const RULE: &str = "============================================================";

/// Writes the full ranking as a fixed-width text report.
pub fn write_ranking_report(path: &Path, ranked: &[RankedZone]) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    render_ranking_report(&mut out, ranked)?;
    out.flush()?;
    Ok(())
}

pub fn render_ranking_report<W: Write>(out: &mut W, ranked: &[RankedZone]) -> std::io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "NYC TAXI ZONE MOBILITY RANKING RESULTS")?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;
    writeln!(out, "ORDERING: stable sort by descending score")?;
    writeln!(out)?;
    writeln!(out, "MOBILITY SCORE FORMULA:")?;
    writeln!(
        out,
        "  (trip_count / 1000) + (avg_fare * 0.5) + (avg_distance * 2)"
    )?;
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "ALL {} ZONES RANKED", ranked.len())?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<6} {:<40} {:<15} {:<10} {:<12}",
        "Rank", "Zone", "Borough", "Score", "Trips"
    )?;
    writeln!(out, "{}", "-".repeat(90))?;

    for z in ranked {
        let zone: String = z.stat.zone.chars().take(39).collect();
        writeln!(
            out,
            "{:<6} {:<40} {:<15} {:<10} {:<12}",
            z.rank,
            zone,
            z.stat.borough.as_deref().unwrap_or("-"),
            z.score,
            z.stat.trip_count
        )?;
    }
    Ok(())
}
