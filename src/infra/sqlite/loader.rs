//! Bulk loading of cleaned artefacts into a fresh store.

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::schema::{create_indexes, create_tables};
use crate::analyzers::types::SummaryStats;
use crate::analyzers::utility::round2_exact;
use crate::cleaning::TripRecord;
use crate::error::PipelineError;
use crate::output::ensure_parent;
use crate::zones::Zone;

pub const DEFAULT_BATCH_SIZE: usize = 50_000;

const INSERT_TRIP: &str = r#"
    INSERT INTO trips (
        vendor_id, pickup_datetime, dropoff_datetime, passenger_count,
        trip_distance, rate_code_id, pickup_location_id, dropoff_location_id,
        payment_type, fare_amount, tip_amount, tolls_amount, total_amount,
        trip_duration_mins, avg_speed_mph, tip_percentage, hour_of_day,
        time_of_day, day_of_week, is_weekend, pickup_borough, pickup_zone,
        dropoff_borough, dropoff_zone
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
        ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
    )
"#;

/// Counts reported after a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub zones: usize,
    pub trips: usize,
    pub summary: SummaryStats,
}

pub fn insert_zones(conn: &mut Connection, zones: &[Zone]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO zones (location_id, borough, zone, service_zone) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for zone in zones {
            stmt.execute(params![
                zone.location_id,
                zone.borough,
                zone.zone,
                zone.service_zone
            ])?;
        }
    }
    tx.commit()?;
    Ok(zones.len())
}

/// Inserts trips in transactions of `batch_size` rows.
///
/// Stops at the first failing record; rows of earlier batches stay committed
/// and the store must be rebuilt.
pub fn insert_trips<I>(
    conn: &mut Connection,
    records: I,
    batch_size: usize,
) -> Result<usize, PipelineError>
where
    I: IntoIterator<Item = Result<TripRecord, PipelineError>>,
{
    let batch_size = batch_size.max(1);
    let mut records = records.into_iter().peekable();
    let mut inserted = 0;

    while records.peek().is_some() {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_TRIP)?;
            for record in records.by_ref().take(batch_size) {
                let r = record?;
                stmt.execute(params![
                    r.vendor_id,
                    r.pickup_datetime,
                    r.dropoff_datetime,
                    r.passenger_count,
                    r.trip_distance,
                    r.rate_code_id,
                    r.pickup_location_id,
                    r.dropoff_location_id,
                    r.payment_type,
                    r.fare_amount,
                    r.tip_amount,
                    r.tolls_amount,
                    r.total_amount,
                    r.trip_duration_mins,
                    r.avg_speed_mph,
                    r.tip_percentage,
                    r.hour_of_day,
                    r.time_of_day,
                    r.day_of_week,
                    r.is_weekend,
                    r.pickup_borough,
                    r.pickup_zone,
                    r.dropoff_borough,
                    r.dropoff_zone,
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;
        info!(inserted, "Inserted trip batch");
    }

    Ok(inserted)
}

/// Computes the dataset-wide summary from the `trips` table.
pub fn compute_summary(conn: &Connection) -> rusqlite::Result<SummaryStats> {
    let total_trips: i64 = conn.query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;

    let averages = conn.query_row(
        r#"
        SELECT AVG(fare_amount), AVG(trip_distance), AVG(trip_duration_mins),
               AVG(avg_speed_mph), AVG(tip_percentage)
        FROM trips
        "#,
        [],
        |row| {
            let avg = |i: usize| -> rusqlite::Result<f64> {
                Ok(row.get::<_, Option<f64>>(i)?.map_or(0.0, round2_exact))
            };
            Ok([avg(0)?, avg(1)?, avg(2)?, avg(3)?, avg(4)?])
        },
    )?;

    let top_pickup_borough = conn
        .query_row(
            r#"
            SELECT pickup_borough, COUNT(*) AS cnt
            FROM trips
            WHERE pickup_borough IS NOT NULL
            GROUP BY pickup_borough
            ORDER BY cnt DESC, pickup_borough
            LIMIT 1
            "#,
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .unwrap_or_else(|| "Unknown".to_string());

    let peak_hour = conn
        .query_row(
            r#"
            SELECT hour_of_day, COUNT(*) AS cnt
            FROM trips
            GROUP BY hour_of_day
            ORDER BY cnt DESC, hour_of_day
            LIMIT 1
            "#,
            [],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?
        .flatten()
        .unwrap_or(0);

    let [avg_fare, avg_distance, avg_duration_mins, avg_speed_mph, avg_tip_percentage] = averages;

    Ok(SummaryStats {
        total_trips,
        avg_fare,
        avg_distance,
        avg_duration_mins,
        avg_speed_mph,
        avg_tip_percentage,
        top_pickup_borough,
        peak_hour,
    })
}

/// Replaces the contents of `summary_stats` with `stats`.
pub fn write_summary(
    conn: &mut Connection,
    stats: &SummaryStats,
    created_at: &str,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM summary_stats", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO summary_stats (stat_name, stat_value, created_at) VALUES (?1, ?2, ?3)",
        )?;
        for (name, value) in stats.to_rows() {
            stmt.execute(params![name, value, created_at])?;
        }
    }
    tx.commit()
}

/// Builds the store at `db_path` from scratch.
///
/// Any existing database file is removed first, so a failed or interrupted
/// load is recovered by running it again.
pub fn build_store<I>(
    db_path: &Path,
    zones: &[Zone],
    trips: I,
    batch_size: usize,
    created_at: &str,
) -> Result<LoadReport, PipelineError>
where
    I: IntoIterator<Item = Result<TripRecord, PipelineError>>,
{
    if db_path.exists() {
        fs::remove_file(db_path)?;
        info!(path = %db_path.display(), "Removed old database to start fresh");
    }
    ensure_parent(db_path)?;

    let mut conn = Connection::open(db_path)?;
    create_tables(&conn)?;
    debug!("Created tables");

    let zone_count = insert_zones(&mut conn, zones)?;
    info!(zones = zone_count, "Inserted zones");

    let trip_count = insert_trips(&mut conn, trips, batch_size)?;
    info!(trips = trip_count, "Inserted trips");

    create_indexes(&conn)?;
    debug!("Created indexes");

    let summary = compute_summary(&conn)?;
    write_summary(&mut conn, &summary, created_at)?;

    Ok(LoadReport {
        zones: zone_count,
        trips: trip_count,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(borough: Option<&str>, zone: Option<&str>, hour: u32, fare: f64) -> TripRecord {
        TripRecord {
            vendor_id: Some(2),
            pickup_datetime: format!("2024-01-15 {hour:02}:00:00"),
            dropoff_datetime: format!("2024-01-15 {hour:02}:20:00"),
            passenger_count: 1.0,
            trip_distance: 3.0,
            rate_code_id: Some(1),
            pickup_location_id: 161,
            dropoff_location_id: 236,
            payment_type: Some(1),
            fare_amount: fare,
            tip_amount: Some(2.0),
            tolls_amount: None,
            total_amount: Some(fare + 2.0),
            trip_duration_mins: 20.0,
            avg_speed_mph: 9.0,
            tip_percentage: 10.0,
            hour_of_day: hour,
            time_of_day: "Morning Rush".into(),
            day_of_week: "Monday".into(),
            is_weekend: false,
            pickup_borough: borough.map(Into::into),
            pickup_zone: zone.map(Into::into),
            dropoff_borough: None,
            dropoff_zone: None,
        }
    }

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_trips_in_batches() {
        let mut conn = fresh();
        let rows = (0..5).map(|i| Ok(record(Some("Manhattan"), None, 8, 10.0 + i as f64)));

        let inserted = insert_trips(&mut conn, rows, 2).unwrap();
        assert_eq!(inserted, 5);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM trips", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 5);

        let weekend: i64 = conn
            .query_row("SELECT is_weekend FROM trips LIMIT 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(weekend, 0);
    }

    #[test]
    fn test_insert_trips_stops_on_error() {
        let mut conn = fresh();
        let rows = vec![
            Ok(record(None, None, 8, 10.0)),
            Err(PipelineError::Interrupted),
            Ok(record(None, None, 8, 10.0)),
        ];

        assert!(insert_trips(&mut conn, rows, 10).is_err());
    }

    #[test]
    fn test_summary_of_empty_store() {
        let conn = fresh();
        let summary = compute_summary(&conn).unwrap();

        assert_eq!(summary.total_trips, 0);
        assert_eq!(summary.avg_fare, 0.0);
        assert_eq!(summary.top_pickup_borough, "Unknown");
        assert_eq!(summary.peak_hour, 0);
    }

    #[test]
    fn test_summary_values() {
        let mut conn = fresh();
        let rows = vec![
            Ok(record(Some("Manhattan"), None, 8, 10.0)),
            Ok(record(Some("Manhattan"), None, 9, 20.0)),
            Ok(record(Some("Queens"), None, 9, 30.0)),
            Ok(record(None, None, 9, 40.0)),
        ];
        insert_trips(&mut conn, rows, 50).unwrap();

        let summary = compute_summary(&conn).unwrap();
        assert_eq!(summary.total_trips, 4);
        assert_eq!(summary.avg_fare, 25.0);
        assert_eq!(summary.top_pickup_borough, "Manhattan");
        assert_eq!(summary.peak_hour, 9);

        write_summary(&mut conn, &summary, "2024-02-01 00:00:00").unwrap();
        write_summary(&mut conn, &summary, "2024-02-02 00:00:00").unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM summary_stats", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 8);
    }

    #[test]
    fn test_build_store_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nyc_taxi.db");
        fs::write(&db, b"not a database").unwrap();

        let zones = vec![Zone {
            location_id: 161,
            borough: Some("Manhattan".into()),
            zone: Some("Midtown Center".into()),
            service_zone: Some("Yellow Zone".into()),
        }];
        let trips = vec![Ok(record(Some("Manhattan"), Some("Midtown Center"), 8, 12.0))];

        let report = build_store(&db, &zones, trips, 10, "2024-02-01 00:00:00").unwrap();
        assert_eq!(report.zones, 1);
        assert_eq!(report.trips, 1);
        assert_eq!(report.summary.total_trips, 1);
    }

    #[test]
    fn test_build_store_keeps_trips_without_zone() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nyc_taxi.db");

        let zones = vec![Zone {
            location_id: 161,
            borough: Some("Manhattan".into()),
            zone: Some("Midtown Center".into()),
            service_zone: Some("Yellow Zone".into()),
        }];
        let mut unmatched = record(None, None, 23, 25.0);
        unmatched.pickup_location_id = 999;
        let trips = vec![
            Ok(record(Some("Manhattan"), Some("Midtown Center"), 8, 12.0)),
            Ok(unmatched),
        ];

        let report = build_store(&db, &zones, trips, 10, "2024-02-01 00:00:00").unwrap();
        assert_eq!(report.trips, 2);

        let conn = Connection::open(&db).unwrap();
        let borough: Option<String> = conn
            .query_row(
                "SELECT pickup_borough FROM trips WHERE pickup_location_id = 999",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(borough, None);
    }
}
