//! SQLite schema for the trip store.
//!
//! Tables:
//! - zones: location id to borough and zone names
//! - trips: every clean trip with its derived features
//! - summary_stats: dataset-wide figures, rewritten on each load

use rusqlite::{Connection, Result};

/// Create all tables in the database
///
/// The foreign keys on `trips` are declarative only. Trips whose location id
/// has no zone row are stored with null zone names, so enforcement is
/// switched off on the loading connection.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", false)?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            location_id INTEGER PRIMARY KEY,
            borough TEXT,
            zone TEXT,
            service_zone TEXT
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS trips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_id INTEGER,
            pickup_datetime TEXT,
            dropoff_datetime TEXT,
            passenger_count INTEGER,
            trip_distance REAL,
            rate_code_id INTEGER,
            pickup_location_id INTEGER,
            dropoff_location_id INTEGER,
            payment_type INTEGER,
            fare_amount REAL,
            tip_amount REAL,
            tolls_amount REAL,
            total_amount REAL,
            trip_duration_mins REAL,
            avg_speed_mph REAL,
            tip_percentage REAL,
            hour_of_day INTEGER,
            time_of_day TEXT,
            day_of_week TEXT,
            is_weekend INTEGER,
            pickup_borough TEXT,
            pickup_zone TEXT,
            dropoff_borough TEXT,
            dropoff_zone TEXT,
            FOREIGN KEY (pickup_location_id) REFERENCES zones(location_id),
            FOREIGN KEY (dropoff_location_id) REFERENCES zones(location_id)
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS summary_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            stat_name TEXT,
            stat_value TEXT,
            created_at TEXT
        )
        "#,
        [],
    )?;

    Ok(())
}

/// Trip indexes backing the read API filters and groupings.
pub const INDEXES: [(&str, &str); 7] = [
    ("idx_pickup_borough", "pickup_borough"),
    ("idx_dropoff_borough", "dropoff_borough"),
    ("idx_time_of_day", "time_of_day"),
    ("idx_day_of_week", "day_of_week"),
    ("idx_hour_of_day", "hour_of_day"),
    ("idx_pickup_location", "pickup_location_id"),
    ("idx_dropoff_location", "dropoff_location_id"),
];

/// Create the trip indexes; run after bulk insertion
pub fn create_indexes(conn: &Connection) -> Result<()> {
    for (name, column) in INDEXES {
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS {name} ON trips({column})"),
            [],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_indexes(&conn).unwrap();
        // idempotent
        create_tables(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('zones', 'trips', 'summary_stats')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);

        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 7);
    }

    #[test]
    fn test_unmatched_location_ids_are_accepted() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let enforced: bool = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(!enforced);

        conn.execute(
            "INSERT INTO trips (pickup_location_id, dropoff_location_id) VALUES (999, 998)",
            [],
        )
        .unwrap();
    }
}
