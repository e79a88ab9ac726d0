use rusqlite::{Row, params, params_from_iter, types::Value};

use super::SqliteStore;
use crate::analyzers::types::ZoneStat;
use crate::analyzers::utility::round2_exact;
use crate::error::QueryError;
use crate::services::{
    BoroughSummary, DaySummary, HourSummary, RouteSummary, StatValue, TripFilter, TripPage,
    TripQueries, TripRow,
};
use crate::zones::Zone;

/// Appends one `AND column = ?` per active filter.
fn trip_conditions(filter: &TripFilter, sql: &mut String, args: &mut Vec<Value>) {
    let active = [
        ("pickup_borough", &filter.borough),
        ("time_of_day", &filter.time_of_day),
        ("day_of_week", &filter.day),
    ];
    for (column, value) in active {
        if let Some(value) = value {
            sql.push_str(&format!(" AND {column} = ?"));
            args.push(Value::Text(value.clone()));
        }
    }
}

fn trip_row(row: &Row) -> rusqlite::Result<TripRow> {
    Ok(TripRow {
        pickup_borough: row.get("pickup_borough")?,
        dropoff_borough: row.get("dropoff_borough")?,
        pickup_zone: row.get("pickup_zone")?,
        dropoff_zone: row.get("dropoff_zone")?,
        fare_amount: row.get("fare_amount")?,
        trip_distance: row.get("trip_distance")?,
        trip_duration_mins: row.get("trip_duration_mins")?,
        avg_speed_mph: row.get("avg_speed_mph")?,
        tip_percentage: row.get("tip_percentage")?,
        time_of_day: row.get("time_of_day")?,
        day_of_week: row.get("day_of_week")?,
        hour_of_day: row.get("hour_of_day")?,
        passenger_count: row.get("passenger_count")?,
        total_amount: row.get("total_amount")?,
    })
}

impl TripQueries for SqliteStore {
    fn summary_stats(&self) -> Result<Vec<(String, StatValue)>, QueryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT stat_name, stat_value FROM summary_stats ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                let name: String = row.get(0)?;
                let value: Option<String> = row.get(1)?;
                Ok((name, StatValue::parse(value.as_deref().unwrap_or_default())))
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn boroughs(&self) -> Result<Vec<String>, QueryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT DISTINCT pickup_borough
                FROM trips
                WHERE pickup_borough IS NOT NULL
                AND pickup_borough != 'Unknown'
                ORDER BY pickup_borough
                "#,
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn trips(&self, filter: &TripFilter, limit: i64, offset: i64) -> Result<TripPage, QueryError> {
        if limit < 0 || offset < 0 {
            return Err(QueryError::BadRequest(
                "limit and offset must be non-negative".into(),
            ));
        }

        let mut conditions = String::new();
        let mut args = Vec::new();
        trip_conditions(filter, &mut conditions, &mut args);

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM trips WHERE 1=1{conditions}"),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )?;

            let sql = format!(
                r#"
                SELECT
                    pickup_borough, dropoff_borough,
                    pickup_zone, dropoff_zone,
                    fare_amount, trip_distance,
                    trip_duration_mins, avg_speed_mph,
                    tip_percentage, time_of_day,
                    day_of_week, hour_of_day,
                    passenger_count, total_amount
                FROM trips
                WHERE 1=1{conditions}
                ORDER BY id
                LIMIT ? OFFSET ?
                "#
            );
            let mut page_args = args.clone();
            page_args.push(Value::Integer(limit));
            page_args.push(Value::Integer(offset));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(page_args.iter()), trip_row)?
                .collect::<Result<_, _>>()?;

            Ok(TripPage { total, rows })
        })
    }

    fn trips_by_borough(&self) -> Result<Vec<BoroughSummary>, QueryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    pickup_borough AS borough,
                    COUNT(*) AS total_trips,
                    ROUND(AVG(fare_amount), 2) AS avg_fare,
                    ROUND(AVG(trip_distance), 2) AS avg_distance,
                    ROUND(AVG(trip_duration_mins), 2) AS avg_duration,
                    ROUND(AVG(tip_percentage), 2) AS avg_tip_pct
                FROM trips
                WHERE pickup_borough IS NOT NULL
                AND pickup_borough != 'Unknown'
                GROUP BY pickup_borough
                ORDER BY total_trips DESC, pickup_borough
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(BoroughSummary {
                    borough: row.get("borough")?,
                    total_trips: row.get("total_trips")?,
                    avg_fare: row.get("avg_fare")?,
                    avg_distance: row.get("avg_distance")?,
                    avg_duration: row.get("avg_duration")?,
                    avg_tip_pct: row.get("avg_tip_pct")?,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn trips_by_hour(&self, borough: Option<&str>) -> Result<Vec<HourSummary>, QueryError> {
        let mut sql = String::from(
            r#"
            SELECT
                hour_of_day,
                COUNT(*) AS total_trips,
                ROUND(AVG(fare_amount), 2) AS avg_fare,
                ROUND(AVG(trip_duration_mins), 2) AS avg_duration
            FROM trips
            WHERE 1=1
            "#,
        );
        let mut args = Vec::new();
        if let Some(borough) = borough {
            sql.push_str(" AND pickup_borough = ?");
            args.push(Value::Text(borough.to_string()));
        }
        sql.push_str(" GROUP BY hour_of_day ORDER BY hour_of_day");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                Ok(HourSummary {
                    hour_of_day: row.get("hour_of_day")?,
                    total_trips: row.get("total_trips")?,
                    avg_fare: row.get("avg_fare")?,
                    avg_duration: row.get("avg_duration")?,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn trips_by_day(&self) -> Result<Vec<DaySummary>, QueryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    day_of_week,
                    COUNT(*) AS total_trips,
                    ROUND(AVG(fare_amount), 2) AS avg_fare,
                    ROUND(AVG(trip_distance), 2) AS avg_distance,
                    MAX(is_weekend) AS is_weekend
                FROM trips
                GROUP BY day_of_week
                ORDER BY total_trips DESC, day_of_week
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DaySummary {
                    day_of_week: row.get("day_of_week")?,
                    total_trips: row.get("total_trips")?,
                    avg_fare: row.get("avg_fare")?,
                    avg_distance: row.get("avg_distance")?,
                    is_weekend: row.get::<_, Option<i64>>("is_weekend")?.unwrap_or(0) != 0,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn top_routes(&self, limit: i64) -> Result<Vec<RouteSummary>, QueryError> {
        if limit < 0 {
            return Err(QueryError::BadRequest("limit must be non-negative".into()));
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    pickup_zone,
                    dropoff_zone,
                    pickup_borough,
                    dropoff_borough,
                    COUNT(*) AS total_trips,
                    ROUND(AVG(fare_amount), 2) AS avg_fare,
                    ROUND(AVG(trip_distance), 2) AS avg_distance
                FROM trips
                WHERE pickup_zone IS NOT NULL
                AND dropoff_zone IS NOT NULL
                GROUP BY pickup_zone, dropoff_zone
                ORDER BY total_trips DESC, pickup_zone, dropoff_zone
                LIMIT ?1
                "#,
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(RouteSummary {
                    pickup_zone: row.get("pickup_zone")?,
                    dropoff_zone: row.get("dropoff_zone")?,
                    pickup_borough: row.get("pickup_borough")?,
                    dropoff_borough: row.get("dropoff_borough")?,
                    total_trips: row.get("total_trips")?,
                    avg_fare: row.get("avg_fare")?,
                    avg_distance: row.get("avg_distance")?,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn zones(&self, borough: Option<&str>) -> Result<Vec<Zone>, QueryError> {
        let mut sql =
            String::from("SELECT location_id, borough, zone, service_zone FROM zones WHERE 1=1");
        let mut args = Vec::new();
        if let Some(borough) = borough {
            sql.push_str(" AND borough = ?");
            args.push(Value::Text(borough.to_string()));
        }
        sql.push_str(" ORDER BY borough, zone");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                Ok(Zone {
                    location_id: row.get(0)?,
                    borough: row.get(1)?,
                    zone: row.get(2)?,
                    service_zone: row.get(3)?,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }

    fn zone_stats(&self) -> Result<Vec<ZoneStat>, QueryError> {
        self.with_conn(|conn| {
            // with a single MIN(), bare columns come from the row holding the minimum
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    pickup_zone,
                    pickup_borough,
                    COUNT(*) AS trip_count,
                    AVG(fare_amount) AS avg_fare,
                    AVG(trip_distance) AS avg_distance,
                    MIN(id) AS first_id
                FROM trips
                WHERE pickup_zone IS NOT NULL
                GROUP BY pickup_zone
                ORDER BY pickup_zone
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ZoneStat {
                    zone: row.get(0)?,
                    borough: row.get(1)?,
                    trip_count: row.get(2)?,
                    avg_fare: round2_exact(row.get::<_, Option<f64>>(3)?.unwrap_or(0.0)),
                    avg_distance: round2_exact(row.get::<_, Option<f64>>(4)?.unwrap_or(0.0)),
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        })
    }
}
