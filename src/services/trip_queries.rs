//! Trait and types for read access to the loaded trip store.

use serde::{Deserialize, Serialize};

use crate::analyzers::types::ZoneStat;
use crate::error::QueryError;
use crate::zones::Zone;

/// A stored summary statistic value.
///
/// Values that parse as finite numbers are exposed as numbers, everything
/// else as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => StatValue::Number(n),
            _ => StatValue::Text(raw.to_string()),
        }
    }
}

/// Equality filters on trips, combined with AND. `None` means unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripFilter {
    /// Pickup borough.
    pub borough: Option<String>,
    pub time_of_day: Option<String>,
    /// Day of week name, e.g. `Monday`.
    pub day: Option<String>,
}

/// One page of matching trips plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPage {
    pub total: i64,
    pub rows: Vec<TripRow>,
}

/// Projection of a trip returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRow {
    pub pickup_borough: Option<String>,
    pub dropoff_borough: Option<String>,
    pub pickup_zone: Option<String>,
    pub dropoff_zone: Option<String>,
    pub fare_amount: Option<f64>,
    pub trip_distance: Option<f64>,
    pub trip_duration_mins: Option<f64>,
    pub avg_speed_mph: Option<f64>,
    pub tip_percentage: Option<f64>,
    pub time_of_day: Option<String>,
    pub day_of_week: Option<String>,
    pub hour_of_day: Option<i64>,
    pub passenger_count: Option<f64>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoroughSummary {
    pub borough: String,
    pub total_trips: i64,
    pub avg_fare: Option<f64>,
    pub avg_distance: Option<f64>,
    pub avg_duration: Option<f64>,
    pub avg_tip_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSummary {
    pub hour_of_day: Option<i64>,
    pub total_trips: i64,
    pub avg_fare: Option<f64>,
    pub avg_duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day_of_week: Option<String>,
    pub total_trips: i64,
    pub avg_fare: Option<f64>,
    pub avg_distance: Option<f64>,
    pub is_weekend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub pickup_zone: String,
    pub dropoff_zone: String,
    pub pickup_borough: Option<String>,
    pub dropoff_borough: Option<String>,
    pub total_trips: i64,
    pub avg_fare: Option<f64>,
    pub avg_distance: Option<f64>,
}

/// Read-side queries over the trip store.
///
/// Implementations are blocking; async callers run them on a blocking thread.
pub trait TripQueries: Send + Sync {
    /// Summary statistics as `(name, value)` in storage order.
    fn summary_stats(&self) -> Result<Vec<(String, StatValue)>, QueryError>;

    /// Distinct known pickup boroughs, sorted.
    fn boroughs(&self) -> Result<Vec<String>, QueryError>;

    fn trips(&self, filter: &TripFilter, limit: i64, offset: i64) -> Result<TripPage, QueryError>;

    fn trips_by_borough(&self) -> Result<Vec<BoroughSummary>, QueryError>;

    fn trips_by_hour(&self, borough: Option<&str>) -> Result<Vec<HourSummary>, QueryError>;

    fn trips_by_day(&self) -> Result<Vec<DaySummary>, QueryError>;

    fn top_routes(&self, limit: i64) -> Result<Vec<RouteSummary>, QueryError>;

    /// Zone rows ordered by borough then zone name.
    fn zones(&self, borough: Option<&str>) -> Result<Vec<Zone>, QueryError>;

    /// Per pickup zone aggregates in zone-name order, input to the ranking.
    fn zone_stats(&self) -> Result<Vec<ZoneStat>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_value_parse() {
        assert_eq!(StatValue::parse("15.27"), StatValue::Number(15.27));
        assert_eq!(StatValue::parse("8"), StatValue::Number(8.0));
        assert_eq!(
            StatValue::parse("Manhattan"),
            StatValue::Text("Manhattan".into())
        );
        assert_eq!(StatValue::parse("nan"), StatValue::Text("nan".into()));
    }

    #[test]
    fn test_stat_value_serialises_untagged() {
        assert_eq!(
            serde_json::to_string(&StatValue::Number(8.0)).unwrap(),
            "8.0"
        );
        assert_eq!(
            serde_json::to_string(&StatValue::Text("Queens".into())).unwrap(),
            "\"Queens\""
        );
    }
}
