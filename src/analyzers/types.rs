//! Data types used by the aggregation and ranking pipeline.

use serde::{Deserialize, Serialize};

/// Per pickup zone aggregate feeding the mobility ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStat {
    pub zone: String,
    pub borough: Option<String>,
    pub trip_count: u64,
    /// Mean fare, 2 dp.
    pub avg_fare: f64,
    /// Mean distance in miles, 2 dp.
    pub avg_distance: f64,
}

/// A [`ZoneStat`] with its mobility score and 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedZone {
    #[serde(flatten)]
    pub stat: ZoneStat,
    pub score: f64,
    pub rank: usize,
}

/// Dataset-wide figures computed after every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_trips: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub avg_duration_mins: f64,
    pub avg_speed_mph: f64,
    pub avg_tip_percentage: f64,
    pub top_pickup_borough: String,
    pub peak_hour: i64,
}

impl SummaryStats {
    /// `(stat_name, stat_value)` pairs as stored in `summary_stats`.
    pub fn to_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("total_trips", self.total_trips.to_string()),
            ("avg_fare", self.avg_fare.to_string()),
            ("avg_distance", self.avg_distance.to_string()),
            ("avg_duration_mins", self.avg_duration_mins.to_string()),
            ("avg_speed_mph", self.avg_speed_mph.to_string()),
            ("avg_tip_percentage", self.avg_tip_percentage.to_string()),
            ("top_pickup_borough", self.top_pickup_borough.clone()),
            ("peak_hour", self.peak_hour.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_zone_serialises_flat() {
        let ranked = RankedZone {
            stat: ZoneStat {
                zone: "JFK Airport".into(),
                borough: Some("Queens".into()),
                trip_count: 1000,
                avg_fare: 10.0,
                avg_distance: 5.0,
            },
            score: 16.0,
            rank: 1,
        };

        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(value["zone"], "JFK Airport");
        assert_eq!(value["trip_count"], 1000);
        assert_eq!(value["score"], 16.0);
        assert_eq!(value["rank"], 1);
    }

    #[test]
    fn test_summary_rows() {
        let stats = SummaryStats {
            total_trips: 3,
            avg_fare: 15.25,
            avg_distance: 2.5,
            avg_duration_mins: 18.0,
            avg_speed_mph: 9.1,
            avg_tip_percentage: 12.0,
            top_pickup_borough: "Manhattan".into(),
            peak_hour: 8,
        };

        let rows = stats.to_rows();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], ("total_trips", "3".to_string()));
        assert_eq!(rows[1], ("avg_fare", "15.25".to_string()));
        assert_eq!(rows[6], ("top_pickup_borough", "Manhattan".to_string()));
    }
}
