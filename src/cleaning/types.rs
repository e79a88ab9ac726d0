//! Trip records at each step of the cleaning pipeline.

use std::fmt;

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::parser::cell;
use crate::zones::{ZoneRef, ZoneTable};

/// Timestamp layout used in every written artefact and in the store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One taxi ride as ingested. Nothing is guaranteed about any field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawTrip {
    #[serde(alias = "VendorID", deserialize_with = "cell::int")]
    pub vendor_id: Option<i64>,
    #[serde(
        alias = "tpep_pickup_datetime",
        alias = "lpep_pickup_datetime",
        deserialize_with = "cell::timestamp"
    )]
    pub pickup_datetime: Option<NaiveDateTime>,
    #[serde(
        alias = "tpep_dropoff_datetime",
        alias = "lpep_dropoff_datetime",
        deserialize_with = "cell::timestamp"
    )]
    pub dropoff_datetime: Option<NaiveDateTime>,
    #[serde(deserialize_with = "cell::float")]
    pub passenger_count: Option<f64>,
    #[serde(deserialize_with = "cell::float")]
    pub trip_distance: Option<f64>,
    #[serde(alias = "RatecodeID", deserialize_with = "cell::int")]
    pub rate_code_id: Option<i64>,
    #[serde(alias = "PULocationID", deserialize_with = "cell::int")]
    pub pickup_location_id: Option<i64>,
    #[serde(alias = "DOLocationID", deserialize_with = "cell::int")]
    pub dropoff_location_id: Option<i64>,
    #[serde(deserialize_with = "cell::int")]
    pub payment_type: Option<i64>,
    #[serde(deserialize_with = "cell::float")]
    pub fare_amount: Option<f64>,
    #[serde(deserialize_with = "cell::float")]
    pub tip_amount: Option<f64>,
    #[serde(deserialize_with = "cell::float")]
    pub tolls_amount: Option<f64>,
    #[serde(deserialize_with = "cell::float")]
    pub total_amount: Option<f64>,
}

/// Hashable image of a whole [`RawTrip`], nulls included.
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct RowKey([Option<i64>; 13]);

impl RawTrip {
    pub(crate) fn row_key(&self) -> RowKey {
        fn bits(v: Option<f64>) -> Option<i64> {
            // -0.0 and 0.0 compare equal
            v.map(|x| if x == 0.0 { 0 } else { x.to_bits() as i64 })
        }
        fn nanos(t: Option<NaiveDateTime>) -> Option<i64> {
            t.map(|t| {
                t.and_utc()
                    .timestamp_nanos_opt()
                    .unwrap_or_else(|| t.and_utc().timestamp())
            })
        }

        RowKey([
            self.vendor_id,
            nanos(self.pickup_datetime),
            nanos(self.dropoff_datetime),
            bits(self.passenger_count),
            bits(self.trip_distance),
            self.rate_code_id,
            self.pickup_location_id,
            self.dropoff_location_id,
            self.payment_type,
            bits(self.fare_amount),
            bits(self.tip_amount),
            bits(self.tolls_amount),
            bits(self.total_amount),
        ])
    }
}

/// A trip that passed every validation predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidTrip {
    pub vendor_id: Option<i64>,
    pub pickup_datetime: NaiveDateTime,
    pub dropoff_datetime: NaiveDateTime,
    pub passenger_count: f64,
    pub trip_distance: f64,
    pub rate_code_id: Option<i64>,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub payment_type: Option<i64>,
    pub fare_amount: f64,
    pub tip_amount: Option<f64>,
    pub tolls_amount: Option<f64>,
    pub total_amount: Option<f64>,
}

impl ValidTrip {
    /// Seconds between pickup and dropoff.
    pub fn elapsed_secs(&self) -> f64 {
        elapsed_secs(self.pickup_datetime, self.dropoff_datetime)
    }
}

pub(crate) fn elapsed_secs(pickup: NaiveDateTime, dropoff: NaiveDateTime) -> f64 {
    let delta = dropoff - pickup;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_seconds() as f64,
    }
}

/// Coarse part of the day a pickup falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    MorningRush,
    MidMorning,
    Afternoon,
    EveningRush,
    Night,
    LateNight,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::MorningRush => "Morning Rush",
            TimeOfDay::MidMorning => "Mid Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::EveningRush => "Evening Rush",
            TimeOfDay::Night => "Night",
            TimeOfDay::LateNight => "Late Night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A validated trip with derived features and zone references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanTrip {
    pub trip: ValidTrip,
    pub trip_duration_mins: f64,
    pub avg_speed_mph: f64,
    pub tip_percentage: f64,
    pub hour_of_day: u32,
    pub time_of_day: TimeOfDay,
    pub day_of_week: Weekday,
    pub is_weekend: bool,
    pub pickup_zone: Option<ZoneRef>,
    pub dropoff_zone: Option<ZoneRef>,
}

/// Flat persisted form of a [`CleanTrip`], in `trips` table column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vendor_id: Option<i64>,
    pub pickup_datetime: String,
    pub dropoff_datetime: String,
    pub passenger_count: f64,
    pub trip_distance: f64,
    pub rate_code_id: Option<i64>,
    pub pickup_location_id: i64,
    pub dropoff_location_id: i64,
    pub payment_type: Option<i64>,
    pub fare_amount: f64,
    pub tip_amount: Option<f64>,
    pub tolls_amount: Option<f64>,
    pub total_amount: Option<f64>,
    pub trip_duration_mins: f64,
    pub avg_speed_mph: f64,
    pub tip_percentage: f64,
    pub hour_of_day: u32,
    pub time_of_day: String,
    pub day_of_week: String,
    pub is_weekend: bool,
    pub pickup_borough: Option<String>,
    pub pickup_zone: Option<String>,
    pub dropoff_borough: Option<String>,
    pub dropoff_zone: Option<String>,
}

impl TripRecord {
    pub fn from_clean(trip: &CleanTrip, zones: &ZoneTable) -> Self {
        let t = &trip.trip;
        let owned = |s: Option<&str>| s.map(str::to_string);

        TripRecord {
            vendor_id: t.vendor_id,
            pickup_datetime: t.pickup_datetime.format(TIMESTAMP_FORMAT).to_string(),
            dropoff_datetime: t.dropoff_datetime.format(TIMESTAMP_FORMAT).to_string(),
            passenger_count: t.passenger_count,
            trip_distance: t.trip_distance,
            rate_code_id: t.rate_code_id,
            pickup_location_id: t.pickup_location_id,
            dropoff_location_id: t.dropoff_location_id,
            payment_type: t.payment_type,
            fare_amount: t.fare_amount,
            tip_amount: t.tip_amount,
            tolls_amount: t.tolls_amount,
            total_amount: t.total_amount,
            trip_duration_mins: trip.trip_duration_mins,
            avg_speed_mph: trip.avg_speed_mph,
            tip_percentage: trip.tip_percentage,
            hour_of_day: trip.hour_of_day,
            time_of_day: trip.time_of_day.to_string(),
            day_of_week: weekday_name(trip.day_of_week).to_string(),
            is_weekend: trip.is_weekend,
            pickup_borough: owned(zones.borough(trip.pickup_zone)),
            pickup_zone: owned(zones.zone_name(trip.pickup_zone)),
            dropoff_borough: owned(zones.borough(trip.dropoff_zone)),
            dropoff_zone: owned(zones.zone_name(trip.dropoff_zone)),
        }
    }
}
