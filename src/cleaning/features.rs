use chrono::{Datelike, Timelike, Weekday};

use super::time_bucket::time_of_day;
use super::types::{TimeOfDay, ValidTrip};
use crate::analyzers::utility::round2;
use crate::error::IntegrityFault;

const MIN_SPEED_MPH: f64 = 1.0;
const MAX_SPEED_MPH: f64 = 150.0;

/// Values derived from a single validated trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    pub trip_duration_mins: f64,
    pub avg_speed_mph: f64,
    pub tip_percentage: f64,
    pub hour_of_day: u32,
    pub time_of_day: TimeOfDay,
    pub day_of_week: Weekday,
    pub is_weekend: bool,
}

impl Features {
    /// Whether the average speed lies in the closed plausible band.
    pub fn speed_is_plausible(&self) -> bool {
        (MIN_SPEED_MPH..=MAX_SPEED_MPH).contains(&self.avg_speed_mph)
    }
}

/// Derives duration, speed, tip share and calendar fields.
///
/// Fails when the trip no longer satisfies the guarantees validation
/// established (positive fare and distance, at least a minute long).
pub fn derive(trip: &ValidTrip) -> Result<Features, IntegrityFault> {
    if !(trip.fare_amount > 0.0) {
        return Err(IntegrityFault(format!(
            "fare {} reached feature derivation",
            trip.fare_amount
        )));
    }
    if !(trip.trip_distance > 0.0) {
        return Err(IntegrityFault(format!(
            "distance {} reached feature derivation",
            trip.trip_distance
        )));
    }

    let secs = trip.elapsed_secs();
    if !(secs >= 60.0) {
        return Err(IntegrityFault(format!(
            "trip of {secs} seconds reached feature derivation"
        )));
    }

    let trip_duration_mins = round2(secs / 60.0);
    let avg_speed_mph = round2(trip.trip_distance / (trip_duration_mins / 60.0));
    if !avg_speed_mph.is_finite() {
        return Err(IntegrityFault(format!(
            "non-finite speed for {} miles in {trip_duration_mins} minutes",
            trip.trip_distance
        )));
    }

    let tip_percentage = trip
        .tip_amount
        .map(|tip| round2(tip / trip.fare_amount * 100.0).clamp(0.0, 100.0))
        .filter(|pct| pct.is_finite())
        .unwrap_or(0.0);

    let pickup = trip.pickup_datetime;
    let hour_of_day = pickup.hour();
    let day_of_week = pickup.weekday();

    Ok(Features {
        trip_duration_mins,
        avg_speed_mph,
        tip_percentage,
        hour_of_day,
        time_of_day: time_of_day(hour_of_day),
        day_of_week,
        is_weekend: matches!(day_of_week, Weekday::Sat | Weekday::Sun),
    })
}
