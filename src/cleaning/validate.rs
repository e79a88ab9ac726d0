use std::collections::HashSet;

use super::types::{RawTrip, ValidTrip, elapsed_secs};
use crate::stats::{CleaningReport, RemovalReason};

const MAX_DISTANCE_MILES: f64 = 200.0;
const MAX_FARE: f64 = 1000.0;
const MAX_PASSENGERS: f64 = 6.0;
const MAX_DURATION_SECS: f64 = 86_400.0;
const MIN_DURATION_SECS: f64 = 60.0;

/// Removes full-row duplicates and every record failing a predicate.
///
/// The returned report holds the duplicate stage followed by one stage per
/// predicate in [`RemovalReason::PREDICATES`] order. The input is untouched.
pub fn validate(raw: &[RawTrip]) -> (Vec<ValidTrip>, CleaningReport) {
    let mut report = CleaningReport::new(raw.len());

    let mut seen = HashSet::with_capacity(raw.len());
    let unique: Vec<&RawTrip> = raw.iter().filter(|t| seen.insert(t.row_key())).collect();
    report.record(RemovalReason::Duplicate, raw.len() - unique.len());

    let mut removed = [0usize; RemovalReason::PREDICATES.len()];
    let mut valid = Vec::with_capacity(unique.len());

    for trip in unique {
        match check(trip) {
            Ok(v) => valid.push(v),
            Err(reason) => {
                if let Some(i) = RemovalReason::PREDICATES.iter().position(|r| *r == reason) {
                    removed[i] += 1;
                }
            }
        }
    }

    for (reason, count) in RemovalReason::PREDICATES.iter().zip(removed) {
        report.record(*reason, count);
    }

    (valid, report)
}

/// Applies the predicates in order and returns the first one that fails.
pub fn check(trip: &RawTrip) -> Result<ValidTrip, RemovalReason> {
    let passenger_count = trip.passenger_count.unwrap_or(1.0);

    let (
        Some(pickup_datetime),
        Some(dropoff_datetime),
        Some(pickup_location_id),
        Some(dropoff_location_id),
        Some(fare_amount),
        Some(trip_distance),
    ) = (
        trip.pickup_datetime,
        trip.dropoff_datetime,
        trip.pickup_location_id,
        trip.dropoff_location_id,
        trip.fare_amount,
        trip.trip_distance,
    )
    else {
        return Err(RemovalReason::MissingCritical);
    };

    if fare_amount <= 0.0 {
        return Err(RemovalReason::NonPositiveFare);
    }
    if trip_distance <= 0.0 {
        return Err(RemovalReason::NonPositiveDistance);
    }
    if trip_distance > MAX_DISTANCE_MILES {
        return Err(RemovalReason::ExcessiveDistance);
    }
    if fare_amount > MAX_FARE {
        return Err(RemovalReason::ExcessiveFare);
    }
    if passenger_count <= 0.0 || passenger_count > MAX_PASSENGERS {
        return Err(RemovalReason::InvalidPassengerCount);
    }
    if dropoff_datetime <= pickup_datetime {
        return Err(RemovalReason::DropoffNotAfterPickup);
    }

    let secs = elapsed_secs(pickup_datetime, dropoff_datetime);
    if secs > MAX_DURATION_SECS {
        return Err(RemovalReason::LongerThanADay);
    }
    if secs < MIN_DURATION_SECS {
        return Err(RemovalReason::ShorterThanAMinute);
    }

    Ok(ValidTrip {
        vendor_id: trip.vendor_id,
        pickup_datetime,
        dropoff_datetime,
        passenger_count,
        trip_distance,
        rate_code_id: trip.rate_code_id,
        pickup_location_id,
        dropoff_location_id,
        payment_type: trip.payment_type,
        fare_amount,
        tip_amount: trip.tip_amount,
        tolls_amount: trip.tolls_amount,
        total_amount: trip.total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn good_trip() -> RawTrip {
        RawTrip {
            vendor_id: Some(2),
            pickup_datetime: Some(at(8, 0, 0)),
            dropoff_datetime: Some(at(8, 20, 0)),
            passenger_count: Some(1.0),
            trip_distance: Some(3.0),
            rate_code_id: Some(1),
            pickup_location_id: Some(161),
            dropoff_location_id: Some(236),
            payment_type: Some(1),
            fare_amount: Some(15.0),
            tip_amount: Some(3.0),
            tolls_amount: Some(0.0),
            total_amount: Some(21.0),
        }
    }

    #[test]
    fn test_good_trip_passes() {
        let valid = check(&good_trip()).unwrap();
        assert_eq!(valid.fare_amount, 15.0);
        assert_eq!(valid.elapsed_secs(), 1200.0);
    }

    #[test]
    fn test_negative_fare_removed_at_fare_stage() {
        let trip = RawTrip {
            fare_amount: Some(-5.0),
            ..good_trip()
        };
        assert_eq!(check(&trip), Err(RemovalReason::NonPositiveFare));
    }

    #[test]
    fn test_first_failing_predicate_wins() {
        // fails fare, distance and duration; fare comes first
        let trip = RawTrip {
            fare_amount: Some(0.0),
            trip_distance: Some(0.0),
            dropoff_datetime: Some(at(8, 0, 30)),
            ..good_trip()
        };
        assert_eq!(check(&trip), Err(RemovalReason::NonPositiveFare));
    }

    #[test]
    fn test_missing_critical_field() {
        let trip = RawTrip {
            dropoff_location_id: None,
            ..good_trip()
        };
        assert_eq!(check(&trip), Err(RemovalReason::MissingCritical));
    }

    #[test]
    fn test_distance_boundary() {
        let at_limit = RawTrip {
            trip_distance: Some(200.0),
            dropoff_datetime: Some(at(12, 0, 0)),
            ..good_trip()
        };
        assert!(check(&at_limit).is_ok());

        let over = RawTrip {
            trip_distance: Some(200.01),
            ..at_limit
        };
        assert_eq!(check(&over), Err(RemovalReason::ExcessiveDistance));
    }

    #[test]
    fn test_fare_over_limit() {
        let trip = RawTrip {
            fare_amount: Some(1000.01),
            ..good_trip()
        };
        assert_eq!(check(&trip), Err(RemovalReason::ExcessiveFare));
    }

    #[test]
    fn test_missing_passenger_count_defaults_to_one() {
        let trip = RawTrip {
            passenger_count: None,
            ..good_trip()
        };
        assert_eq!(check(&trip).unwrap().passenger_count, 1.0);
    }

    #[test]
    fn test_passenger_count_bounds() {
        for bad in [0.0, -1.0, 7.0] {
            let trip = RawTrip {
                passenger_count: Some(bad),
                ..good_trip()
            };
            assert_eq!(check(&trip), Err(RemovalReason::InvalidPassengerCount));
        }
        let six = RawTrip {
            passenger_count: Some(6.0),
            ..good_trip()
        };
        assert!(check(&six).is_ok());
    }

    #[test]
    fn test_duration_rules() {
        let same = RawTrip {
            dropoff_datetime: Some(at(8, 0, 0)),
            ..good_trip()
        };
        assert_eq!(check(&same), Err(RemovalReason::DropoffNotAfterPickup));

        let short = RawTrip {
            dropoff_datetime: Some(at(8, 0, 59)),
            ..good_trip()
        };
        assert_eq!(check(&short), Err(RemovalReason::ShorterThanAMinute));

        let one_minute = RawTrip {
            dropoff_datetime: Some(at(8, 1, 0)),
            ..good_trip()
        };
        assert!(check(&one_minute).is_ok());

        let long = RawTrip {
            dropoff_datetime: Some(at(8, 0, 1) + chrono::Duration::days(1)),
            ..good_trip()
        };
        assert_eq!(check(&long), Err(RemovalReason::LongerThanADay));
    }

    #[test]
    fn test_validate_counts_and_conservation() {
        let good = good_trip();
        let raw = vec![
            good,
            good,
            RawTrip {
                fare_amount: Some(-5.0),
                ..good
            },
            RawTrip {
                pickup_datetime: None,
                ..good
            },
            RawTrip {
                vendor_id: Some(1),
                ..good
            },
        ];

        let (valid, report) = validate(&raw);

        assert_eq!(valid.len(), 2);
        assert_eq!(report.removed_by(RemovalReason::Duplicate), 1);
        assert_eq!(report.removed_by(RemovalReason::MissingCritical), 1);
        assert_eq!(report.removed_by(RemovalReason::NonPositiveFare), 1);
        assert_eq!(report.stages.len(), 10);
        assert_eq!(report.final_rows(), 2);
        assert!(report.is_conserved());
    }

    #[test]
    fn test_duplicates_compared_before_passenger_fill() {
        let with_null = RawTrip {
            passenger_count: None,
            ..good_trip()
        };
        let (valid, report) = validate(&[with_null, good_trip()]);

        assert_eq!(report.removed_by(RemovalReason::Duplicate), 0);
        assert_eq!(valid.len(), 2);
    }
}
