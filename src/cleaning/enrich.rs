use super::features::Features;
use super::types::{CleanTrip, ValidTrip};
use crate::zones::ZoneTable;

/// Attaches pickup and dropoff zones by location id.
///
/// Unknown ids leave the zone empty; the trip is always kept.
pub fn enrich(trip: ValidTrip, features: Features, zones: &ZoneTable) -> CleanTrip {
    CleanTrip {
        trip_duration_mins: features.trip_duration_mins,
        avg_speed_mph: features.avg_speed_mph,
        tip_percentage: features.tip_percentage,
        hour_of_day: features.hour_of_day,
        time_of_day: features.time_of_day,
        day_of_week: features.day_of_week,
        is_weekend: features.is_weekend,
        pickup_zone: zones.lookup(trip.pickup_location_id),
        dropoff_zone: zones.lookup(trip.dropoff_location_id),
        trip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::features::derive;
    use crate::zones::Zone;
    use chrono::NaiveDate;

    #[test]
    fn test_unknown_location_kept_without_zone() {
        let zones = ZoneTable::new(vec![Zone {
            location_id: 236,
            borough: Some("Manhattan".into()),
            zone: Some("Upper East Side North".into()),
            service_zone: Some("Yellow Zone".into()),
        }])
        .unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let trip = ValidTrip {
            vendor_id: None,
            pickup_datetime: day.and_hms_opt(10, 0, 0).unwrap(),
            dropoff_datetime: day.and_hms_opt(10, 15, 0).unwrap(),
            passenger_count: 1.0,
            trip_distance: 2.0,
            rate_code_id: None,
            pickup_location_id: 9999,
            dropoff_location_id: 236,
            payment_type: None,
            fare_amount: 12.0,
            tip_amount: None,
            tolls_amount: None,
            total_amount: None,
        };

        let clean = enrich(trip, derive(&trip).unwrap(), &zones);

        assert!(clean.pickup_zone.is_none());
        assert_eq!(zones.borough(clean.pickup_zone), None);
        assert_eq!(zones.borough(clean.dropoff_zone), Some("Manhattan"));
        assert_eq!(clean.trip, trip);
    }
}
