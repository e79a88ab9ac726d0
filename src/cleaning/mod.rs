//! Trip cleaning pipeline.
//!
//! Raw records are deduplicated and validated, feature-derived with a speed
//! plausibility filter, then joined to the zone table. Every removed record
//! is accounted for in the returned [`CleaningReport`].

pub mod enrich;
pub mod features;
pub mod time_bucket;
pub mod types;
pub mod validate;

pub use types::{CleanTrip, RawTrip, TimeOfDay, TripRecord, ValidTrip};

use crate::error::IntegrityFault;
use crate::stats::{CleaningReport, RemovalReason};
use crate::zones::ZoneTable;

/// Runs validation, feature derivation and zone enrichment in order.
pub fn clean_trips(
    raw: &[RawTrip],
    zones: &ZoneTable,
) -> Result<(Vec<CleanTrip>, CleaningReport), IntegrityFault> {
    let (valid, mut report) = validate::validate(raw);

    let mut clean = Vec::with_capacity(valid.len());
    let mut implausible = 0;
    for trip in valid {
        let derived = features::derive(&trip)?;
        if derived.speed_is_plausible() {
            clean.push(enrich::enrich(trip, derived, zones));
        } else {
            implausible += 1;
        }
    }
    report.record(RemovalReason::ImplausibleSpeed, implausible);

    if !report.is_conserved() || report.final_rows() != clean.len() {
        return Err(IntegrityFault(format!(
            "cleaning accounted for {} of {} rows",
            report.total_removed() + clean.len(),
            report.original_rows
        )));
    }

    Ok((clean, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::Zone;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn raw(distance: f64, fare: f64, minutes: u32) -> RawTrip {
        RawTrip {
            pickup_datetime: Some(at(9, 0)),
            dropoff_datetime: Some(at(9, minutes)),
            trip_distance: Some(distance),
            pickup_location_id: Some(1),
            dropoff_location_id: Some(2),
            fare_amount: Some(fare),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_trips_conserves_rows() {
        let zones = ZoneTable::new(vec![Zone {
            location_id: 1,
            borough: Some("EWR".into()),
            zone: Some("Newark Airport".into()),
            service_zone: Some("EWR".into()),
        }])
        .unwrap();

        let input = vec![
            raw(3.0, 15.0, 20),
            raw(3.0, 15.0, 20),
            raw(0.1, 15.0, 30),
            raw(3.0, -1.0, 20),
            raw(5.0, 25.0, 25),
        ];

        let (clean, report) = clean_trips(&input, &zones).unwrap();

        assert_eq!(clean.len(), 2);
        assert_eq!(report.original_rows, 5);
        assert_eq!(report.removed_by(RemovalReason::Duplicate), 1);
        assert_eq!(report.removed_by(RemovalReason::NonPositiveFare), 1);
        assert_eq!(report.removed_by(RemovalReason::ImplausibleSpeed), 1);
        assert_eq!(report.stages.last().unwrap().reason, RemovalReason::ImplausibleSpeed);
        assert!(report.is_conserved());

        assert_eq!(zones.borough(clean[0].pickup_zone), Some("EWR"));
        assert!(clean[0].dropoff_zone.is_none());
    }

    #[test]
    fn test_clean_trips_empty_input() {
        let (clean, report) = clean_trips(&[], &ZoneTable::default()).unwrap();
        assert!(clean.is_empty());
        assert_eq!(report.final_rows(), 0);
        assert_eq!(report.stages.len(), 11);
    }
}
