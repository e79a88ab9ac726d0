use std::collections::BTreeMap;

use crate::analyzers::types::ZoneStat;
use crate::analyzers::utility::round2_exact;
use crate::cleaning::CleanTrip;
use crate::zones::ZoneTable;

#[derive(Default)]
struct ZoneTotals<'a> {
    borough: Option<&'a str>,
    trips: u64,
    fare_sum: f64,
    distance_sum: f64,
}

/// Groups clean trips by pickup zone name.
///
/// Trips without a pickup zone are skipped. Zones come out in ascending name
/// order; the borough is the one of the first trip seen for that zone.
pub fn zone_stats(trips: &[CleanTrip], zones: &ZoneTable) -> Vec<ZoneStat> {
    let mut totals: BTreeMap<&str, ZoneTotals> = BTreeMap::new();

    for trip in trips {
        let Some(name) = zones.zone_name(trip.pickup_zone) else {
            continue;
        };
        let entry = totals.entry(name).or_insert_with(|| ZoneTotals {
            borough: zones.borough(trip.pickup_zone),
            ..Default::default()
        });
        entry.trips += 1;
        entry.fare_sum += trip.trip.fare_amount;
        entry.distance_sum += trip.trip.trip_distance;
    }

    totals
        .into_iter()
        .map(|(zone, t)| ZoneStat {
            zone: zone.to_string(),
            borough: t.borough.map(str::to_string),
            trip_count: t.trips,
            avg_fare: round2_exact(t.fare_sum / t.trips as f64),
            avg_distance: round2_exact(t.distance_sum / t.trips as f64),
        })
        .collect()
}
