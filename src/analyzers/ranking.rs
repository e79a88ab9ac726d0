use std::cmp::Ordering;

use crate::analyzers::types::{RankedZone, ZoneStat};
use crate::analyzers::utility::round2_exact;
use crate::error::IntegrityFault;

/// Weight applied to each component of the mobility score.
const TRIPS_DIVISOR: f64 = 1000.0;
const FARE_WEIGHT: f64 = 0.5;
const DISTANCE_WEIGHT: f64 = 2.0;

/// `(trip_count / 1000) + (avg_fare * 0.5) + (avg_distance * 2)`, 2 dp.
pub fn mobility_score(stat: &ZoneStat) -> f64 {
    round2_exact(
        stat.trip_count as f64 / TRIPS_DIVISOR
            + stat.avg_fare * FARE_WEIGHT
            + stat.avg_distance * DISTANCE_WEIGHT,
    )
}

/// Scores and orders zones by descending mobility score.
///
/// The sort is stable, so zones with equal scores keep their input order.
/// Ranks are assigned 1..=n in the final order and never repeat.
pub fn rank_zones(stats: Vec<ZoneStat>) -> Result<Vec<RankedZone>, IntegrityFault> {
    let mut scored = stats
        .into_iter()
        .map(|stat| {
            let score = mobility_score(&stat);
            if score.is_finite() {
                Ok((stat, score))
            } else {
                Err(IntegrityFault(format!(
                    "non-finite mobility score for zone {}",
                    stat.zone
                )))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, (stat, score))| RankedZone {
            stat,
            score,
            rank: i + 1,
        })
        .collect())
}
