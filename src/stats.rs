use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::analyzers::utility::{pct, round2_exact};

/// Why a record was dropped during cleaning, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    Duplicate,
    MissingCritical,
    NonPositiveFare,
    NonPositiveDistance,
    ExcessiveDistance,
    ExcessiveFare,
    InvalidPassengerCount,
    DropoffNotAfterPickup,
    LongerThanADay,
    ShorterThanAMinute,
    ImplausibleSpeed,
}

impl RemovalReason {
    /// Validation predicates, in the order they are applied.
    pub const PREDICATES: [RemovalReason; 9] = [
        RemovalReason::MissingCritical,
        RemovalReason::NonPositiveFare,
        RemovalReason::NonPositiveDistance,
        RemovalReason::ExcessiveDistance,
        RemovalReason::ExcessiveFare,
        RemovalReason::InvalidPassengerCount,
        RemovalReason::DropoffNotAfterPickup,
        RemovalReason::LongerThanADay,
        RemovalReason::ShorterThanAMinute,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RemovalReason::Duplicate => "duplicates",
            RemovalReason::MissingCritical => "missing_critical",
            RemovalReason::NonPositiveFare => "fare is zero or negative",
            RemovalReason::NonPositiveDistance => "distance is zero or negative",
            RemovalReason::ExcessiveDistance => "distance over 200 miles (impossible in NYC)",
            RemovalReason::ExcessiveFare => "fare over $1000 (suspicious)",
            RemovalReason::InvalidPassengerCount => "passenger count invalid (must be 1-6)",
            RemovalReason::DropoffNotAfterPickup => "dropoff time is before or same as pickup",
            RemovalReason::LongerThanADay => "trip longer than 24 hours",
            RemovalReason::ShorterThanAMinute => "trip shorter than 1 minute",
            RemovalReason::ImplausibleSpeed => "speed outside 1-150 mph",
        }
    }
}

/// Outcome of one cleaning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageEvent {
    pub reason: RemovalReason,
    pub removed: usize,
    pub remaining: usize,
}

/// Row accounting for a cleaning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningReport {
    pub original_rows: usize,
    pub stages: Vec<StageEvent>,
}

impl CleaningReport {
    pub fn new(original_rows: usize) -> Self {
        Self {
            original_rows,
            stages: Vec::new(),
        }
    }

    /// Appends a stage that removed `removed` of the rows still present.
    pub fn record(&mut self, reason: RemovalReason, removed: usize) {
        let remaining = self.final_rows().saturating_sub(removed);
        self.stages.push(StageEvent {
            reason,
            removed,
            remaining,
        });
    }

    pub fn final_rows(&self) -> usize {
        self.stages
            .last()
            .map_or(self.original_rows, |stage| stage.remaining)
    }

    pub fn removed_by(&self, reason: RemovalReason) -> usize {
        self.stages
            .iter()
            .filter(|stage| stage.reason == reason)
            .map(|stage| stage.removed)
            .sum()
    }

    pub fn total_removed(&self) -> usize {
        self.stages.iter().map(|stage| stage.removed).sum()
    }

    /// Every input row is either kept or attributed to exactly one stage.
    pub fn is_conserved(&self) -> bool {
        self.total_removed() + self.final_rows() == self.original_rows
    }

    pub fn percentage_kept(&self) -> f64 {
        round2_exact(pct(self.final_rows(), self.original_rows))
    }

    /// Serialisable cleaning log stamped with `date`.
    pub fn to_log(&self, date: String) -> CleaningLog<'_> {
        CleaningLog {
            date,
            original_rows: self.original_rows,
            removed: RemovedCounts(&self.stages),
            final_rows: self.final_rows(),
            percentage_kept: self.percentage_kept(),
        }
    }
}

/// On-disk shape of `cleaning_log.json`.
#[derive(Debug, serde::Serialize)]
pub struct CleaningLog<'a> {
    pub date: String,
    pub original_rows: usize,
    pub removed: RemovedCounts<'a>,
    pub final_rows: usize,
    pub percentage_kept: f64,
}

/// Stage label to removed count, kept in pipeline order.
#[derive(Debug)]
pub struct RemovedCounts<'a>(&'a [StageEvent]);

impl Serialize for RemovedCounts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for stage in self.0 {
            map.serialize_entry(stage.reason.label(), &stage.removed)?;
        }
        map.end()
    }
}
