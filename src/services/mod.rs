pub mod trip_queries;

pub use trip_queries::{
    BoroughSummary, DaySummary, HourSummary, RouteSummary, StatValue, TripFilter, TripPage,
    TripQueries, TripRow,
};
