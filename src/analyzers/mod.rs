//! Zone aggregation and mobility ranking.
//!
//! Per pickup zone statistics are scored with a weighted mobility formula
//! and ordered into a deterministic ranking.

pub mod aggregate;
pub mod ranking;
pub mod types;
pub mod utility;
