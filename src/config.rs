//! Locations of every input and artefact, derived from the data and docs
//! directories.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

pub const DEFAULT_TRIPS_FILE: &str = "yellow_tripdata.csv";
pub const DEFAULT_ZONES_FILE: &str = "taxi_zone_lookup.csv";

/// Number of clean rows copied to the sample artefact.
pub const SAMPLE_ROWS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub docs_dir: PathBuf,
    db: Option<PathBuf>,
}

impl Paths {
    pub fn new(data_dir: impl Into<PathBuf>, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            docs_dir: docs_dir.into(),
            db: None,
        }
    }

    /// Overrides the store location, which otherwise lives in the data dir.
    pub fn with_db(mut self, db: Option<PathBuf>) -> Self {
        self.db = db;
        self
    }

    pub fn raw_trips(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_TRIPS_FILE)
    }

    pub fn raw_zones(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_ZONES_FILE)
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.data_dir.join("cleaned")
    }

    pub fn clean_trips(&self) -> PathBuf {
        self.cleaned_dir().join("trips_clean.csv")
    }

    pub fn clean_zones(&self) -> PathBuf {
        self.cleaned_dir().join("zones_clean.csv")
    }

    pub fn trips_sample(&self) -> PathBuf {
        self.cleaned_dir().join("trips_sample.csv")
    }

    pub fn database(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("nyc_taxi.db"))
    }

    pub fn cleaning_log(&self) -> PathBuf {
        self.docs_dir.join("cleaning_log.json")
    }

    pub fn summary_stats(&self) -> PathBuf {
        self.docs_dir.join("summary_stats.json")
    }

    pub fn ranking_report(&self) -> PathBuf {
        self.docs_dir.join("algorithm_results.txt")
    }
}

/// Fails with [`PipelineError::MissingPrerequisite`] when `path` is absent.
pub fn require(path: &Path, step: &'static str) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingPrerequisite {
            path: path.to_path_buf(),
            step,
        })
    }
}
