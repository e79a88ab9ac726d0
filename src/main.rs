//! CLI entry point for the NYC Taxi Explorer.
//!
//! Provides subcommands for cleaning the raw trip dataset, loading it into
//! the SQLite store, ranking pickup zones and serving the read API.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxi_explorer::{
    analyzers::ranking::rank_zones,
    cleaning::clean_trips,
    config::{Paths, SAMPLE_ROWS, require},
    error::PipelineError,
    fetch::{BasicClient, Source, open_source},
    infra::sqlite::{
        SqliteStore,
        loader::{DEFAULT_BATCH_SIZE, build_store},
    },
    output::{write_clean_trips, write_json, write_ranking_report, write_zones},
    parser::{parse_trips, parse_zones, read_trip_records},
    server,
    services::TripQueries,
    zones::ZoneTable,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Number of zones detailed in the log after ranking.
const DETAILED_ZONES: usize = 5;

#[derive(Parser)]
#[command(name = "taxi_explorer")]
#[command(about = "Clean, load, rank and serve NYC taxi trip data", long_about = None)]
struct Cli {
    /// Directory holding raw inputs, cleaned artefacts and the store
    #[arg(long, global = true, env = "TAXI_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for the cleaning log, summary stats and ranking report
    #[arg(long, global = true, env = "TAXI_DOCS_DIR", default_value = "docs")]
    docs_dir: PathBuf,

    /// Store location, defaults to <DATA_DIR>/nyc_taxi.db
    #[arg(long, global = true, env = "TAXI_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and enrich the raw trips, writing the cleaned artefacts
    Clean {
        /// Raw trips file or URL, defaults to <DATA_DIR>/yellow_tripdata.csv
        #[arg(long, value_name = "FILE_OR_URL")]
        trips: Option<String>,

        /// Zone lookup file or URL, defaults to <DATA_DIR>/taxi_zone_lookup.csv
        #[arg(long, value_name = "FILE_OR_URL")]
        zones: Option<String>,
    },
    /// Rebuild the store from the cleaned artefacts
    Load {
        /// Trips inserted per transaction
        #[arg(long, env = "TAXI_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Rank pickup zones by mobility score and write the report
    Rank {
        /// Number of zones to log
        #[arg(short, long, default_value_t = 15)]
        top: usize,
    },
    /// Serve the read API
    Serve {
        #[arg(long, env = "TAXI_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "TAXI_PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Clean then load in one go
    Run {
        #[arg(long, value_name = "FILE_OR_URL")]
        trips: Option<String>,

        #[arg(long, value_name = "FILE_OR_URL")]
        zones: Option<String>,

        #[arg(long, env = "TAXI_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/taxi_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let paths = Paths::new(cli.data_dir, cli.docs_dir).with_db(cli.db);

    let outcome = match cli.command {
        Commands::Clean { trips, zones } => {
            let (trips, zones) = sources(&paths, trips, zones);
            clean(&paths, trips, zones).await
        }
        Commands::Load { batch_size } => load(&paths, batch_size).await,
        Commands::Rank { top } => rank(&paths, top).await,
        Commands::Serve { host, port } => {
            let store = SqliteStore::open(&paths.database())?;
            return server::serve(Arc::new(store), &host, port).await;
        }
        Commands::Run {
            trips,
            zones,
            batch_size,
        } => {
            let (trips, zones) = sources(&paths, trips, zones);
            match clean(&paths, trips, zones).await {
                Ok(()) => load(&paths, batch_size).await,
                Err(e) => Err(e),
            }
        }
    };

    match outcome {
        Err(PipelineError::Interrupted) => {
            warn!("Interrupted by user, rerun the command to rebuild its outputs");
            // the blocking worker may still be running; exit without joining it
            drop(file_guard);
            std::process::exit(0);
        }
        other => Ok(other?),
    }
}

/// Resolves `--trips` / `--zones`, falling back to the data directory.
fn sources(paths: &Paths, trips: Option<String>, zones: Option<String>) -> (Source, Source) {
    (
        trips.map_or_else(|| paths.raw_trips().into(), |s| Source::parse(&s)),
        zones.map_or_else(|| paths.raw_zones().into(), |s| Source::parse(&s)),
    )
}

/// Runs a blocking batch job, abandoning it if the operator presses ctrl+c.
async fn run_blocking<T, F>(job: F) -> Result<T, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    tokio::select! {
        joined = handle => joined?,
        _ = tokio::signal::ctrl_c() => Err(PipelineError::Interrupted),
    }
}

/// Cleans the raw trips and writes the cleaned artefacts and cleaning log.
#[tracing::instrument(skip(paths, trips, zones), fields(trips = %trips, zones = %zones))]
async fn clean(paths: &Paths, trips: Source, zones: Source) -> Result<(), PipelineError> {
    let client = BasicClient::new();
    let zone_input = open_source(&client, &zones).await?;
    let trip_input = open_source(&client, &trips).await?;

    let job_paths = paths.clone();
    let report = run_blocking(move || {
        let zones = ZoneTable::new(parse_zones(zone_input)?)?;
        info!(zones = zones.len(), "Zone lookup loaded");

        let raw = parse_trips(trip_input)?;
        info!(rows = raw.len(), "Raw trips loaded");

        let (clean, report) = clean_trips(&raw, &zones)?;
        drop(raw);

        let sampled = write_clean_trips(
            &job_paths.clean_trips(),
            &job_paths.trips_sample(),
            SAMPLE_ROWS,
            &clean,
            &zones,
        )?;
        write_zones(&job_paths.clean_zones(), &zones)?;
        info!(
            rows = clean.len(),
            sampled,
            path = %job_paths.clean_trips().display(),
            "Clean trips written"
        );
        Ok(report)
    })
    .await?;

    for stage in &report.stages {
        info!(
            stage = stage.reason.label(),
            removed = stage.removed,
            remaining = stage.remaining,
            "Cleaning stage"
        );
    }

    let date = Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    write_json(&paths.cleaning_log(), &report.to_log(date))?;
    info!(
        original_rows = report.original_rows,
        final_rows = report.final_rows(),
        percentage_kept = report.percentage_kept(),
        "Cleaning complete"
    );
    Ok(())
}

/// Rebuilds the store from the cleaned artefacts.
#[tracing::instrument(skip(paths))]
async fn load(paths: &Paths, batch_size: usize) -> Result<(), PipelineError> {
    let trips_path = paths.clean_trips();
    let zones_path = paths.clean_zones();
    require(&trips_path, "taxi_explorer clean")?;
    require(&zones_path, "taxi_explorer clean")?;

    let db_path = paths.database();
    let job_db = db_path.clone();
    let report = run_blocking(move || {
        let zones = parse_zones(File::open(&zones_path)?)?;
        let records = read_trip_records(BufReader::new(File::open(&trips_path)?));
        let created_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        build_store(&job_db, &zones, records, batch_size, &created_at)
    })
    .await?;

    write_json(&paths.summary_stats(), &report.summary)?;
    info!(
        zones = report.zones,
        trips = report.trips,
        db = %db_path.display(),
        "Store loaded"
    );
    Ok(())
}

/// Ranks pickup zones from the store and writes the ranking report.
#[tracing::instrument(skip(paths))]
async fn rank(paths: &Paths, top: usize) -> Result<(), PipelineError> {
    let db_path = paths.database();
    let ranked = run_blocking(move || {
        let store = SqliteStore::open(&db_path)?;
        let stats = store.zone_stats()?;
        Ok(rank_zones(stats)?)
    })
    .await?;

    info!(zones = ranked.len(), "Zones ranked");
    for zone in ranked.iter().take(top) {
        info!(
            rank = zone.rank,
            zone = %zone.stat.zone,
            borough = zone.stat.borough.as_deref().unwrap_or("Unknown"),
            score = zone.score,
            trips = zone.stat.trip_count,
            "Ranked zone"
        );
    }
    for zone in ranked.iter().take(DETAILED_ZONES) {
        info!(
            rank = zone.rank,
            zone = %zone.stat.zone,
            trip_count = zone.stat.trip_count,
            avg_fare = zone.stat.avg_fare,
            avg_distance = zone.stat.avg_distance,
            score = zone.score,
            "Top zone detail"
        );
    }

    let report_path = paths.ranking_report();
    write_ranking_report(&report_path, &ranked)?;
    info!(path = %report_path.display(), "Ranking report written");
    Ok(())
}
