//! CSV readers for raw trips, zone lookups and cleaned trip artefacts.
//!
//! Inputs may be gzip-compressed; this is detected from the magic bytes.

use std::io::{BufRead, BufReader, Read};

use csv::ByteRecord;
use flate2::read::MultiGzDecoder;
use serde::Deserialize;

use crate::cleaning::{RawTrip, TripRecord};
use crate::error::PipelineError;
use crate::zones::Zone;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Wraps `reader` in a gzip decoder when the stream starts with the gzip magic.
pub fn maybe_gzip<'a, R: Read + 'a>(reader: R) -> std::io::Result<Box<dyn Read + 'a>> {
    let mut buffered = BufReader::new(reader);
    let is_gzip = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        Ok(Box::new(MultiGzDecoder::new(buffered)))
    } else {
        Ok(Box::new(buffered))
    }
}

/// Reads every row of a raw trip CSV. Unknown columns are ignored.
///
/// Rows are read as bytes, so a cell that is not valid UTF-8 becomes null
/// instead of failing the whole file.
pub fn parse_trips<R: Read>(reader: R) -> Result<Vec<RawTrip>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(maybe_gzip(reader)?);
    let headers = rdr.byte_headers()?.clone();

    let mut trips = Vec::new();
    let mut record = ByteRecord::new();
    while rdr.read_byte_record(&mut record)? {
        trips.push(record.deserialize::<RawTrip>(Some(&headers))?);
    }
    Ok(trips)
}

#[derive(Deserialize)]
struct ZoneRow {
    #[serde(default, alias = "LocationID", deserialize_with = "cell::int")]
    location_id: Option<i64>,
    #[serde(default, alias = "Borough", deserialize_with = "cell::text")]
    borough: Option<String>,
    #[serde(default, alias = "Zone", deserialize_with = "cell::text")]
    zone: Option<String>,
    #[serde(default, deserialize_with = "cell::text")]
    service_zone: Option<String>,
}

/// Reads a zone lookup CSV. Rows without a usable location id are skipped,
/// since no trip can ever join to them.
pub fn parse_zones<R: Read>(reader: R) -> Result<Vec<Zone>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(maybe_gzip(reader)?);
    let headers = rdr.byte_headers()?.clone();

    let mut zones = Vec::new();
    let mut record = ByteRecord::new();
    while rdr.read_byte_record(&mut record)? {
        let row: ZoneRow = record.deserialize(Some(&headers))?;
        if let Some(location_id) = row.location_id {
            zones.push(Zone {
                location_id,
                borough: row.borough,
                zone: row.zone,
                service_zone: row.service_zone,
            });
        }
    }
    Ok(zones)
}

/// Streams cleaned trip records back from a `trips_clean.csv` artefact.
pub fn read_trip_records<R: Read>(
    reader: R,
) -> impl Iterator<Item = Result<TripRecord, PipelineError>> {
    csv::Reader::from_reader(reader)
        .into_deserialize::<TripRecord>()
        .map(|row| row.map_err(PipelineError::from))
}

/// Cell-level coercion shared by the CSV row types.
///
/// Null tokens and unparseable values both become `None`.
pub mod cell {
    use std::fmt;

    use chrono::{NaiveDate, NaiveDateTime};
    use serde::de::{Deserializer, Visitor};

    /// Cell values read as missing.
    pub const NULL_TOKENS: &[&str] = &[
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ];

    pub fn is_null(value: &str) -> bool {
        NULL_TOKENS.contains(&value)
    }

    pub fn parse_float(value: &str) -> Option<f64> {
        if is_null(value) {
            return None;
        }
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| !v.is_nan())
    }

    /// Integers written as `"132"` or `"132.0"` are both accepted.
    pub fn parse_int(value: &str) -> Option<i64> {
        if is_null(value) {
            return None;
        }
        let trimmed = value.trim();
        trimmed.parse::<i64>().ok().or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
    }

    pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
        if is_null(value) {
            return None;
        }
        let trimmed = value.trim();
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn parse_text(value: &str) -> Option<String> {
        if is_null(value) {
            None
        } else {
            Some(value.to_string())
        }
    }

    struct CellVisitor<T>(fn(&str) -> Option<T>);

    impl<'de, T> Visitor<'de> for CellVisitor<T> {
        type Value = Option<T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a CSV cell")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok((self.0)(v))
        }

        fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(std::str::from_utf8(v).ok().and_then(self.0))
        }
    }

    fn with_cell<'de, D, T>(d: D, parse: fn(&str) -> Option<T>) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_bytes(CellVisitor(parse))
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        with_cell(d, parse_float)
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        with_cell(d, parse_int)
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        with_cell(d, parse_timestamp)
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        with_cell(d, parse_text)
    }
}
