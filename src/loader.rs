//! Reads a city's trip file into a [TripTable] and applies the month / weekday filter.
//!
//! The whole file is parsed before anything is returned. Any row whose `Start Time`,
//! `End Time` or `Trip Duration` can't be parsed rejects the entire load.

use crate::conventions::TripFilter;
use crate::error::{source_format_error, TripError};
use crate::sources::SourceResolver;
use crate::trip_table::{Column, Schema, Trip, TripRecord, TripTable};

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const DASH_TS: &str = "%Y-%m-%d %H:%M:%S%.f";
const DASH_TS_NO_SECONDS: &str = "%Y-%m-%d %H:%M";
const ISO_TS: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SLASH_TS: &str = "%m/%d/%Y %H:%M:%S";
const SLASH_TS_NO_SECONDS: &str = "%m/%d/%Y %H:%M";

const TIMESTAMP_FORMATS: [&str; 5] = [
    DASH_TS,
    DASH_TS_NO_SECONDS,
    ISO_TS,
    SLASH_TS,
    SLASH_TS_NO_SECONDS,
];

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Resolve `source_id` to a file, load it and keep only the rows `filter` allows.
pub fn load(
    resolver: &dyn SourceResolver,
    source_id: &str,
    filter: &TripFilter,
) -> Result<TripTable, TripError> {
    let path = resolver.resolve(source_id)?;
    debug!(source_id, path = %path.display(), "resolved source");
    load_path(&path, filter)
}

/// Load a trip file directly. Files ending in `.gz` are decompressed on the fly.
pub fn load_path(path: &Path, filter: &TripFilter) -> Result<TripTable, TripError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TripError::SourceNotFound(path.display().to_string()),
        _ => TripError::IoError(e),
    })?;

    let is_gzipped = path.extension().map_or(false, |ext| ext == "gz");
    let table = if is_gzipped {
        read_trips(GzDecoder::new(file))?
    } else {
        read_trips(file)?
    };
    info!(source = %path.display(), rows = table.len(), "loaded trips");

    let filtered = apply_filter(&table, filter);
    debug!(%filter, kept = filtered.len(), "applied filter");
    Ok(filtered)
}

/// Keep the rows whose derived `Month` and `Weekday` match `filter`.
pub fn apply_filter(table: &TripTable, filter: &TripFilter) -> TripTable {
    if filter.is_unfiltered() {
        return table.clone();
    }
    table.select(|r| filter.matches(r.month(), r.weekday()))
}

/// Parse comma-delimited trip records with a header row. Columns the table doesn't know
/// about are ignored.
pub fn read_trips<R: Read>(reader: R) -> Result<TripTable, TripError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let positions = ColumnPositions::from_headers(rdr.headers()?)?;
    let schema = Schema::with_optional(&positions.optional_columns());

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());
        let trip = positions.parse_trip(&row, line)?;
        records.push(TripRecord::new(trip));
    }
    Ok(TripTable::new(schema, records))
}

/// Where each known column sits in a particular file.
struct ColumnPositions {
    positions: HashMap<Column, usize>,
}

impl ColumnPositions {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, TripError> {
        let mut positions = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let header = header.trim_start_matches('\u{feff}').trim();
            let known = Column::REQUIRED
                .into_iter()
                .chain(Column::OPTIONAL)
                .find(|c| c.name().eq_ignore_ascii_case(header));
            if let Some(column) = known {
                positions.entry(column).or_insert(index);
            }
        }

        let missing = Column::REQUIRED
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.name())
            .collect::<Vec<&str>>();
        if !missing.is_empty() {
            return Err(source_format_error!(
                "missing required columns: {}",
                missing.join(", ")
            ));
        }
        Ok(Self { positions })
    }

    fn optional_columns(&self) -> Vec<Column> {
        Column::OPTIONAL
            .into_iter()
            .filter(|c| self.positions.contains_key(c))
            .collect()
    }

    fn cell<'r>(&self, row: &'r csv::StringRecord, column: Column) -> Option<&'r str> {
        self.positions
            .get(&column)
            .and_then(|index| row.get(*index))
            .filter(|s| !s.is_empty())
    }

    fn required<'r>(
        &self,
        row: &'r csv::StringRecord,
        column: Column,
        line: u64,
    ) -> Result<&'r str, TripError> {
        self.cell(row, column)
            .ok_or_else(|| source_format_error!("line {line}: empty '{column}'"))
    }

    fn timestamp(
        &self,
        row: &csv::StringRecord,
        column: Column,
        line: u64,
    ) -> Result<NaiveDateTime, TripError> {
        let text = self.required(row, column, line)?;
        parse_timestamp(text).ok_or_else(|| {
            source_format_error!("line {line}: can't parse '{text}' in '{column}' as a timestamp")
        })
    }

    fn parse_trip(&self, row: &csv::StringRecord, line: u64) -> Result<Trip, TripError> {
        let duration_text = self.required(row, Column::TripDuration, line)?;
        let trip_duration = duration_text
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| {
                source_format_error!("line {line}: can't parse '{duration_text}' as a trip duration")
            })?;

        let birth_year = match self.cell(row, Column::BirthYear) {
            None => None,
            Some(text) => Some(parse_year(text).ok_or_else(|| {
                source_format_error!("line {line}: can't parse '{text}' as a birth year")
            })?),
        };

        Ok(Trip {
            start_time: self.timestamp(row, Column::StartTime, line)?,
            end_time: self.timestamp(row, Column::EndTime, line)?,
            trip_duration,
            start_station: self.required(row, Column::StartStation, line)?.to_string(),
            end_station: self.required(row, Column::EndStation, line)?.to_string(),
            user_type: self.cell(row, Column::UserType).map(str::to_string),
            gender: self.cell(row, Column::Gender).map(str::to_string),
            birth_year,
        })
    }
}

// Birth years are often written as floats ("1992.0") in the city files.
fn parse_year(text: &str) -> Option<i64> {
    if let Ok(year) = text.parse::<i64>() {
        return Some(year);
    }
    let year = text.parse::<f64>().ok()?;
    if year.is_finite() && year.fract() == 0.0 {
        Some(year as i64)
    } else {
        None
    }
}
