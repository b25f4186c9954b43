//! The in-memory trip table. A [TripTable] is built once by the loader and never changes
//! afterwards; filtering and projection hand back new values instead.
//!
//! Each row keeps the source fields as parsed ([Trip]) next to four fields derived from them
//! at construction time: `Month`, `Weekday`, `Hour` and `Trip` (the "start TO end" route).

use crate::error::TripError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Format used when showing timestamps, matching the city source files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Joins start and end stations in the derived `Trip` column.
pub const ROUTE_SEPARATOR: &str = " TO ";

/// The fields (FieldName) a trip table can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    StartTime,
    EndTime,
    TripDuration,
    StartStation,
    EndStation,
    UserType,
    Gender,
    BirthYear,
    Month,
    Weekday,
    Hour,
    Trip,
}

impl Column {
    /// Every source must carry these, in the order raw rows are shown.
    pub const REQUIRED: [Column; 6] = [
        Column::StartTime,
        Column::EndTime,
        Column::TripDuration,
        Column::StartStation,
        Column::EndStation,
        Column::UserType,
    ];

    /// Demographic columns only some cities publish.
    pub const OPTIONAL: [Column; 2] = [Column::Gender, Column::BirthYear];

    pub const DERIVED: [Column; 4] = [Column::Month, Column::Weekday, Column::Hour, Column::Trip];

    /// The header name as it appears in a source file, or the derived column's name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::StartTime => "Start Time",
            Column::EndTime => "End Time",
            Column::TripDuration => "Trip Duration",
            Column::StartStation => "Start Station",
            Column::EndStation => "End Station",
            Column::UserType => "User Type",
            Column::Gender => "Gender",
            Column::BirthYear => "Birth Year",
            Column::Month => "Month",
            Column::Weekday => "Weekday",
            Column::Hour => "Hour",
            Column::Trip => "Trip",
        }
    }

    pub fn is_derived(&self) -> bool {
        Self::DERIVED.contains(self)
    }

    fn all() -> impl Iterator<Item = Column> {
        Self::REQUIRED
            .into_iter()
            .chain(Self::OPTIONAL)
            .chain(Self::DERIVED)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Column {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Accepts header names in any case, with spaces or underscores ("start_time",
/// "Start Time"). "Day" is accepted for `Weekday`.
impl FromStr for Column {
    type Err = TripError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().replace('_', " ").to_lowercase();
        if normalized == "day" {
            return Ok(Column::Weekday);
        }
        Column::all()
            .find(|c| c.name().to_lowercase() == normalized)
            .ok_or_else(|| TripError::UnknownColumn(name.to_string()))
    }
}

/// A single cell. Ordering is total: values of different kinds sort by kind, numbers use
/// IEEE total ordering, and `Missing` sorts first.
#[derive(Clone, Debug)]
pub enum Value {
    Missing,
    Integer(i64),
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Integer(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Timestamp(_) => 4,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => serializer.collect_str(&t.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

/// The source fields of one trip as parsed from a city file.
#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub trip_duration: f64,
    pub start_station: String,
    pub end_station: String,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i64>,
}

/// A trip plus its derived fields. Only constructed through [TripRecord::new] so the derived
/// fields always agree with `start_time` and the stations.
#[derive(Clone, Debug, PartialEq)]
pub struct TripRecord {
    trip: Trip,
    month: u32,
    weekday: u32,
    hour: u32,
    route: String,
}

impl TripRecord {
    pub fn new(trip: Trip) -> Self {
        let month = trip.start_time.month();
        let weekday = trip.start_time.weekday().num_days_from_monday();
        let hour = trip.start_time.hour();
        let route = format!(
            "{}{}{}",
            trip.start_station, ROUTE_SEPARATOR, trip.end_station
        );
        Self {
            trip,
            month,
            weekday,
            hour,
            route,
        }
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    /// 1 through 12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// 0 = Monday ... 6 = Sunday
    pub fn weekday(&self) -> u32 {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn value(&self, column: Column) -> Value {
        let text_or_missing = |v: &Option<String>| match v {
            Some(s) => Value::Text(s.clone()),
            None => Value::Missing,
        };
        match column {
            Column::StartTime => Value::Timestamp(self.trip.start_time),
            Column::EndTime => Value::Timestamp(self.trip.end_time),
            Column::TripDuration => Value::Number(self.trip.trip_duration),
            Column::StartStation => Value::Text(self.trip.start_station.clone()),
            Column::EndStation => Value::Text(self.trip.end_station.clone()),
            Column::UserType => text_or_missing(&self.trip.user_type),
            Column::Gender => text_or_missing(&self.trip.gender),
            Column::BirthYear => self.trip.birth_year.map_or(Value::Missing, Value::Integer),
            Column::Month => Value::Integer(self.month.into()),
            Column::Weekday => Value::Integer(self.weekday.into()),
            Column::Hour => Value::Integer(self.hour.into()),
            Column::Trip => Value::Text(self.route.clone()),
        }
    }
}

/// Which columns a table has. Always the required source columns and the derived ones, plus
/// whichever optional columns the source supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// `optional` lists the optional source columns present; anything else in it is ignored.
    pub fn with_optional(optional: &[Column]) -> Self {
        let columns = Column::REQUIRED
            .into_iter()
            .chain(Column::OPTIONAL.into_iter().filter(|c| optional.contains(c)))
            .chain(Column::DERIVED)
            .collect();
        Self { columns }
    }

    pub fn full() -> Self {
        Self::with_optional(&Column::OPTIONAL)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// The source columns, in the order raw rows are shown.
    pub fn source_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .copied()
            .filter(|c| !c.is_derived())
            .collect()
    }

    pub fn has_demographics(&self) -> bool {
        Column::OPTIONAL.iter().all(|c| self.contains(*c))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripTable {
    schema: Schema,
    records: Vec<TripRecord>,
}

impl TripTable {
    pub fn new(schema: Schema, records: Vec<TripRecord>) -> Self {
        Self { schema, records }
    }

    pub fn empty(schema: Schema) -> Self {
        Self::new(schema, Vec::new())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&TripRecord> {
        self.records.get(row)
    }

    /// A single cell. `None` if the row is out of range; columns outside the schema are an
    /// error.
    pub fn value(&self, row: usize, column: Column) -> Result<Option<Value>, TripError> {
        self.require(column, TripError::InvalidColumn)?;
        Ok(self.records.get(row).map(|r| r.value(column)))
    }

    /// Every value of one column in row order. Callers are responsible for checking the
    /// schema first.
    pub fn values(&self, column: Column) -> impl Iterator<Item = Value> + '_ {
        self.records.iter().map(move |r| r.value(column))
    }

    /// Rows matching `predicate`, in their original order.
    pub fn select<F>(&self, predicate: F) -> TripTable
    where
        F: Fn(&TripRecord) -> bool,
    {
        let records = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        TripTable::new(self.schema.clone(), records)
    }

    /// Rows in `range` (clamped to the table) reduced to `columns`, in the order given.
    pub fn project(&self, range: Range<usize>, columns: &[Column]) -> Result<RowBatch, TripError> {
        for column in columns {
            self.require(*column, TripError::InvalidColumn)?;
        }
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let rows = self.records[start..end]
            .iter()
            .map(|r| columns.iter().map(|c| r.value(*c)).collect())
            .collect();
        Ok(RowBatch {
            columns: columns.to_vec(),
            rows,
        })
    }

    pub(crate) fn require<F>(&self, column: Column, err: F) -> Result<(), TripError>
    where
        F: FnOnce(String) -> TripError,
    {
        if self.schema.contains(column) {
            Ok(())
        } else {
            Err(err(column.name().to_string()))
        }
    }
}

/// Some consecutive rows of a table, each reduced to the same chosen columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as (column, value) pairs, for printing one field per line.
    pub fn labelled_rows(&self) -> impl Iterator<Item = Vec<(Column, &Value)>> + '_ {
        self.rows
            .iter()
            .map(|row| self.columns.iter().copied().zip(row.iter()).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("test timestamps are valid")
    }

    pub(crate) fn trip(start: NaiveDateTime, from: &str, to: &str) -> TripRecord {
        TripRecord::new(Trip {
            start_time: start,
            end_time: start + chrono::Duration::minutes(10),
            trip_duration: 600.0,
            start_station: from.to_string(),
            end_station: to.to_string(),
            user_type: Some("Subscriber".to_string()),
            gender: None,
            birth_year: None,
        })
    }

    #[test]
    fn test_derived_fields() {
        let record = trip(at(2017, 1, 15, 0, 0), "Canal St", "Clark St");
        assert_eq!(1, record.month());
        assert_eq!(6, record.weekday(), "2017-01-15 was a Sunday");
        assert_eq!(0, record.hour());
        assert_eq!("Canal St TO Clark St", record.route());

        let again = TripRecord::new(record.trip().clone());
        assert_eq!(record, again);
    }

    #[test]
    fn test_column_names_parse() {
        assert_eq!(Column::StartTime, "Start Time".parse::<Column>().unwrap());
        assert_eq!(Column::BirthYear, "birth_year".parse::<Column>().unwrap());
        assert_eq!(Column::Weekday, "Day".parse::<Column>().unwrap());
        assert_eq!(Column::Trip, "TRIP".parse::<Column>().unwrap());
        let err = "Bike Id".parse::<Column>().unwrap_err();
        assert!(matches!(err, TripError::UnknownColumn(ref n) if n == "Bike Id"));
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::from("A") < Value::from("B"));
        assert!(Value::Integer(2) < Value::Integer(10));
        assert!(Value::Missing < Value::Integer(-5));
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert!(Value::Number(1.5) < Value::Number(2.0));
    }

    #[test]
    fn test_schema_without_demographics() {
        let schema = Schema::with_optional(&[]);
        assert!(!schema.contains(Column::Gender));
        assert!(!schema.has_demographics());
        assert!(schema.contains(Column::Trip));
        assert_eq!(Column::REQUIRED.to_vec(), schema.source_columns());
        assert!(Schema::full().has_demographics());
    }

    #[test]
    fn test_select_keeps_order() {
        let table = TripTable::new(
            Schema::full(),
            vec![
                trip(at(2017, 1, 2, 8, 0), "A", "B"),
                trip(at(2017, 2, 6, 9, 0), "B", "C"),
                trip(at(2017, 1, 3, 10, 0), "C", "D"),
            ],
        );
        let january = table.select(|r| r.month() == 1);
        assert_eq!(2, january.len());
        assert_eq!("A", january.records()[0].trip().start_station);
        assert_eq!("C", january.records()[1].trip().start_station);
        assert_eq!(3, table.len(), "selection leaves the source table alone");
    }

    #[test]
    fn test_project_clamps_and_checks_columns() {
        let table = TripTable::new(
            Schema::with_optional(&[]),
            vec![
                trip(at(2017, 1, 2, 8, 0), "A", "B"),
                trip(at(2017, 1, 3, 8, 0), "B", "C"),
            ],
        );
        let batch = table
            .project(1..10, &[Column::Trip, Column::Hour])
            .expect("columns are in the schema");
        assert_eq!(1, batch.len());
        assert_eq!(vec![Value::from("B TO C"), Value::Integer(8)], batch.rows[0]);

        let err = table.project(0..1, &[Column::Gender]).unwrap_err();
        assert!(matches!(err, TripError::InvalidColumn(ref n) if n == "Gender"));

        assert!(table.project(5..7, &[Column::Trip]).unwrap().is_empty());
    }

    #[test]
    fn test_single_cell_access() {
        let table = TripTable::new(Schema::full(), vec![trip(at(2017, 3, 1, 7, 0), "A", "B")]);
        assert_eq!(
            Some(Value::Integer(3)),
            table.value(0, Column::Month).unwrap()
        );
        assert_eq!(None, table.value(1, Column::Month).unwrap());
        assert_eq!(
            Some(Value::Missing),
            table.value(0, Column::Gender).unwrap()
        );
    }
}
