//! Frequency and summary statistics over a [TripTable] column.
//!
//! Missing cells (blank `Gender`, blank `Birth Year` and so on) never count towards a mode or
//! a value count.

use crate::error::TripError;
use crate::trip_table::{Column, TripTable, Value};
use serde::Serialize;
use std::collections::BTreeMap;

fn counts(table: &TripTable, column: Column) -> Result<BTreeMap<Value, usize>, TripError> {
    if table.is_empty() {
        return Err(TripError::EmptyTable(column.name().to_string()));
    }
    table.require(column, TripError::UnknownColumn)?;
    let mut counts = BTreeMap::new();
    for value in table.values(column).filter(|v| !v.is_missing()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    Ok(counts)
}

/// The most frequent value in `column` and how many rows hold it. When several values tie,
/// the one that sorts first wins.
pub fn most_common(table: &TripTable, column: Column) -> Result<(Value, usize), TripError> {
    let counts = counts(table, column)?;
    // BTreeMap iterates in ascending order, so keeping only strictly larger counts leaves the
    // smallest of any tied values.
    let mut best: Option<(Value, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().map_or(true, |(_, best_count)| count > *best_count) {
            best = Some((value, count));
        }
    }
    best.ok_or_else(|| TripError::EmptyTable(column.name().to_string()))
}

/// Every distinct value with its count, most frequent first; ties in ascending value order.
pub fn value_counts(table: &TripTable, column: Column) -> Result<Vec<(Value, usize)>, TripError> {
    let mut counted = counts(table, column)?.into_iter().collect::<Vec<_>>();
    // stable sort keeps the ascending value order inside equal counts
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counted)
}

/// Smallest and largest value in `column`.
pub fn value_range(table: &TripTable, column: Column) -> Result<(Value, Value), TripError> {
    let counts = counts(table, column)?;
    let min = counts.keys().next().cloned();
    let max = counts.keys().next_back().cloned();
    match (min, max) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(TripError::EmptyTable(column.name().to_string())),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DurationSummary {
    pub total: f64,
    pub count: usize,
    pub mean: f64,
}

pub fn duration_summary(table: &TripTable) -> Result<DurationSummary, TripError> {
    if table.is_empty() {
        return Err(TripError::EmptyTable(
            Column::TripDuration.name().to_string(),
        ));
    }
    let total = table
        .records()
        .iter()
        .map(|r| r.trip().trip_duration)
        .sum::<f64>();
    let count = table.len();
    Ok(DurationSummary {
        total,
        count,
        mean: total / count as f64,
    })
}
