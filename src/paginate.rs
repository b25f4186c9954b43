//! Page through a table's rows a fixed number at a time.
//!
//! [batches] validates its arguments up front and hands back a [Batches] cursor. The cursor
//! only remembers the next row offset; each call to `next` projects one more [RowBatch] out of
//! the already loaded table. Calling [batches] again starts over from the first row.

use crate::error::TripError;
use crate::trip_table::{Column, RowBatch, TripTable};
use std::iter::FusedIterator;

/// A pull-based cursor over consecutive row batches.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    table: &'a TripTable,
    columns: Vec<Column>,
    batch_size: usize,
    offset: usize,
}

impl<'a> Batches<'a> {
    /// Index of the first row the next batch will contain.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = RowBatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.table.len() {
            return None;
        }
        let end = (self.offset + self.batch_size).min(self.table.len());
        let batch = self.table.project(self.offset..end, &self.columns).ok()?;
        self.offset = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_rows = self.table.len().saturating_sub(self.offset);
        let remaining = remaining_rows.div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

impl FusedIterator for Batches<'_> {}

/// Split `table` into batches of at most `batch_size` rows, each reduced to `columns` in the
/// given order.
pub fn batches<'a>(
    table: &'a TripTable,
    batch_size: usize,
    columns: &[Column],
) -> Result<Batches<'a>, TripError> {
    if batch_size == 0 {
        return Err(TripError::InvalidBatchSize(batch_size));
    }
    for column in columns {
        table.require(*column, TripError::InvalidColumn)?;
    }
    Ok(Batches {
        table,
        columns: columns.to_vec(),
        batch_size,
        offset: 0,
    })
}

/// Like [batches] but with column names, as typed by a user. Names that aren't columns at
/// all are reported the same way as columns missing from this table.
pub fn batches_by_name<'a, S: AsRef<str>>(
    table: &'a TripTable,
    batch_size: usize,
    names: &[S],
) -> Result<Batches<'a>, TripError> {
    let columns = names
        .iter()
        .map(|n| {
            n.as_ref()
                .parse::<Column>()
                .map_err(|_| TripError::InvalidColumn(n.as_ref().to_string()))
        })
        .collect::<Result<Vec<Column>, TripError>>()?;
    batches(table, batch_size, &columns)
}
