use std::ops::Range;

use crate::error::{AggregateError, Result};

/// Borrowed row-major view over a flat database buffer.
#[derive(Debug, Clone, Copy)]
pub struct Database<'a> {
    data: &'a [u8],
    rows: usize,
    row_len: usize,
}

impl<'a> Database<'a> {
    /// Views `data` as consecutive `row_len`-byte rows.
    pub fn new(data: &'a [u8], row_len: usize) -> Result<Self> {
        if row_len == 0 {
            return Err(AggregateError::EmptyRow);
        }
        if data.len() % row_len != 0 {
            return Err(AggregateError::RaggedDatabase { len: data.len(), row_len });
        }
        Ok(Self { data, rows: data.len() / row_len, row_len })
    }

    /// Like [`Database::new`] but also pins the row count.
    pub fn with_rows(data: &'a [u8], rows: usize, row_len: usize) -> Result<Self> {
        let db = Self::new(data, row_len)?;
        if db.rows != rows {
            return Err(AggregateError::DatabaseShape { len: data.len(), rows, row_len });
        }
        Ok(db)
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &'a [u8] {
        debug_assert!(i < self.rows, "row {i} out of {}", self.rows);
        &self.data[i * self.row_len..(i + 1) * self.row_len]
    }

    /// Sub-view over rows `range.start..range.end`.
    pub fn slice_rows(&self, range: Range<usize>) -> Database<'a> {
        assert!(range.start <= range.end && range.end <= self.rows);
        Database {
            data: &self.data[range.start * self.row_len..range.end * self.row_len],
            rows: range.len(),
            row_len: self.row_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous_slices() {
        let data: Vec<u8> = (0..48).collect();
        let db = Database::new(&data, 16).unwrap();
        assert_eq!(db.rows(), 3);
        assert_eq!(db.row(1), &data[16..32]);
        let tail = db.slice_rows(1..3);
        assert_eq!(tail.rows(), 2);
        assert_eq!(tail.row(0), db.row(1));
    }

    #[test]
    fn malformed_buffers_are_rejected() {
        let data = vec![0u8; 40];
        assert!(matches!(Database::new(&data, 0), Err(AggregateError::EmptyRow)));
        assert!(matches!(Database::new(&data, 16), Err(AggregateError::RaggedDatabase { .. })));
        assert!(matches!(Database::with_rows(&data, 4, 8), Err(AggregateError::DatabaseShape { .. })));
        assert!(Database::with_rows(&data, 5, 8).is_ok());
    }
}
