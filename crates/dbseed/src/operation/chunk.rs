//! Chunk planning: split a table's rows into bounded, contiguous batches.

use std::ops::Range;

/// A contiguous run of row indices `[start, start + len)` loaded by one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First row index.
    pub start: usize,
    /// Number of rows actually available in this chunk.
    pub len: usize,
}

impl Chunk {
    /// One past the last row index.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Row indices covered by this chunk.
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Yields the chunks of a table in ascending row order.
///
/// Each chunk holds `max_chunk_size` rows except possibly the last, which holds
/// whatever remains. A table with no rows yields nothing.
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    row_count: usize,
    max_chunk_size: usize,
    next_row: usize,
}

impl ChunkPlanner {
    /// Plan chunks for `row_count` rows. A `max_chunk_size` of 0 is treated as 1.
    pub fn new(row_count: usize, max_chunk_size: usize) -> Self {
        Self {
            row_count,
            max_chunk_size: max_chunk_size.max(1),
            next_row: 0,
        }
    }

    /// Rows not yet handed out.
    pub fn remaining(&self) -> usize {
        self.row_count - self.next_row
    }
}

impl Iterator for ChunkPlanner {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let available = self.remaining().min(self.max_chunk_size);
        if available == 0 {
            return None;
        }
        let chunk = Chunk {
            start: self.next_row,
            len: available,
        };
        self.next_row += available;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining().div_ceil(self.max_chunk_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlanner {}

/// All chunks for `row_count` rows.
pub fn plan(row_count: usize, max_chunk_size: usize) -> Vec<Chunk> {
    ChunkPlanner::new(row_count, max_chunk_size).collect()
}

/// Lower the chunk ceiling so one statement stays within the dialect's
/// bind-parameter limit. Never raises it and never returns 0.
///
/// Returns `None` when a single row already needs more parameters than the
/// limit allows.
pub fn effective_chunk_size(
    max_chunk_size: usize,
    column_count: usize,
    max_parameters: Option<usize>,
) -> Option<usize> {
    let max_chunk_size = max_chunk_size.max(1);
    match max_parameters {
        Some(limit) if column_count > limit => None,
        Some(limit) if column_count > 0 => Some(max_chunk_size.min(limit / column_count)),
        _ => Some(max_chunk_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(row_count: usize, max: usize) -> Vec<usize> {
        plan(row_count, max).iter().map(|c| c.len).collect()
    }

    #[test]
    fn test_full_chunks_plus_remainder() {
        assert_eq!(sizes(250, 100), [100, 100, 50]);
    }

    #[test]
    fn test_exact_multiple_has_no_partial_chunk() {
        assert_eq!(sizes(200, 100), [100, 100]);
    }

    #[test]
    fn test_fewer_rows_than_chunk() {
        assert_eq!(sizes(5, 100), [5]);
    }

    #[test]
    fn test_zero_rows_yields_no_chunks() {
        assert!(plan(0, 100).is_empty());
    }

    #[test]
    fn test_chunks_partition_rows() {
        for row_count in 0..60 {
            for max in 1..12 {
                let chunks = plan(row_count, max);
                let mut expected_start = 0;
                for (i, chunk) in chunks.iter().enumerate() {
                    assert_eq!(chunk.start, expected_start);
                    assert!(chunk.len >= 1 && chunk.len <= max);
                    if i + 1 < chunks.len() {
                        assert_eq!(chunk.len, max, "only the last chunk may be short");
                    }
                    expected_start = chunk.end();
                }
                assert_eq!(expected_start, row_count);
                assert_eq!(chunks.len(), ChunkPlanner::new(row_count, max).len());
            }
        }
    }

    #[test]
    fn test_rows_range() {
        let chunks = plan(7, 3);
        assert_eq!(chunks[2].rows(), 6..7);
        assert_eq!(chunks[1].rows().collect::<Vec<_>>(), [3, 4, 5]);
    }

    #[test]
    fn test_zero_max_treated_as_one() {
        assert_eq!(sizes(3, 0), [1, 1, 1]);
    }

    #[test]
    fn test_effective_chunk_size() {
        // SQL Server: 2098 bind parameters / 30 columns = 69 rows
        assert_eq!(effective_chunk_size(100, 30, Some(2098)), Some(69));
        assert_eq!(effective_chunk_size(100, 3, Some(2098)), Some(100));
        assert_eq!(effective_chunk_size(100, 3, None), Some(100));
        assert_eq!(effective_chunk_size(100, 0, Some(2098)), Some(100));
    }

    #[test]
    fn test_effective_chunk_size_at_parameter_boundary() {
        // 21 columns * 100 rows would need 2100 parameters
        assert_eq!(effective_chunk_size(100, 21, Some(2098)), Some(99));
        assert_eq!(effective_chunk_size(100, 2098, Some(2098)), Some(1));
        assert_eq!(effective_chunk_size(100, 2099, Some(2098)), None);
        assert_eq!(effective_chunk_size(100, 5000, Some(2098)), None);
    }
}
