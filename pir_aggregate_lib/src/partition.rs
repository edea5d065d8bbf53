//! Row partitioning and the per-call worker pool.
//!
//! Every parallel entry point builds a pool of exactly `n_threads` workers,
//! hands each worker a disjoint `&mut` slice of the output, and joins them all
//! inside a rayon scope before returning.
use std::ops::Range;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{AggregateError, Result};

/// Splits `[0, rows)` into `n_threads` contiguous ranges of `rows / n_threads`
/// rows; the last range absorbs the remainder.
pub fn partition_rows(rows: usize, n_threads: usize) -> Vec<Range<usize>> {
    partition_rows_aligned(rows, n_threads, 1)
}

/// Like [`partition_rows`], but every range except the last starts and ends on
/// a multiple of `align`.
pub fn partition_rows_aligned(rows: usize, n_threads: usize, align: usize) -> Vec<Range<usize>> {
    assert!(n_threads > 0, "cannot partition over zero workers");
    assert!(align > 0);
    let per_worker = (rows / n_threads) / align * align;
    (0..n_threads)
        .map(|i| {
            let begin = i * per_worker;
            let end = if i == n_threads - 1 { rows } else { begin + per_worker };
            begin..end
        })
        .collect()
}

/// Cuts `out` into one exclusive slice per range; ranges must tile `[0, n)` in order.
pub(crate) fn split_rows_mut<'a, T>(
    mut out: &'a mut [T],
    ranges: &[Range<usize>],
    row_width: usize,
) -> Vec<&'a mut [T]> {
    let mut parts = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut out).split_at_mut(range.len() * row_width);
        parts.push(head);
        out = tail;
    }
    parts
}

pub(crate) fn build_pool(n_threads: usize) -> Result<ThreadPool> {
    if n_threads == 0 {
        return Err(AggregateError::NoThreads);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("pir-worker-{i}"))
        .build()?;
    Ok(pool)
}

/// Runs `kernel(range, out_rows)` for every row partition on a fresh pool.
///
/// `out` is `rows * row_width` elements; each call sees only the rows of its
/// own range. A panicking worker resurfaces here once the scope joins.
pub(crate) fn run_partitioned<T, F>(
    n_threads: usize,
    rows: usize,
    row_width: usize,
    out: &mut [T],
    kernel: F,
) -> Result<()>
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) + Sync,
{
    debug_assert_eq!(out.len(), rows * row_width);
    let pool = build_pool(n_threads)?;
    let ranges = partition_rows(rows, n_threads);
    debug!(n_threads, rows, per_worker = ranges[0].len(), "partitioned rows");

    let parts = split_rows_mut(out, &ranges, row_width);
    let kernel = &kernel;
    pool.scope(|s| {
        for (range, part) in ranges.into_iter().zip(parts) {
            if range.is_empty() {
                continue;
            }
            s.spawn(move |_| kernel(range, part));
        }
    });
    Ok(())
}
