//! XOR folding for classic DPF-based PIR.
//!
//! Selection vectors are packed little-endian within each byte: row `r` is
//! selected when bit `r % 8` of byte `r / 8` is set. All folds XOR into `out`
//! without clearing it first.
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::partition::{build_pool, partition_rows_aligned};

#[inline(always)]
pub fn xor_into(out: &mut [u8], other: &[u8]) {
    debug_assert_eq!(out.len(), other.len());
    for (o, x) in out.iter_mut().zip(other) {
        *o ^= *x;
    }
}

#[inline(always)]
pub fn is_selected(selection: &[u8], i: usize) -> bool {
    (selection[i / 8] >> (i % 8)) & 1 == 1
}

/// XORs every selected row of `db` into `out`.
///
/// Panics if `out` is not one row wide or `selection` has fewer bits than
/// `db` has rows.
pub fn xor_fold(selection: &[u8], db: &Database<'_>, out: &mut [u8]) {
    assert_eq!(out.len(), db.row_len(), "output must be exactly one row");
    assert!(
        selection.len() * 8 >= db.rows(),
        "selection covers {} rows, database has {}",
        selection.len() * 8,
        db.rows()
    );

    let rows = db.rows();
    for (byte_idx, &byte) in selection[..rows.div_ceil(8)].iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for j in 0..8 {
            let row = 8 * byte_idx + j;
            if row >= rows {
                break;
            }
            if (byte >> j) & 1 == 1 {
                xor_into(out, db.row(row));
            }
        }
    }
}

/// [`xor_fold`] over byte-aligned row chunks on `n_threads` workers.
///
/// Each worker folds its chunk into a private partial row; the partials are
/// combined once every worker has joined.
pub fn xor_fold_parallel(
    selection: &[u8],
    db: &Database<'_>,
    out: &mut [u8],
    n_threads: usize,
) -> Result<()> {
    assert_eq!(out.len(), db.row_len(), "output must be exactly one row");
    assert!(selection.len() * 8 >= db.rows());

    let pool = build_pool(n_threads)?;
    let ranges = partition_rows_aligned(db.rows(), n_threads, 8);
    debug!(n_threads, rows = db.rows(), row_len = db.row_len(), "parallel xor fold");

    let mut partials = vec![vec![0u8; db.row_len()]; ranges.len()];
    pool.scope(|s| {
        for (range, partial) in ranges.iter().zip(partials.iter_mut()) {
            if range.is_empty() {
                continue;
            }
            let chunk_selection = &selection[range.start / 8..range.end.div_ceil(8)];
            let chunk = db.slice_rows(range.clone());
            s.spawn(move |_| xor_fold(chunk_selection, &chunk, partial));
        }
    });

    for partial in &partials {
        xor_into(out, partial);
    }
    Ok(())
}

/// Folds a rebalanced (square-ish) database.
///
/// Every database row is split into `row_len / block_len` blocks and the
/// selection picks block columns. `out` receives one folded block per
/// database row.
pub fn xor_fold_rebalanced(selection: &[u8], db: &Database<'_>, block_len: usize, out: &mut [u8]) {
    assert!(block_len > 0 && db.row_len() % block_len == 0, "row is not a whole number of blocks");
    let columns = db.row_len() / block_len;
    assert!(selection.len() * 8 >= columns);
    assert_eq!(out.len(), db.rows() * block_len, "output must hold one block per row");

    for (r, out_block) in out.chunks_exact_mut(block_len).enumerate() {
        let row = db.row(r);
        for (c, block) in row.chunks_exact(block_len).enumerate() {
            if is_selected(selection, c) {
                xor_into(out_block, block);
            }
        }
    }
}
