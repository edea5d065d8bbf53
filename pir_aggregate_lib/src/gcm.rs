//! Field-weighted folding ("GCM-based PIR").
//!
//! Rows are read as sequences of 16-byte GF(2^128) elements. Each row is
//! scaled by its weight and the products are summed (XORed) block-wise into
//! the output, so `out = Σ_r weight[r] · row[r]`.
use gf128_lib::{Gf128, BLOCK_SIZE};

use crate::db::Database;
use crate::error::Result;
use crate::partition::run_partitioned;
use crate::xor::is_selected;

/// `out[block] += weight · row[block]` for every block of one row.
#[inline]
pub fn gcm_into(out: &mut [u8], weight: Gf128, row: &[u8]) {
    debug_assert_eq!(out.len(), row.len());
    debug_assert_eq!(row.len() % BLOCK_SIZE, 0);
    for (o, r) in out.chunks_exact_mut(BLOCK_SIZE).zip(row.chunks_exact(BLOCK_SIZE)) {
        let acc = Gf128::from_slice(o) + weight * Gf128::from_slice(r);
        o.copy_from_slice(&acc.to_le_bytes());
    }
}

fn check_gcm_shapes(weights: &[Gf128], db: &Database<'_>, out: &[u8]) {
    assert_eq!(db.row_len() % BLOCK_SIZE, 0, "row length must be a multiple of {BLOCK_SIZE}");
    assert_eq!(weights.len(), db.rows(), "one weight per database row");
    assert_eq!(out.len(), db.row_len(), "output must be exactly one row");
}

/// Multiply-accumulates every row by its weight into `out`.
///
/// Rows whose weight is zero contribute nothing and are skipped.
pub fn gcm_fold(weights: &[Gf128], db: &Database<'_>, out: &mut [u8]) {
    check_gcm_shapes(weights, db, out);
    for (r, &weight) in weights.iter().enumerate() {
        if weight.is_zero() {
            continue;
        }
        gcm_into(out, weight, db.row(r));
    }
}

/// [`gcm_fold`] with the output row split into block ranges, one per worker.
///
/// Every worker walks all database rows but only touches its own blocks, so
/// no partial results need combining.
pub fn gcm_fold_parallel(
    weights: &[Gf128],
    db: &Database<'_>,
    out: &mut [u8],
    n_threads: usize,
) -> Result<()> {
    check_gcm_shapes(weights, db, out);
    let blocks = db.row_len() / BLOCK_SIZE;
    run_partitioned(n_threads, blocks, BLOCK_SIZE, out, |range, out_blocks| {
        let bytes = range.start * BLOCK_SIZE..range.end * BLOCK_SIZE;
        for (r, &weight) in weights.iter().enumerate() {
            if weight.is_zero() {
                continue;
            }
            gcm_into(out_blocks, weight, &db.row(r)[bytes.clone()]);
        }
    })
}

/// Indicator weights: `ONE` for selected rows, `ZERO` elsewhere.
pub fn weights_from_selection(selection: &[u8], rows: usize) -> Vec<Gf128> {
    assert!(selection.len() * 8 >= rows);
    (0..rows)
        .map(|r| if is_selected(selection, r) { Gf128::ONE } else { Gf128::ZERO })
        .collect()
}
