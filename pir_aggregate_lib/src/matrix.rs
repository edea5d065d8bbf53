//! Matrix kernels for linear (SimplePIR-style) answer computation.
//!
//! `out[i][j] += Σ_k A[i][k] · B[k][j]` over wrapping integer arithmetic, or
//! the indicator form where a 0/1 `mask` replaces `B`. The kernels only add
//! into `out`; callers zero it when they need a fresh product.
use std::ops::Range;

use crate::error::{AggregateError, Result};
use crate::partition::run_partitioned;

/// Element type the kernels can multiply-accumulate.
pub trait MatrixWord: Copy + Default + Send + Sync + 'static {
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
}

macro_rules! impl_matrix_word {
    ($($t:ty),*) => {
        $(
            impl MatrixWord for $t {
                #[inline(always)]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline(always)]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$t>::wrapping_mul(self, rhs)
                }
            }
        )*
    };
}

impl_matrix_word!(u32, u64, u128);

/// Read-only row-major matrix view.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> MatrixRef<'a, T> {
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(AggregateError::MatrixShape { rows, cols, len: data.len() });
        }
        Ok(Self { data, rows, cols })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &'a [T] {
        debug_assert!(i < self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

/// Mutable row-major matrix view, used for outputs.
#[derive(Debug)]
pub struct MatrixMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> MatrixMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(AggregateError::MatrixShape { rows, cols, len: data.len() });
        }
        Ok(Self { data, rows, cols })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }

    pub fn as_slice(&self) -> &[T] {
        self.data
    }
}

fn check_product_shape<L, R, T>(a: &MatrixRef<'_, L>, b: &MatrixRef<'_, R>, out: &MatrixMut<'_, T>) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(AggregateError::InnerDimension { left_cols: a.cols(), right_rows: b.rows() });
    }
    if out.rows() != a.rows() || out.cols() != b.cols() {
        return Err(AggregateError::OutputShape {
            got_rows: out.rows(),
            got_cols: out.cols(),
            rows: a.rows(),
            cols: b.cols(),
        });
    }
    Ok(())
}

/// Full product restricted to rows `rows` of `A`; `out` holds exactly those output rows.
pub fn multiply_rows<T: MatrixWord>(a: MatrixRef<'_, T>, b: MatrixRef<'_, T>, rows: Range<usize>, out: &mut [T]) {
    debug_assert_eq!(a.cols(), b.rows());
    debug_assert!(rows.end <= a.rows());
    debug_assert_eq!(out.len(), rows.len() * b.cols());
    let b_cols = b.cols();
    if b_cols == 0 {
        return;
    }

    for (i, out_row) in rows.zip(out.chunks_exact_mut(b_cols)) {
        for (k, &a_ik) in a.row(i).iter().enumerate() {
            for (o, &b_kj) in out_row.iter_mut().zip(b.row(k)) {
                *o = o.wrapping_add(a_ik.wrapping_mul(b_kj));
            }
        }
    }
}

/// Indicator product restricted to rows `rows` of `A`: column `j` of the
/// output sums the entries of `A` whose mask entry `mask[k][j]` is 1.
pub fn binary_multiply_rows<T: MatrixWord>(
    a: MatrixRef<'_, T>,
    mask: MatrixRef<'_, u8>,
    rows: Range<usize>,
    out: &mut [T],
) {
    debug_assert_eq!(a.cols(), mask.rows());
    debug_assert!(rows.end <= a.rows());
    debug_assert_eq!(out.len(), rows.len() * mask.cols());
    let b_cols = mask.cols();
    if b_cols == 0 {
        return;
    }

    for (i, out_row) in rows.zip(out.chunks_exact_mut(b_cols)) {
        for (k, &a_ik) in a.row(i).iter().enumerate() {
            for (o, &m) in out_row.iter_mut().zip(mask.row(k)) {
                if m == 1 {
                    *o = o.wrapping_add(a_ik);
                }
            }
        }
    }
}

pub fn multiply<T: MatrixWord>(a: MatrixRef<'_, T>, b: MatrixRef<'_, T>, out: &mut MatrixMut<'_, T>) {
    debug_assert!(check_product_shape(&a, &b, out).is_ok());
    multiply_rows(a, b, 0..a.rows(), out.as_mut_slice());
}

pub fn binary_multiply<T: MatrixWord>(a: MatrixRef<'_, T>, mask: MatrixRef<'_, u8>, out: &mut MatrixMut<'_, T>) {
    debug_assert!(check_product_shape(&a, &mask, out).is_ok());
    binary_multiply_rows(a, mask, 0..a.rows(), out.as_mut_slice());
}

/// [`multiply`] over `n_threads` disjoint row partitions.
pub fn multiply_parallel<T: MatrixWord>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    out: &mut MatrixMut<'_, T>,
    n_threads: usize,
) -> Result<()> {
    check_product_shape(&a, &b, out)?;
    let (rows, cols) = (out.rows(), out.cols());
    run_partitioned(n_threads, rows, cols, out.as_mut_slice(), |range, part| {
        multiply_rows(a, b, range, part)
    })
}

/// [`binary_multiply`] over `n_threads` disjoint row partitions.
pub fn binary_multiply_parallel<T: MatrixWord>(
    a: MatrixRef<'_, T>,
    mask: MatrixRef<'_, u8>,
    out: &mut MatrixMut<'_, T>,
    n_threads: usize,
) -> Result<()> {
    check_product_shape(&a, &mask, out)?;
    let (rows, cols) = (out.rows(), out.cols());
    run_partitioned(n_threads, rows, cols, out.as_mut_slice(), |range, part| {
        binary_multiply_rows(a, mask, range, part)
    })
}
