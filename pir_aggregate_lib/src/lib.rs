//! Server-side row aggregation for DPF-based PIR.
//!
//! Three ways of turning a selection into an answer row:
//! XOR folding ([`xor_fold`]), field-weighted folding ([`gcm_fold`]) and
//! matrix products ([`multiply`], [`binary_multiply`]). Each has a
//! sequential kernel and a `*_parallel` variant that splits the work into
//! contiguous row partitions on a dedicated rayon pool.
pub mod db;
pub mod error;
pub mod gcm;
pub mod matrix;
pub mod partition;
pub mod xor;

pub use db::Database;
pub use error::{AggregateError, Result};
pub use gcm::{gcm_fold, gcm_fold_parallel, gcm_into, weights_from_selection};
pub use matrix::{
    binary_multiply, binary_multiply_parallel, binary_multiply_rows, multiply, multiply_parallel, multiply_rows,
    MatrixMut, MatrixRef, MatrixWord,
};
pub use partition::{partition_rows, partition_rows_aligned};
pub use xor::{xor_fold, xor_fold_parallel, xor_fold_rebalanced, xor_into};
