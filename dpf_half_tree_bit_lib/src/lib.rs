//! Two-party distributed point functions over the half-tree construction.
//!
//! [`bit`] holds the bit-output DPF used for classic XOR-based PIR: each leaf
//! carries 128 output bits, so the tree is seven levels shorter than the
//! domain. [`field`] holds a GF(2^128)-valued DPF with one leaf per domain
//! point, used to build secret-shared row weights for field-weighted PIR.
pub mod bit;
pub mod field;
pub mod prg;
mod tree;

pub use bit::{BitDpfKey, dpf_bit_eval, dpf_bit_eval_full, dpf_bit_gen};
pub use field::{FieldDpfKey, dpf_field_eval, dpf_field_eval_full, dpf_field_gen};
pub use prg::PrgContext;
pub use tree::LastLevelCw;

pub const AES_BLOCK_SIZE: usize = 16;
pub const AES_BLOCK_BIT_SIZE: usize = AES_BLOCK_SIZE * 8;
pub const AES_BLOCK_BIT_LOG2: usize = AES_BLOCK_BIT_SIZE.ilog2() as usize;
pub(crate) const AES_BLOCK_BIT_MASK: u32 = (AES_BLOCK_BIT_SIZE - 1) as u32;

/// Largest supported domain, `2^32` points.
pub const MAX_LOGN: usize = 32;

/// A 128-bit seed `(s || t)`; the control bit `t` is the LSB of the last byte.
pub type Block = [u8; AES_BLOCK_SIZE];

/// Which of the two servers a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Zero,
    One,
}

impl Party {
    pub fn index(self) -> usize {
        match self {
            Party::Zero => 0,
            Party::One => 1,
        }
    }
}

#[inline(always)]
pub(crate) fn assert_index_in_domain(x: u32, logn: usize) {
    assert!(logn <= MAX_LOGN, "logn {logn} exceeds {MAX_LOGN}");
    assert!(
        (x as u64) < (1u64 << logn),
        "index {x} outside domain of size 2^{logn}"
    );
}
