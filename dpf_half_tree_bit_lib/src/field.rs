//! A DPF whose output group is GF(2^128).
//!
//! Unlike the bit DPF there is no early termination: every domain point has
//! its own leaf, converted into a field element with AES-CTR. The two shares
//! add (XOR) up to `beta` at `alpha` and to zero everywhere else.
use gf128_lib::Gf128;
use rand::{CryptoRng, RngCore};

use crate::prg::{PrgContext, control_bit};
use crate::tree::{LastLevelCw, assert_shape, expand_leaves, gen_tree, walk_path};
use crate::{Block, Party, assert_index_in_domain};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDpfKey {
    pub party: Party,
    pub logn: usize,
    pub seed: Block,
    pub cw_levels: Vec<Block>,
    pub cw_last: Option<LastLevelCw>,
    pub cw_leaf: Gf128,
}

impl FieldDpfKey {
    pub fn domain_size(&self) -> usize {
        1 << self.logn
    }
}

pub fn dpf_field_gen<R: RngCore + CryptoRng + ?Sized>(
    alpha: u32,
    beta: Gf128,
    logn: usize,
    prg: &PrgContext,
    rng: &mut R,
) -> (FieldDpfKey, FieldDpfKey) {
    assert_index_in_domain(alpha, logn);
    let shares = gen_tree(alpha, logn, prg, rng);
    debug_assert_eq!(control_bit(&shares.leaves[0]) ^ control_bit(&shares.leaves[1]), 1);

    // y_b = Convert(s_b) ⊕ t_b * CW, and exactly one t_b is set on the path
    let cw_leaf = beta + prg.convert_field(&shares.leaves[0]) + prg.convert_field(&shares.leaves[1]);

    let [seed0, seed1] = shares.roots;
    (
        FieldDpfKey {
            party: Party::Zero,
            logn,
            seed: seed0,
            cw_levels: shares.cw_levels.clone(),
            cw_last: shares.cw_last.clone(),
            cw_leaf,
        },
        FieldDpfKey {
            party: Party::One,
            logn,
            seed: seed1,
            cw_levels: shares.cw_levels,
            cw_last: shares.cw_last,
            cw_leaf,
        },
    )
}

#[inline(always)]
fn leaf_value(key: &FieldDpfKey, leaf: &Block, prg: &PrgContext) -> Gf128 {
    let mut out = prg.convert_field(leaf);
    if control_bit(leaf) == 1 {
        out += key.cw_leaf;
    }
    out
}

pub fn dpf_field_eval(key: &FieldDpfKey, x: u32, prg: &PrgContext) -> Gf128 {
    assert_index_in_domain(x, key.logn);
    assert_shape(key.logn, &key.cw_levels, key.cw_last.as_ref());
    let leaf = walk_path(&key.seed, &key.cw_levels, key.cw_last.as_ref(), x, key.logn, prg);
    leaf_value(key, &leaf, prg)
}

/// One field share per domain point, in index order.
pub fn dpf_field_eval_full(key: &FieldDpfKey, logn: usize, prg: &PrgContext) -> Vec<Gf128> {
    assert_eq!(key.logn, logn, "key was generated for logn {}, evaluated with {logn}", key.logn);
    assert_shape(logn, &key.cw_levels, key.cw_last.as_ref());
    expand_leaves(&key.seed, &key.cw_levels, key.cw_last.as_ref(), prg)
        .iter()
        .map(|leaf| leaf_value(key, leaf, prg))
        .collect()
}
