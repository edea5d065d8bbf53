use rand::{CryptoRng, RngCore};

use crate::prg::{PrgContext, control_bit, xor_bytes};
use crate::tree::{LastLevelCw, assert_shape, expand_leaves, gen_tree, walk_path};
use crate::{AES_BLOCK_BIT_LOG2, AES_BLOCK_BIT_MASK, AES_BLOCK_SIZE, Block, Party, assert_index_in_domain};

/// Domain bits resolved inside a single 128-bit leaf block.
pub const LEAF_BITS: usize = AES_BLOCK_BIT_LOG2;

/// A bit-output DPF key share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitDpfKey {
    pub party: Party,
    pub logn: usize,
    pub seed: Block,                   // (s_0 || t_0)
    pub cw_levels: Vec<Block>,         // regular levels, depth - 1 of them
    pub cw_last: Option<LastLevelCw>,  // absent when the root is already a leaf
    pub cw_leaf: Block,                // CW_{n+1}
}

impl BitDpfKey {
    pub fn tree_depth(&self) -> usize {
        tree_depth(self.logn)
    }

    pub fn domain_size(&self) -> usize {
        1 << self.logn
    }
}

/// Tree levels needed for a `2^logn` domain once the last seven bits live in the leaf.
pub fn tree_depth(logn: usize) -> usize {
    logn.saturating_sub(LEAF_BITS)
}

/// Generates the two key shares of the point function that is 1 at `alpha`.
///
/// Panics when `alpha >= 2^logn`.
pub fn dpf_bit_gen<R: RngCore + CryptoRng + ?Sized>(
    alpha: u32,
    logn: usize,
    prg: &PrgContext,
    rng: &mut R,
) -> (BitDpfKey, BitDpfKey) {
    assert_index_in_domain(alpha, logn);
    let depth = tree_depth(logn);
    let shares = gen_tree(alpha >> LEAF_BITS, depth, prg, rng);

    let mut h0 = [0u8; AES_BLOCK_SIZE];
    let mut h1 = [0u8; AES_BLOCK_SIZE];
    prg.hs_final(&shares.leaves[0], &mut h0);
    prg.hs_final(&shares.leaves[1], &mut h1);

    // CW_{n+1} = H(s_n^0) ⊕ H(s_n^1) ⊕ e_α
    let mut cw_leaf = h0;
    xor_bytes(&mut cw_leaf, &h1);
    let bit = (alpha & AES_BLOCK_BIT_MASK) as usize;
    cw_leaf[bit / 8] ^= 1 << (bit % 8);

    let [seed0, seed1] = shares.roots;
    (
        BitDpfKey {
            party: Party::Zero,
            logn,
            seed: seed0,
            cw_levels: shares.cw_levels.clone(),
            cw_last: shares.cw_last.clone(),
            cw_leaf,
        },
        BitDpfKey {
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
fn leaf_block(key: &BitDpfKey, leaf: &Block, prg: &PrgContext) -> Block {
    let mut out = [0u8; AES_BLOCK_SIZE];
    prg.hs_final(leaf, &mut out);
    if control_bit(leaf) == 1 {
        xor_bytes(&mut out, &key.cw_leaf);
    }
    out
}

/// Evaluates one key share at a single point.
pub fn dpf_bit_eval(key: &BitDpfKey, x: u32, prg: &PrgContext) -> u8 {
    assert_index_in_domain(x, key.logn);
    let depth = key.tree_depth();
    assert_shape(depth, &key.cw_levels, key.cw_last.as_ref());

    let leaf = walk_path(&key.seed, &key.cw_levels, key.cw_last.as_ref(), x >> LEAF_BITS, depth, prg);
    let block = leaf_block(key, &leaf, prg);
    let bit = (x & AES_BLOCK_BIT_MASK) as usize;
    (block[bit / 8] >> (bit % 8)) & 1
}

/// Expands one key share over the whole domain.
///
/// Returns `ceil(2^logn / 8)` bytes; domain point `i` is bit `i % 8` of byte
/// `i / 8`. Panics when `logn` does not match the key.
pub fn dpf_bit_eval_full(key: &BitDpfKey, logn: usize, prg: &PrgContext) -> Vec<u8> {
    assert_eq!(key.logn, logn, "key was generated for logn {}, evaluated with {logn}", key.logn);
    assert_shape(key.tree_depth(), &key.cw_levels, key.cw_last.as_ref());

    let total_bits = 1usize << logn;
    let mut result = vec![0u8; total_bits.div_ceil(8)];
    let leaves = expand_leaves(&key.seed, &key.cw_levels, key.cw_last.as_ref(), prg);

    for (chunk, leaf) in result.chunks_mut(AES_BLOCK_SIZE).zip(&leaves) {
        let block = leaf_block(key, leaf, prg);
        chunk.copy_from_slice(&block[..chunk.len()]);
    }
    if total_bits < 8 {
        result[0] &= (1u8 << total_bits) - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn setup(seed: u64) -> (PrgContext, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        (PrgContext::random(&mut rng), rng)
    }

    fn xor_outputs(a: &[u8], b: &[u8]) -> Vec<u8> {
        a.iter().zip(b).map(|(x, y)| x ^ y).collect()
    }

    fn assert_unit_vector(v: &[u8], alpha: u32, logn: usize) {
        for i in 0..(1usize << logn) {
            let bit = (v[i / 8] >> (i % 8)) & 1;
            let expected = (i == alpha as usize) as u8;
            assert_eq!(bit, expected, "logn {logn} alpha {alpha} point {i}");
        }
    }

    #[test]
    fn full_domain_shares_xor_to_unit_vector_exhaustive() {
        let (prg, mut rng) = setup(21);
        for logn in 0..=9usize {
            for alpha in 0..(1u32 << logn) {
                let (k0, k1) = dpf_bit_gen(alpha, logn, &prg, &mut rng);
                let e0 = dpf_bit_eval_full(&k0, logn, &prg);
                let e1 = dpf_bit_eval_full(&k1, logn, &prg);
                assert_eq!(e0.len(), (1usize << logn).div_ceil(8));
                assert_unit_vector(&xor_outputs(&e0, &e1), alpha, logn);
            }
        }
    }

    #[test]
    fn full_domain_shares_xor_to_unit_vector_large_domains() {
        let (prg, mut rng) = setup(22);
        for logn in 10..=16usize {
            let max = (1u32 << logn) - 1;
            for alpha in [0, 1, 127, 128, max / 2, max - 128, max, rng.random_range(0..=max)] {
                let (k0, k1) = dpf_bit_gen(alpha, logn, &prg, &mut rng);
                let e0 = dpf_bit_eval_full(&k0, logn, &prg);
                let e1 = dpf_bit_eval_full(&k1, logn, &prg);
                assert_unit_vector(&xor_outputs(&e0, &e1), alpha, logn);
            }
        }
    }

    #[test]
    fn eval_full_is_deterministic() {
        let (prg, mut rng) = setup(23);
        let (k0, _) = dpf_bit_gen(777, 12, &prg, &mut rng);
        assert_eq!(dpf_bit_eval_full(&k0, 12, &prg), dpf_bit_eval_full(&k0, 12, &prg));
    }

    #[test]
    fn point_eval_matches_full_domain() {
        let (prg, mut rng) = setup(24);
        for logn in [0usize, 3, 7, 8, 11] {
            let alpha = rng.random_range(0..(1u32 << logn));
            let (k0, k1) = dpf_bit_gen(alpha, logn, &prg, &mut rng);
            for key in [&k0, &k1] {
                let full = dpf_bit_eval_full(key, logn, &prg);
                for x in 0..(1u32 << logn) {
                    let expected = (full[x as usize / 8] >> (x % 8)) & 1;
                    assert_eq!(dpf_bit_eval(key, x, &prg), expected);
                }
            }
        }
    }

    #[test]
    fn keys_have_matching_shape_and_party_tags() {
        let (prg, mut rng) = setup(25);
        let (k0, k1) = dpf_bit_gen(5000, 14, &prg, &mut rng);
        assert_eq!(k0.party, Party::Zero);
        assert_eq!(k1.party, Party::One);
        assert_eq!(k0.cw_levels.len(), 6);
        assert_eq!(k0.cw_levels, k1.cw_levels);
        assert_eq!(k0.cw_leaf, k1.cw_leaf);
        assert_ne!(k0.seed, k1.seed);
    }

    #[test]
    fn eight_point_domain_selects_index_five() {
        let (prg, mut rng) = setup(26);
        let (k0, k1) = dpf_bit_gen(5, 3, &prg, &mut rng);
        let e0 = dpf_bit_eval_full(&k0, 3, &prg);
        let e1 = dpf_bit_eval_full(&k1, 3, &prg);
        assert_eq!(xor_outputs(&e0, &e1), vec![0b0010_0000]);
    }

    #[test]
    #[should_panic(expected = "outside domain")]
    fn gen_rejects_out_of_domain_index() {
        let (prg, mut rng) = setup(27);
        dpf_bit_gen(8, 3, &prg, &mut rng);
    }

    #[test]
    #[should_panic(expected = "evaluated with")]
    fn eval_full_rejects_mismatched_logn() {
        let (prg, mut rng) = setup(28);
        let (k0, _) = dpf_bit_gen(1, 9, &prg, &mut rng);
        dpf_bit_eval_full(&k0, 10, &prg);
    }
}
