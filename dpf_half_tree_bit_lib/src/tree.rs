//! The half-tree shared by the bit-output and field-output DPFs.
//!
//! Along the programmed path the two parties' seeds differ by exactly Δ (so
//! their control bits differ); off the path they are equal. Regular levels use
//! one 128-bit correction word; the last level uses `(HCW, LCW⁰, LCW¹)` so
//! that the leaf control bits come out independent of Δ.
use rand::{CryptoRng, RngCore};

use crate::prg::{PrgContext, control_bit, get_bit, sample_delta, share_delta, xor_bytes};
use crate::{AES_BLOCK_SIZE, Block};

/// Correction word of the last tree level: CW_n = (HCW, LCW⁰, LCW¹).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LastLevelCw {
    pub hcw: [u8; AES_BLOCK_SIZE - 1],
    pub lcw0: u8,
    pub lcw1: u8,
}

impl LastLevelCw {
    /// `HCW || LCW^x` as a full block, ready to be XORed into a hash output.
    #[inline(always)]
    fn as_block(&self, x_bit: u8) -> Block {
        let mut block = [0u8; AES_BLOCK_SIZE];
        block[..AES_BLOCK_SIZE - 1].copy_from_slice(&self.hcw);
        block[AES_BLOCK_SIZE - 1] = if x_bit == 0 { self.lcw0 } else { self.lcw1 };
        block
    }
}

/// Everything the dealer derives while programming one path.
pub(crate) struct TreeShares {
    pub roots: [Block; 2],
    pub cw_levels: Vec<Block>,
    pub cw_last: Option<LastLevelCw>,
    /// Normalised `(s || t)` leaf seeds of both parties at the programmed leaf.
    pub leaves: [Block; 2],
}

/// Keeps only the control bit in the last byte of a leaf seed.
#[inline(always)]
fn normalize(seed: &mut Block) {
    seed[AES_BLOCK_SIZE - 1] &= 1;
}

/// Checks that a key's correction words match a tree of `depth` levels.
pub(crate) fn assert_shape(depth: usize, cw_levels: &[Block], cw_last: Option<&LastLevelCw>) {
    assert_eq!(
        cw_levels.len(),
        depth.saturating_sub(1),
        "key carries {} level correction words, tree depth is {}",
        cw_levels.len(),
        depth
    );
    assert_eq!(
        cw_last.is_some(),
        depth > 0,
        "last-level correction word presence does not match tree depth {depth}"
    );
}

pub(crate) fn gen_tree<R: RngCore + CryptoRng + ?Sized>(
    path: u32,
    depth: usize,
    prg: &PrgContext,
    rng: &mut R,
) -> TreeShares {
    assert!(depth <= 32, "tree depth {depth} exceeds 32");

    // 1) sample Δ with LSB=1 and share
    let delta = sample_delta(rng);
    let (s0_initial, s1_initial) = share_delta(&delta, rng);

    if depth == 0 {
        let mut leaf0 = s0_initial;
        let mut leaf1 = s1_initial;
        normalize(&mut leaf0);
        normalize(&mut leaf1);
        return TreeShares {
            roots: [s0_initial, s1_initial],
            cw_levels: Vec::new(),
            cw_last: None,
            leaves: [leaf0, leaf1],
        };
    }

    let bits = depth as u32;
    let mut cw_levels = Vec::with_capacity(depth - 1);
    let mut current_s0 = s0_initial;
    let mut current_s1 = s1_initial;
    let mut h0 = [0u8; AES_BLOCK_SIZE];
    let mut h1 = [0u8; AES_BLOCK_SIZE];

    for i in 0..depth - 1 {
        let prev0 = current_s0;
        let prev1 = current_s1;
        prg.hs(&prev0, &mut h0);
        prg.hs(&prev1, &mut h1);

        let ai = get_bit(path, i as u32, bits);

        // CW_i = H0 ⊕ H1 ⊕ (ᾱ_i * Δ)
        let mut cwi = h0;
        xor_bytes(&mut cwi, &h1);
        if ai == 0 {
            xor_bytes(&mut cwi, &delta);
        }

        // next s = H(prev) ⊕ (a_i * prev) ⊕ (t * CW_i)
        if ai == 1 {
            xor_bytes(&mut h0, &prev0);
            xor_bytes(&mut h1, &prev1);
        }
        if control_bit(&prev0) == 1 {
            xor_bytes(&mut h0, &cwi);
        }
        if control_bit(&prev1) == 1 {
            xor_bytes(&mut h1, &cwi);
        }
        cw_levels.push(cwi);
        current_s0 = h0;
        current_s1 = h1;
    }

    let alpha_n = get_bit(path, bits - 1, bits);
    let alpha_n_bar = 1 - alpha_n;

    // HS(s_{n-1}^b ⊕ σ) for σ ∈ {0,1}, inputs normalised to (s || t ⊕ σ)
    let mut hi0 = [[0u8; AES_BLOCK_SIZE]; 2];
    let mut hi1 = [[0u8; AES_BLOCK_SIZE]; 2];
    for sigma in 0..2u8 {
        let mut inp0 = current_s0;
        let mut inp1 = current_s1;
        inp0[AES_BLOCK_SIZE - 1] = control_bit(&inp0) ^ sigma;
        inp1[AES_BLOCK_SIZE - 1] = control_bit(&inp1) ^ sigma;
        prg.hs(&inp0, &mut hi0[sigma as usize]);
        prg.hs(&inp1, &mut hi1[sigma as usize]);
    }

    // HCW = high(hi0[ᾱ_n]) ⊕ high(hi1[ᾱ_n])
    let mut hcw = [0u8; AES_BLOCK_SIZE - 1];
    for j in 0..AES_BLOCK_SIZE - 1 {
        hcw[j] = hi0[alpha_n_bar as usize][j] ^ hi1[alpha_n_bar as usize][j];
    }
    // LCW^0 = low(hi0[0]) ⊕ low(hi1[0]) ⊕ ᾱ_n, LCW^1 = low(hi0[1]) ⊕ low(hi1[1]) ⊕ α_n
    let lcw0 = control_bit(&hi0[0]) ^ control_bit(&hi1[0]) ^ alpha_n_bar;
    let lcw1 = control_bit(&hi0[1]) ^ control_bit(&hi1[1]) ^ alpha_n;
    let cw_last = LastLevelCw { hcw, lcw0, lcw1 };

    // Both parties' leaves on the programmed branch
    let correction = cw_last.as_block(alpha_n);
    let mut leaf0 = hi0[alpha_n as usize];
    let mut leaf1 = hi1[alpha_n as usize];
    if control_bit(&current_s0) == 1 {
        xor_bytes(&mut leaf0, &correction);
    }
    if control_bit(&current_s1) == 1 {
        xor_bytes(&mut leaf1, &correction);
    }
    normalize(&mut leaf0);
    normalize(&mut leaf1);

    TreeShares {
        roots: [s0_initial, s1_initial],
        cw_levels,
        cw_last: Some(cw_last),
        leaves: [leaf0, leaf1],
    }
}

/// Walks one root-to-leaf path and returns the normalised leaf seed.
pub(crate) fn walk_path(
    seed: &Block,
    cw_levels: &[Block],
    cw_last: Option<&LastLevelCw>,
    path: u32,
    depth: usize,
    prg: &PrgContext,
) -> Block {
    let mut current_seed = *seed;
    let Some(cw_last) = cw_last else {
        normalize(&mut current_seed);
        return current_seed;
    };

    let bits = depth as u32;
    let mut hs_out = [0u8; AES_BLOCK_SIZE];
    for (i, cw_i) in cw_levels.iter().enumerate() {
        let x_i = get_bit(path, i as u32, bits);
        let current_t = control_bit(&current_seed);
        prg.hs(&current_seed, &mut hs_out);
        if x_i == 1 {
            xor_bytes(&mut hs_out, &current_seed);
        }
        if current_t == 1 {
            xor_bytes(&mut hs_out, cw_i);
        }
        current_seed = hs_out;
    }

    let x_n = get_bit(path, bits - 1, bits);
    let current_t = control_bit(&current_seed);
    let mut hash_input = current_seed;
    hash_input[AES_BLOCK_SIZE - 1] = current_t ^ x_n;
    prg.hs(&hash_input, &mut hs_out);
    if current_t == 1 {
        xor_bytes(&mut hs_out, &cw_last.as_block(x_n));
    }
    normalize(&mut hs_out);
    hs_out
}

/// Expands every leaf of the tree, level by level, in path order.
pub(crate) fn expand_leaves(
    seed: &Block,
    cw_levels: &[Block],
    cw_last: Option<&LastLevelCw>,
    prg: &PrgContext,
) -> Vec<Block> {
    let Some(cw_last) = cw_last else {
        let mut leaf = *seed;
        normalize(&mut leaf);
        return vec![leaf];
    };

    let depth = cw_levels.len() + 1;
    let mut current_seeds = Vec::with_capacity(1 << depth);
    current_seeds.push(*seed);
    let mut next_seeds = Vec::with_capacity(1 << depth);
    let mut hs_out = [0u8; AES_BLOCK_SIZE];

    for cw_i in cw_levels {
        next_seeds.clear();
        for prev_seed in &current_seeds {
            let current_t = control_bit(prev_seed);
            prg.hs(prev_seed, &mut hs_out);

            // x_i = 0
            let mut left = hs_out;
            if current_t == 1 {
                xor_bytes(&mut left, cw_i);
            }
            next_seeds.push(left);

            // x_i = 1
            xor_bytes(&mut hs_out, prev_seed);
            if current_t == 1 {
                xor_bytes(&mut hs_out, cw_i);
            }
            next_seeds.push(hs_out);
        }
        std::mem::swap(&mut current_seeds, &mut next_seeds);
    }

    let corrections = [cw_last.as_block(0), cw_last.as_block(1)];
    next_seeds.clear();
    for current_seed in &current_seeds {
        let t_for_final = control_bit(current_seed);
        for x_bit in 0u8..2 {
            let mut hash_input = *current_seed;
            hash_input[AES_BLOCK_SIZE - 1] = t_for_final ^ x_bit;
            prg.hs(&hash_input, &mut hs_out);
            if t_for_final == 1 {
                xor_bytes(&mut hs_out, &corrections[x_bit as usize]);
            }
            let mut leaf = hs_out;
            normalize(&mut leaf);
            next_seeds.push(leaf);
        }
    }
    next_seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup(seed: u64) -> (PrgContext, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        (PrgContext::random(&mut rng), rng)
    }

    #[test]
    fn leaves_agree_off_path_and_differ_on_path() {
        let (prg, mut rng) = setup(11);
        for depth in 0..=6usize {
            for path in 0..(1u32 << depth) {
                let shares = gen_tree(path, depth, &prg, &mut rng);
                let l0 = expand_leaves(&shares.roots[0], &shares.cw_levels, shares.cw_last.as_ref(), &prg);
                let l1 = expand_leaves(&shares.roots[1], &shares.cw_levels, shares.cw_last.as_ref(), &prg);
                assert_eq!(l0.len(), 1 << depth);
                for leaf in 0..(1usize << depth) {
                    if leaf as u32 == path {
                        assert_eq!(control_bit(&l0[leaf]) ^ control_bit(&l1[leaf]), 1);
                        assert_eq!(l0[leaf], shares.leaves[0]);
                        assert_eq!(l1[leaf], shares.leaves[1]);
                    } else {
                        assert_eq!(l0[leaf], l1[leaf], "depth {depth} path {path} leaf {leaf}");
                    }
                }
            }
        }
    }

    #[test]
    fn walking_a_path_matches_full_expansion() {
        let (prg, mut rng) = setup(12);
        let depth = 5;
        let shares = gen_tree(19, depth, &prg, &mut rng);
        let leaves = expand_leaves(&shares.roots[1], &shares.cw_levels, shares.cw_last.as_ref(), &prg);
        for x in 0..(1u32 << depth) {
            let walked = walk_path(&shares.roots[1], &shares.cw_levels, shares.cw_last.as_ref(), x, depth, &prg);
            assert_eq!(walked, leaves[x as usize]);
        }
    }

    #[test]
    #[should_panic]
    fn shape_mismatch_is_fatal() {
        let (prg, mut rng) = setup(13);
        let shares = gen_tree(3, 4, &prg, &mut rng);
        assert_shape(5, &shares.cw_levels, shares.cw_last.as_ref());
    }
}
