use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit, KeyIvInit, StreamCipher, generic_array::GenericArray};
use ctr::Ctr128BE;
use gf128_lib::Gf128;
use rand::{CryptoRng, RngCore};

use crate::{AES_BLOCK_SIZE, Block};

type Aes128Ctr = Ctr128BE<Aes128>;

/// Public parameters shared by the client and both servers: the fixed AES
/// permutation and the hash key `S` of the tree hash.
#[derive(Clone)]
pub struct PrgContext {
    aes_key: Block,
    hs_key: Block,
    aes: Aes128,
}

impl PrgContext {
    pub fn new(aes_key: &Block, hs_key: &Block) -> Self {
        Self {
            aes_key: *aes_key,
            hs_key: *hs_key,
            aes: Aes128::new(GenericArray::from_slice(aes_key)),
        }
    }

    /// Draws fresh AES and hash keys.
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut aes_key = [0u8; AES_BLOCK_SIZE];
        let mut hs_key = [0u8; AES_BLOCK_SIZE];
        rng.fill_bytes(&mut aes_key);
        rng.fill_bytes(&mut hs_key);
        Self::new(&aes_key, &hs_key)
    }

    pub fn aes_key(&self) -> &Block {
        &self.aes_key
    }

    pub fn hs_key(&self) -> &Block {
        &self.hs_key
    }

    /// HS: H_S(x) = AES_fixed(σ(S ⊕ x)) ⊕ σ(S ⊕ x)
    pub fn hs(&self, x: &Block, out: &mut Block) {
        // tmp = S ⊕ x
        let mut tmp = [0u8; AES_BLOCK_SIZE];
        for i in 0..AES_BLOCK_SIZE {
            tmp[i] = self.hs_key[i] ^ x[i];
        }
        // σ: (xL⊕xR || xL)
        let mut sigma = [0u8; AES_BLOCK_SIZE];
        let half = AES_BLOCK_SIZE / 2;
        for i in 0..half {
            sigma[i] = tmp[i] ^ tmp[i + half];
        }
        sigma[half..].copy_from_slice(&tmp[..half]);

        let mut block = GenericArray::clone_from_slice(&sigma);
        self.aes.encrypt_block(&mut block);
        for i in 0..AES_BLOCK_SIZE {
            out[i] = block[i] ^ sigma[i];
        }
    }

    /// HS over a leaf seed `(s || t)`; everything in the last byte except `t` is dropped.
    pub fn hs_final(&self, st: &Block, out: &mut Block) {
        let mut s_only = *st;
        s_only[AES_BLOCK_SIZE - 1] &= 1;
        self.hs(&s_only, out);
    }

    /// Expands a leaf seed into a field element with AES-CTR.
    ///
    /// The CTR key is the fixed-key encryption of the normalised seed, so the
    /// output depends only on `(s || t)`.
    pub fn convert_field(&self, st: &Block) -> Gf128 {
        let mut s_only = *st;
        s_only[AES_BLOCK_SIZE - 1] &= 1;

        let mut ctr_key = GenericArray::clone_from_slice(&s_only);
        self.aes.encrypt_block(&mut ctr_key);
        let nonce = GenericArray::from([0u8; AES_BLOCK_SIZE]);
        let mut cipher = Aes128Ctr::new(&ctr_key, &nonce);

        let mut out = [0u8; AES_BLOCK_SIZE];
        cipher.apply_keystream(&mut out);
        Gf128::from_le_bytes(out)
    }
}

/// Bit `pos` of the `bit_size`-bit big-endian decomposition of `n`.
#[inline(always)]
pub fn get_bit(n: u32, pos: u32, bit_size: u32) -> u8 {
    assert!(pos < bit_size);
    ((n >> (bit_size - 1 - pos)) & 1) as u8
}

/// Samples the global offset Δ with its control bit (the LSB) forced to 1.
pub fn sample_delta<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Block {
    let mut delta = [0u8; AES_BLOCK_SIZE];
    rng.fill_bytes(&mut delta);
    delta[AES_BLOCK_SIZE - 1] |= 1;
    delta
}

/// XOR-shares Δ into the two root seeds.
pub fn share_delta<R: RngCore + CryptoRng + ?Sized>(delta: &Block, rng: &mut R) -> (Block, Block) {
    let mut share0 = [0u8; AES_BLOCK_SIZE];
    rng.fill_bytes(&mut share0);
    let mut share1 = share0;
    xor_bytes(&mut share1, delta);
    (share0, share1)
}

#[inline(always)]
pub fn xor_bytes(a: &mut Block, b: &Block) {
    for i in 0..AES_BLOCK_SIZE {
        a[i] ^= b[i];
    }
}

#[inline(always)]
pub(crate) fn control_bit(seed: &Block) -> u8 {
    seed[AES_BLOCK_SIZE - 1] & 1
}
