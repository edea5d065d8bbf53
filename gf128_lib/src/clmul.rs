//! Carry-less multiplication back-ends for GF(2^128).
//!
//! Both back-ends compute the same 256-bit product and reduce it modulo
//! `x^128 + x^7 + x^2 + x + 1`, so their outputs agree bit for bit.

/// Low word of the reduction polynomial without the `x^128` term.
pub const POLY_LOW: u64 = 0x87;

/// Folds the high half of a 256-bit carry-less product into the low half.
#[inline(always)]
pub fn reduce(lo: u128, hi: u128) -> u128 {
    // bits of hi * (x^7 + x^2 + x) that spill past x^127
    let t = hi ^ (hi >> 127) ^ (hi >> 126) ^ (hi >> 121);
    lo ^ t ^ (t << 1) ^ (t << 2) ^ (t << 7)
}

/// Schoolbook carry-less multiply, returned as `(lo, hi)` halves.
///
/// Every iteration does the same work regardless of the operand bits; the
/// selected partial product is chosen with a mask, never a branch.
#[inline]
pub fn clmul_portable(a: u128, b: u128) -> (u128, u128) {
    let mut lo = 0u128;
    let mut hi = 0u128;
    for i in 0..128 {
        let mask = 0u128.wrapping_sub((b >> i) & 1);
        let term = a & mask;
        lo ^= term << i;
        // term >> (128 - i), written so that i == 0 does not overflow the shift
        hi ^= (term >> 1) >> (127 - i);
    }
    (lo, hi)
}

/// Bit-serial field multiply, usable on every target.
pub fn mul_portable(a: u128, b: u128) -> u128 {
    let (lo, hi) = clmul_portable(a, b);
    reduce(lo, hi)
}

/// Field multiply using `pclmulqdq`.
///
/// # Safety
/// The caller must make sure the CPU supports `pclmulqdq`.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "pclmulqdq")]
pub unsafe fn mul_clmul(a: u128, b: u128) -> u128 {
    use std::arch::x86_64::*;

    let va = load(a);
    let vb = load(b);

    let lo = _mm_clmulepi64_si128(va, vb, 0x00);
    let mid = _mm_xor_si128(
        _mm_clmulepi64_si128(va, vb, 0x01),
        _mm_clmulepi64_si128(va, vb, 0x10),
    );
    let hi = _mm_clmulepi64_si128(va, vb, 0x11);

    let mid = store(mid);
    let lo = store(lo) ^ (mid << 64);
    let hi = store(hi) ^ (mid >> 64);

    // hi * x^128 == hi * 0x87, folded twice since hi * 0x87 can reach x^134
    let poly = _mm_set_epi64x(0, POLY_LOW as i64);
    let vh = load(hi);
    let r0 = store(_mm_clmulepi64_si128(vh, poly, 0x00));
    let r1 = store(_mm_clmulepi64_si128(vh, poly, 0x01));
    let r2 = store(_mm_clmulepi64_si128(load(r1 >> 64), poly, 0x00));

    lo ^ r0 ^ (r1 << 64) ^ r2
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn load(x: u128) -> std::arch::x86_64::__m128i {
    std::arch::x86_64::_mm_set_epi64x((x >> 64) as i64, x as i64)
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn store(v: std::arch::x86_64::__m128i) -> u128 {
    std::mem::transmute::<std::arch::x86_64::__m128i, u128>(v)
}

/// Returns true when the hardware back-end is available on this CPU.
pub fn has_hardware_clmul() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("pclmulqdq")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Multiplies with the fastest back-end the CPU offers.
#[inline]
pub fn mul(a: u128, b: u128) -> u128 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("pclmulqdq") {
            // SAFETY: feature presence checked just above.
            return unsafe { mul_clmul(a, b) };
        }
    }
    mul_portable(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn x127_times_x_wraps_to_reduction_polynomial() {
        assert_eq!(mul_portable(1 << 127, 2), POLY_LOW as u128);
        assert_eq!(mul(1 << 127, 2), POLY_LOW as u128);
    }

    #[test]
    fn portable_clmul_matches_small_products() {
        // (x + 1)^2 = x^2 + 1 over GF(2)
        assert_eq!(clmul_portable(0b11, 0b11), (0b101, 0));
        assert_eq!(clmul_portable(1 << 127, 1 << 127), (0, 1 << 126));
    }

    #[test]
    fn hardware_and_portable_agree() {
        if !has_hardware_clmul() {
            return;
        }
        let mut rng = StdRng::seed_from_u64(0x9c4d);
        for _ in 0..10_000 {
            let a: u128 = rng.random();
            let b: u128 = rng.random();
            #[cfg(target_arch = "x86_64")]
            assert_eq!(unsafe { mul_clmul(a, b) }, mul_portable(a, b), "a={a:#x} b={b:#x}");
        }
        for (a, b) in [(0, 0), (u128::MAX, u128::MAX), (1, u128::MAX), (1 << 127, 1 << 127)] {
            #[cfg(target_arch = "x86_64")]
            assert_eq!(unsafe { mul_clmul(a, b) }, mul_portable(a, b));
        }
    }
}
