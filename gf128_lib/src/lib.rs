//! Arithmetic in GF(2^128) modulo `x^128 + x^7 + x^2 + x + 1`.
//!
//! Bit `i` of the backing `u128` is the coefficient of `x^i`. Byte encodings
//! are little-endian, so a 16-byte database block maps directly onto an
//! element without any bit reflection.
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign};

pub mod clmul;

pub use clmul::{has_hardware_clmul, mul, mul_portable};

/// Size of one field element in bytes.
pub const BLOCK_SIZE: usize = 16;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Gf128(pub u128);

impl Gf128 {
    pub const ZERO: Gf128 = Gf128(0);
    pub const ONE: Gf128 = Gf128(1);

    #[inline(always)]
    pub fn from_le_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Gf128(u128::from_le_bytes(bytes))
    }

    #[inline(always)]
    pub fn to_le_bytes(self) -> [u8; BLOCK_SIZE] {
        self.0.to_le_bytes()
    }

    /// Reads one element from the first 16 bytes of `bytes`.
    #[inline(always)]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&bytes[..BLOCK_SIZE]);
        Self::from_le_bytes(block)
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn square(self) -> Self {
        self * self
    }

    /// Square-and-multiply, most significant exponent bit first.
    pub fn pow(self, exp: u128) -> Self {
        let mut acc = Gf128::ONE;
        for i in (0..128).rev() {
            acc = acc.square();
            if (exp >> i) & 1 == 1 {
                acc *= self;
            }
        }
        acc
    }

    /// Multiplicative inverse via `a^(2^128 - 2)`. Zero maps to zero.
    pub fn inverse(self) -> Self {
        self.pow(u128::MAX - 1)
    }
}

impl fmt::Debug for Gf128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gf128({:#034x})", self.0)
    }
}

impl From<u128> for Gf128 {
    fn from(value: u128) -> Self {
        Gf128(value)
    }
}

impl Add for Gf128 {
    type Output = Gf128;

    #[inline(always)]
    fn add(self, rhs: Gf128) -> Gf128 {
        Gf128(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf128 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Gf128) {
        self.0 ^= rhs.0;
    }
}

impl Mul for Gf128 {
    type Output = Gf128;

    #[inline(always)]
    fn mul(self, rhs: Gf128) -> Gf128 {
        Gf128(mul(self.0, rhs.0))
    }
}

impl MulAssign for Gf128 {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Gf128) {
        self.0 = mul(self.0, rhs.0);
    }
}
