use dpf_half_tree_bit_lib::{dpf_bit_gen, dpf_field_gen, BitDpfKey, FieldDpfKey, PrgContext};
use gf128_lib::Gf128;
use pir_aggregate_lib::{gcm_into, xor_into};
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::config::PirParams;
use crate::error::{PirError, Result};

/// Generates query keys and recombines the two servers' answers.
#[derive(Clone)]
pub struct PirClient {
    prg: PrgContext,
    params: PirParams,
}

impl PirClient {
    pub fn new(prg: PrgContext, params: PirParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { prg, params })
    }

    /// Client with freshly sampled PRG keys; share them with both servers via [`PirClient::prg`].
    pub fn random<R: RngCore + CryptoRng + ?Sized>(params: PirParams, rng: &mut R) -> Result<Self> {
        Self::new(PrgContext::random(rng), params)
    }

    pub fn prg(&self) -> &PrgContext {
        &self.prg
    }

    pub fn params(&self) -> &PirParams {
        &self.params
    }

    fn check_index(&self, idx: u32) -> Result<()> {
        if (idx as usize) >= self.params.domain_size() {
            return Err(PirError::IndexOutOfDomain { index: idx as u64, logn: self.params.logn });
        }
        Ok(())
    }

    /// Key pair selecting row `idx`, one key per server.
    pub fn query(&self, idx: u32) -> Result<(BitDpfKey, BitDpfKey)> {
        self.query_with_rng(idx, &mut rand::rng())
    }

    pub fn query_with_rng<R: RngCore + CryptoRng + ?Sized>(
        &self,
        idx: u32,
        rng: &mut R,
    ) -> Result<(BitDpfKey, BitDpfKey)> {
        self.check_index(idx)?;
        let keys = dpf_bit_gen(idx, self.params.logn, &self.prg, rng);
        debug!(logn = self.params.logn, levels = keys.0.cw_levels.len(), "generated xor query");
        Ok(keys)
    }

    /// Key pair whose shares sum to `beta` at row `idx` and to zero elsewhere.
    pub fn query_field(&self, idx: u32, beta: Gf128) -> Result<(FieldDpfKey, FieldDpfKey)> {
        self.query_field_with_rng(idx, beta, &mut rand::rng())
    }

    pub fn query_field_with_rng<R: RngCore + CryptoRng + ?Sized>(
        &self,
        idx: u32,
        beta: Gf128,
        rng: &mut R,
    ) -> Result<(FieldDpfKey, FieldDpfKey)> {
        self.check_index(idx)?;
        if beta.is_zero() {
            return Err(PirError::ZeroScale);
        }
        let keys = dpf_field_gen(idx, beta, self.params.logn, &self.prg, rng);
        debug!(logn = self.params.logn, "generated field query");
        Ok(keys)
    }

    /// XOR of both answers: the selected row.
    pub fn reconstruct(&self, answer0: &[u8], answer1: &[u8]) -> Result<Vec<u8>> {
        if answer0.len() != answer1.len() {
            return Err(PirError::AnswerLength { left: answer0.len(), right: answer1.len() });
        }
        let mut row = answer0.to_vec();
        xor_into(&mut row, answer1);
        Ok(row)
    }

    /// Sums both field answers, then divides out the query's `beta` block by block.
    pub fn reconstruct_field(&self, answer0: &[u8], answer1: &[u8], beta: Gf128) -> Result<Vec<u8>> {
        if beta.is_zero() {
            return Err(PirError::ZeroScale);
        }
        let scaled = self.reconstruct(answer0, answer1)?;
        if scaled.len() % gf128_lib::BLOCK_SIZE != 0 {
            return Err(PirError::InvalidParam {
                name: "answer",
                reason: format!("{} bytes is not a whole number of field blocks", scaled.len()),
            });
        }
        let mut row = vec![0u8; scaled.len()];
        gcm_into(&mut row, beta.inverse(), &scaled);
        Ok(row)
    }
}
