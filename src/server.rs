use std::time::Instant;

use dpf_half_tree_bit_lib::bit::tree_depth;
use dpf_half_tree_bit_lib::{dpf_bit_eval_full, dpf_field_eval_full, BitDpfKey, FieldDpfKey, PrgContext};
use pir_aggregate_lib::{gcm_fold, gcm_fold_parallel, xor_fold, xor_fold_parallel, Database};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::PirParams;
use crate::error::{PirError, Result};

/// One of the two non-colluding servers.
///
/// Holds a borrowed database of `row_len`-byte rows and answers DPF queries
/// against it. The PRG keys must match the ones the client generated its
/// keys with.
pub struct PirServer<'a> {
    db: Database<'a>,
    prg: PrgContext,
    params: PirParams,
}

impl<'a> PirServer<'a> {
    pub fn new(data: &'a [u8], prg: PrgContext, params: PirParams) -> Result<Self> {
        params.validate()?;
        let db = Database::new(data, params.row_len)?;
        if db.rows() > params.domain_size() {
            return Err(PirError::TooManyRows { rows: db.rows(), logn: params.logn });
        }
        info!(
            rows = db.rows(),
            row_len = db.row_len(),
            logn = params.logn,
            threads = params.threads,
            "pir server ready"
        );
        Ok(Self { db, prg, params })
    }

    pub fn params(&self) -> &PirParams {
        &self.params
    }

    pub fn database(&self) -> &Database<'a> {
        &self.db
    }

    fn check_domain(&self, key_logn: usize) -> Result<()> {
        if key_logn != self.params.logn {
            return Err(PirError::DomainMismatch { key_logn, server_logn: self.params.logn });
        }
        Ok(())
    }

    fn check_levels(&self, depth: usize, got: usize, has_last: bool) -> Result<()> {
        let expected = depth.saturating_sub(1);
        if got != expected || has_last != (depth > 0) {
            return Err(PirError::MalformedKey { logn: self.params.logn, got, expected });
        }
        Ok(())
    }

    /// Expands a bit DPF key and XOR-folds the selected rows.
    pub fn answer(&self, key: &BitDpfKey) -> Result<Vec<u8>> {
        self.check_domain(key.logn)?;
        self.check_levels(tree_depth(key.logn), key.cw_levels.len(), key.cw_last.is_some())?;

        let start = Instant::now();
        let selection = dpf_bit_eval_full(key, self.params.logn, &self.prg);
        let eval_time = start.elapsed();

        let mut out = vec![0u8; self.db.row_len()];
        if self.params.threads > 1 {
            xor_fold_parallel(&selection, &self.db, &mut out, self.params.threads)?;
        } else {
            xor_fold(&selection, &self.db, &mut out);
        }
        debug!(
            party = key.party.index(),
            eval_us = eval_time.as_micros() as u64,
            total_us = start.elapsed().as_micros() as u64,
            "answered xor query"
        );
        Ok(out)
    }

    /// Expands a field DPF key into row weights and folds the database under them.
    pub fn answer_field(&self, key: &FieldDpfKey) -> Result<Vec<u8>> {
        self.check_domain(key.logn)?;
        self.check_levels(key.logn, key.cw_levels.len(), key.cw_last.is_some())?;

        let start = Instant::now();
        let mut weights = dpf_field_eval_full(key, self.params.logn, &self.prg);
        weights.truncate(self.db.rows());
        let eval_time = start.elapsed();

        let mut out = vec![0u8; self.db.row_len()];
        if self.params.threads > 1 {
            gcm_fold_parallel(&weights, &self.db, &mut out, self.params.threads)?;
        } else {
            gcm_fold(&weights, &self.db, &mut out);
        }
        debug!(
            party = key.party.index(),
            eval_us = eval_time.as_micros() as u64,
            total_us = start.elapsed().as_micros() as u64,
            "answered field query"
        );
        Ok(out)
    }

    /// Answers independent queries concurrently, one sequential fold each.
    pub fn answer_batch(&self, keys: &[BitDpfKey]) -> Result<Vec<Vec<u8>>> {
        let start = Instant::now();
        let single = PirServer {
            db: self.db,
            prg: self.prg.clone(),
            params: PirParams { threads: 1, ..self.params },
        };
        let answers = keys.par_iter().map(|key| single.answer(key)).collect::<Result<Vec<_>>>()?;
        info!(queries = keys.len(), elapsed_ms = start.elapsed().as_millis() as u64, "answered batch");
        Ok(answers)
    }
}
