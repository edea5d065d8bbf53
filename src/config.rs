//! Server/client parameters.
//!
//! Defaults can be overridden from the environment (or a `.env` file) with
//! `PIR_LOGN`, `PIR_ROW_LEN` and `PIR_THREADS`.
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

use dpf_half_tree_bit_lib::MAX_LOGN;
use gf128_lib::BLOCK_SIZE;
use tracing::{debug, warn};

use crate::error::{PirError, Result};

pub const DEFAULT_LOGN: usize = 10;
pub const DEFAULT_ROW_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PirParams {
    /// Domain is `2^logn` rows.
    pub logn: usize,
    /// Bytes per database row.
    pub row_len: usize,
    /// Worker threads per answer; 1 runs the sequential kernels.
    pub threads: usize,
}

impl Default for PirParams {
    fn default() -> Self {
        Self {
            logn: DEFAULT_LOGN,
            row_len: DEFAULT_ROW_LEN,
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

fn parse_var<T: FromStr<Err = std::num::ParseIntError>>(var: &'static str) -> Result<Option<T>> {
    match env::var(var) {
        Ok(value) => {
            let parsed = value.trim().parse().map_err(|source| PirError::Env { var, value, source })?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

impl PirParams {
    pub fn new(logn: usize, row_len: usize, threads: usize) -> Result<Self> {
        let params = Self { logn, row_len, threads };
        params.validate()?;
        Ok(params)
    }

    /// Defaults overridden by `PIR_*` variables, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("ignoring unreadable .env file: {e}");
            }
        }

        let mut params = Self::default();
        if let Some(logn) = parse_var("PIR_LOGN")? {
            params.logn = logn;
        }
        if let Some(row_len) = parse_var("PIR_ROW_LEN")? {
            params.row_len = row_len;
        }
        if let Some(threads) = parse_var("PIR_THREADS")? {
            params.threads = threads;
        }
        params.validate()?;
        debug!(logn = params.logn, row_len = params.row_len, threads = params.threads, "loaded pir parameters");
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logn > MAX_LOGN {
            return Err(PirError::InvalidParam {
                name: "logn",
                reason: format!("{} exceeds {MAX_LOGN}", self.logn),
            });
        }
        if self.row_len == 0 || self.row_len % BLOCK_SIZE != 0 {
            return Err(PirError::InvalidParam {
                name: "row_len",
                reason: format!("{} is not a positive multiple of {BLOCK_SIZE}", self.row_len),
            });
        }
        if self.threads == 0 {
            return Err(PirError::InvalidParam { name: "threads", reason: "must be at least 1".into() });
        }
        Ok(())
    }

    pub fn domain_size(&self) -> usize {
        1 << self.logn
    }

    /// Bytes in a packed selection vector for this domain.
    pub fn selection_len(&self) -> usize {
        self.domain_size().div_ceil(8)
    }
}
