use pir_aggregate_lib::AggregateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PirError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("key was generated for a 2^{key_logn} domain, server expects 2^{server_logn}")]
    DomainMismatch { key_logn: usize, server_logn: usize },

    #[error("key carries {got} level correction words, a 2^{logn} domain needs {expected}")]
    MalformedKey { logn: usize, got: usize, expected: usize },

    #[error("index {index} outside a 2^{logn} domain")]
    IndexOutOfDomain { index: u64, logn: usize },

    #[error("database has {rows} rows but the domain only covers 2^{logn}")]
    TooManyRows { rows: usize, logn: usize },

    #[error("answers have different lengths: {left} and {right}")]
    AnswerLength { left: usize, right: usize },

    #[error("field answers are scaled by zero and cannot be unscaled")]
    ZeroScale,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("could not parse {var}={value:?}: {source}")]
    Env {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

pub type Result<T> = std::result::Result<T, PirError>;
