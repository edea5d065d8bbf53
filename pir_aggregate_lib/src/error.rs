use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("row length must be non-zero")]
    EmptyRow,

    #[error("database of {len} bytes is not a whole number of {row_len}-byte rows")]
    RaggedDatabase { len: usize, row_len: usize },

    #[error("database of {len} bytes does not hold {rows} rows of {row_len} bytes")]
    DatabaseShape { len: usize, rows: usize, row_len: usize },

    #[error("matrix of {rows}x{cols} backed by {len} elements")]
    MatrixShape { rows: usize, cols: usize, len: usize },

    #[error("inner dimensions disagree: left has {left_cols} columns, right has {right_rows} rows")]
    InnerDimension { left_cols: usize, right_rows: usize },

    #[error("output is {got_rows}x{got_cols}, expected {rows}x{cols}")]
    OutputShape { got_rows: usize, got_cols: usize, rows: usize, cols: usize },

    #[error("worker count must be at least 1")]
    NoThreads,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, AggregateError>;
