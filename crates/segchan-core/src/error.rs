//! Error types for segchan

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),

    #[error("resource attach failed: {0}")]
    ResourceAttach(String),

    #[error("semaphore {op} failed: {source}")]
    Semaphore {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt frame: chunk length {0} out of range")]
    CorruptFrame(u64),

    #[error("allocation of {0} bytes failed")]
    Allocation(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
