//! Error types shared across the crate.

use thiserror::Error;

/// Errors produced while building Hamiltonians, evolving states, or running
/// the protocol search.
///
/// A loss of norm during the search is *not* an error; see
/// [`NormViolation`][crate::descent::NormViolation].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid run or model parameters, detected before any simulation work.
    #[error("configuration error: {0}")]
    Config(String),

    /// Hermitian diagonalization failed.
    #[error("numerical failure: diagonalization error: {0}")]
    NumericalFailure(#[from] ndarray_linalg::error::LinalgError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("npz write error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),

    #[error("could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn config<S>(msg: S) -> Self
    where S: Into<String>
    {
        Self::Config(msg.into())
    }
}

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
