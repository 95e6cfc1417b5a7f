use thiserror::Error;

/// Result type for code, mask and generation operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid code: {0}")]
    InvalidCode(String),
    #[error("invalid mask: {0}")]
    InvalidMask(String),
    #[error("mask exceeds 12 characters (got {len})")]
    MaskTooLong { len: usize },
    #[error(
        "could not generate {requested} unique codes after {tries} tries \
         (produced {produced}); widen the mask"
    )]
    GenerationExhausted {
        requested: usize,
        produced: usize,
        tries: usize,
    },
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("registry backend unavailable: {0}")]
    Unavailable(String),
    #[error("registry operation timed out: {0}")]
    Timeout(String),
    #[error("registry query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("registry io failed: {0}")]
    Io(String),
    #[error("registry operation failed: {0}")]
    Operation(String),
}
