use eanvault_core::{CoreError, Ean13, RegistryError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IssuerError>;

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    /// The codes were accepted locally but the registry write failed.
    /// They must not be dropped: the caller still owns `batch`.
    #[error("{} codes were not persisted: {source}", .batch.len())]
    Unpersisted {
        batch: Vec<Ean13>,
        source: RegistryError,
    },
}
