use crate::code::Ean13;
use crate::error::RegistryError;
use crate::used_codes::UsedCodes;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// One stored version of the issued-codes list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeList {
    pub id: u64,
    pub updated_at: Timestamp,
    /// Whether this is the authoritative version.
    pub latest: bool,
    pub codes: Vec<Ean13>,
}

impl CodeList {
    pub fn summary(&self) -> CodeListSummary {
        CodeListSummary {
            id: self.id,
            updated_at: self.updated_at,
            latest: self.latest,
            len: self.codes.len(),
        }
    }
}

/// Metadata of a stored version, without its codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListSummary {
    pub id: u64,
    pub updated_at: Timestamp,
    pub latest: bool,
    pub len: usize,
}

/// A versioned document store holding the authoritative [`UsedCodes`].
///
/// Exactly one stored version is marked latest once any exists. Writes are
/// last-write-wins: the registry offers no optimistic concurrency, so a
/// single process should own the writes.
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Returns the codes of the latest version, or an empty set if none exists.
    async fn fetch_current(&self) -> Result<UsedCodes>;

    /// Overwrites the latest version's codes in place.
    ///
    /// Falls back to [`Registry::append_as_new_version`] when nothing is
    /// stored yet.
    async fn replace_current(&self, codes: &UsedCodes) -> Result<()>;

    /// Marks every latest version stale and stores `codes` as the new latest,
    /// keeping older versions as history.
    async fn append_as_new_version(&self, codes: &UsedCodes) -> Result<()>;

    /// Lists every stored version, newest first.
    async fn versions(&self) -> Result<Vec<CodeListSummary>>;
}

#[async_trait]
impl<R: Registry + ?Sized> Registry for Arc<R> {
    async fn fetch_current(&self) -> Result<UsedCodes> {
        (**self).fetch_current().await
    }

    async fn replace_current(&self, codes: &UsedCodes) -> Result<()> {
        (**self).replace_current(codes).await
    }

    async fn append_as_new_version(&self, codes: &UsedCodes) -> Result<()> {
        (**self).append_as_new_version(codes).await
    }

    async fn versions(&self) -> Result<Vec<CodeListSummary>> {
        (**self).versions().await
    }
}
