use crate::document::RegistryDocument;
use async_trait::async_trait;
use eanvault_core::registry::{CodeListSummary, Registry, Result};
use eanvault_core::{RegistryError, UsedCodes};
use jiff::Timestamp;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// A [`Registry`] kept in a single JSON document on disk.
///
/// Every write reads the document, applies the change and writes it back
/// through a temporary file followed by a rename, so readers never observe
/// a partially written document. Writes from this instance are serialized;
/// separate processes sharing the file are last-write-wins.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

fn map_io_error(operation: &str, path: &Path, err: std::io::Error) -> RegistryError {
    let message = format!("{operation} '{}': {err}", path.display());
    match err.kind() {
        ErrorKind::TimedOut => RegistryError::Timeout(message),
        ErrorKind::PermissionDenied => RegistryError::Unavailable(message),
        _ => RegistryError::Io(message),
    }
}

impl FileRegistry {
    /// Creates a registry backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<RegistryDocument> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "registry file not found, starting empty");
                return Ok(RegistryDocument::new());
            }
            Err(err) => return Err(map_io_error("read", &self.path, err)),
        };

        serde_json::from_str(&raw).map_err(|e| {
            RegistryError::InvalidData(format!("invalid registry file '{}': {e}", self.path.display()))
        })
    }

    async fn store(&self, document: &RegistryDocument) -> Result<()> {
        let raw = serde_json::to_vec_pretty(document)
            .map_err(|e| RegistryError::Operation(format!("serialize registry document: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| map_io_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| map_io_error("rename", &self.path, e))
    }
}

#[async_trait]
impl Registry for FileRegistry {
    async fn fetch_current(&self) -> Result<UsedCodes> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.current_codes())
    }

    async fn replace_current(&self, codes: &UsedCodes) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let id = document.replace_current(codes, Timestamp::now());
        self.store(&document).await?;
        debug!(id, len = codes.len(), path = %self.path.display(), "replaced current code list");
        Ok(())
    }

    async fn append_as_new_version(&self, codes: &UsedCodes) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let id = document.append(codes, Timestamp::now());
        self.store(&document).await?;
        debug!(id, len = codes.len(), path = %self.path.display(), "appended code list version");
        Ok(())
    }

    async fn versions(&self) -> Result<Vec<CodeListSummary>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.summaries())
    }
}
