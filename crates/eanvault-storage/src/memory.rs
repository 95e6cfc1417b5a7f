use crate::document::RegistryDocument;
use async_trait::async_trait;
use eanvault_core::registry::{CodeListSummary, Registry, Result};
use eanvault_core::UsedCodes;
use jiff::Timestamp;
use parking_lot::RwLock;
use tracing::debug;

/// In-memory implementation of the [`Registry`] trait.
///
/// Nothing survives the process; useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    document: RwLock<RegistryDocument>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose latest version holds `codes`.
    pub fn with_codes(codes: &UsedCodes) -> Self {
        let mut document = RegistryDocument::new();
        document.append(codes, Timestamp::now());
        Self {
            document: RwLock::new(document),
        }
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn fetch_current(&self) -> Result<UsedCodes> {
        Ok(self.document.read().current_codes())
    }

    async fn replace_current(&self, codes: &UsedCodes) -> Result<()> {
        let id = self.document.write().replace_current(codes, Timestamp::now());
        debug!(id, len = codes.len(), "replaced current code list");
        Ok(())
    }

    async fn append_as_new_version(&self, codes: &UsedCodes) -> Result<()> {
        let id = self.document.write().append(codes, Timestamp::now());
        debug!(id, len = codes.len(), "appended code list version");
        Ok(())
    }

    async fn versions(&self) -> Result<Vec<CodeListSummary>> {
        Ok(self.document.read().summaries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eanvault_core::Ean13;
    use std::sync::Arc;

    fn codes(bodies: &[&str]) -> UsedCodes {
        bodies
            .iter()
            .map(|b| Ean13::from_body(b).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn fetch_from_empty_registry() {
        let registry = InMemoryRegistry::new();
        assert!(registry.fetch_current().await.unwrap().is_empty());
        assert!(registry.versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_then_fetch() {
        let registry = InMemoryRegistry::new();
        let list = codes(&["160000000001", "160000000002"]);

        registry.replace_current(&list).await.unwrap();

        assert_eq!(registry.fetch_current().await.unwrap(), list);
        assert_eq!(registry.versions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replace_does_not_create_versions() {
        let registry = InMemoryRegistry::with_codes(&codes(&["160000000001"]));

        registry
            .replace_current(&codes(&["160000000001", "160000000002"]))
            .await
            .unwrap();

        let versions = registry.versions().await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].len, 2);
    }

    #[tokio::test]
    async fn append_marks_previous_stale() {
        let registry = InMemoryRegistry::with_codes(&codes(&["160000000001"]));

        registry
            .append_as_new_version(&codes(&["170000000001"]))
            .await
            .unwrap();

        let versions = registry.versions().await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].latest);
        assert!(!versions[1].latest);
        assert_eq!(
            registry.fetch_current().await.unwrap(),
            codes(&["170000000001"])
        );
    }

    #[tokio::test]
    async fn concurrent_writes_are_last_write_wins() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let body = format!("{:012}", i);
                let list = codes(&[body.as_str()]);
                registry.replace_current(&list).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // one version, holding exactly one writer's list
        assert_eq!(registry.versions().await.unwrap().len(), 1);
        assert_eq!(registry.fetch_current().await.unwrap().len(), 1);
    }
}
