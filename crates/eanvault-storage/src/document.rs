use eanvault_core::registry::{CodeList, CodeListSummary};
use eanvault_core::UsedCodes;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Every stored version of the issued-codes list, as one document.
///
/// This is the state behind [`crate::InMemoryRegistry`] and the on-disk
/// format of [`crate::FileRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    lists: Vec<CodeList>,
}

impl RegistryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest version. If several are flagged latest the newest wins.
    pub fn current(&self) -> Option<&CodeList> {
        self.lists
            .iter()
            .filter(|list| list.latest)
            .max_by_key(|list| list.id)
    }

    pub fn current_codes(&self) -> UsedCodes {
        self.current()
            .map(|list| list.codes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Overwrites the latest version, or appends one if none exists.
    /// Returns the id of the written version.
    pub fn replace_current(&mut self, codes: &UsedCodes, now: Timestamp) -> u64 {
        let current_id = self.current().map(|list| list.id);
        let Some(id) = current_id else {
            return self.append(codes, now);
        };

        if let Some(list) = self.lists.iter_mut().find(|list| list.id == id) {
            list.codes = codes.as_slice().to_vec();
            list.updated_at = now;
        }
        id
    }

    /// Marks every version stale and appends `codes` as the new latest.
    /// Returns the id of the new version.
    pub fn append(&mut self, codes: &UsedCodes, now: Timestamp) -> u64 {
        for list in self.lists.iter_mut() {
            list.latest = false;
        }

        let id = self.lists.iter().map(|list| list.id).max().unwrap_or(0) + 1;
        self.lists.push(CodeList {
            id,
            updated_at: now,
            latest: true,
            codes: codes.as_slice().to_vec(),
        });
        id
    }

    /// Summaries of every version, newest first.
    pub fn summaries(&self) -> Vec<CodeListSummary> {
        let mut summaries: Vec<CodeListSummary> =
            self.lists.iter().map(CodeList::summary).collect();
        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        summaries
    }
}
