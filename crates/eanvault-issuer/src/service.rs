use crate::error::{IssuerError, Result};
use eanvault_core::{CodeListSummary, Ean13, Mask, Registry, RegistryError, UsedCodes};
use eanvault_generator::Generator;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How an imported list is folded into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Union with the current list, written in place.
    #[default]
    Merge,
    /// Store the imported list as a new version, replacing the current one.
    Replace,
}

/// Result of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Codes that were not in the list before.
    pub added: usize,
    /// Size of the current list after the import.
    pub total: usize,
    /// Whether the registry was written. `false` when nothing changed.
    pub persisted: bool,
}

#[derive(Debug)]
struct State {
    used: UsedCodes,
    /// Codes in the mirror the registry does not have yet.
    pending: Vec<Ean13>,
}

/// Issues codes against a [`Registry`] and keeps a local mirror of it.
///
/// Every operation holds the state lock across its registry call, so two
/// calls on the same service never race on the authoritative record. Codes
/// accepted locally stay in the mirror even if persisting them fails, which
/// keeps them out of later batches; [`IssuerService::sync`] retries the
/// write.
#[derive(Debug)]
pub struct IssuerService<R, G> {
    registry: Arc<R>,
    generator: Arc<G>,
    state: Mutex<State>,
}

impl<R: Registry, G: Generator> IssuerService<R, G> {
    /// Creates the service, loading the current list from `registry`.
    pub async fn load(registry: R, generator: G) -> Result<Self> {
        let used = registry.fetch_current().await?;
        info!(codes = used.len(), "loaded issued codes");

        Ok(Self {
            registry: Arc::new(registry),
            generator: Arc::new(generator),
            state: Mutex::new(State {
                used,
                pending: Vec::new(),
            }),
        })
    }

    /// Generates `count` fresh codes for `mask` and persists the grown list.
    ///
    /// On a registry failure the batch is returned inside
    /// [`IssuerError::Unpersisted`] and remains in the local mirror.
    pub async fn generate(&self, mask: &Mask, count: usize) -> Result<Vec<Ean13>> {
        let mut state = self.state.lock().await;

        let batch = self.generator.generate(mask, count, &state.used)?;
        let added: Vec<Ean13> = batch
            .iter()
            .filter(|code| state.used.insert((*code).clone()))
            .cloned()
            .collect();
        info!(mask = %mask, generated = batch.len(), "generated codes");

        if added.is_empty() {
            debug!("nothing new to persist");
            return Ok(batch);
        }

        state.pending.extend(added);
        match self.persist(&mut state).await {
            Ok(()) => Ok(batch),
            Err(source) => Err(IssuerError::Unpersisted { batch, source }),
        }
    }

    /// Folds imported codes into the registry.
    ///
    /// [`ImportMode::Merge`] writes only when the union grew.
    /// [`ImportMode::Replace`] appends a new version unless the imported set
    /// equals the current one; codes from an earlier failed write are kept in
    /// that version. On failure the mirror is left untouched.
    pub async fn import(&self, codes: Vec<Ean13>, mode: ImportMode) -> Result<ImportOutcome> {
        let mut state = self.state.lock().await;

        match mode {
            ImportMode::Merge => {
                let added: Vec<Ean13> = codes
                    .into_iter()
                    .filter(|code| state.used.insert(code.clone()))
                    .collect();

                if added.is_empty() {
                    debug!("import added no codes, skipping persist");
                    return Ok(ImportOutcome {
                        added: 0,
                        total: state.used.len(),
                        persisted: false,
                    });
                }

                state.pending.extend(added.iter().cloned());
                if let Err(source) = self.persist(&mut state).await {
                    return Err(IssuerError::Unpersisted {
                        batch: added,
                        source,
                    });
                }

                info!(added = added.len(), total = state.used.len(), "merged imported codes");
                Ok(ImportOutcome {
                    added: added.len(),
                    total: state.used.len(),
                    persisted: true,
                })
            }
            ImportMode::Replace => {
                let mut incoming: UsedCodes = codes.into_iter().collect();
                let added = incoming
                    .iter()
                    .filter(|code| !state.used.contains(code))
                    .count();
                // codes handed out but never stored stay reserved
                let carried = incoming.extend_unique(state.pending.iter().cloned());
                if carried > 0 {
                    info!(carried, "keeping unpersisted codes in the replacement list");
                }

                if incoming == state.used && state.pending.is_empty() {
                    debug!("imported list equals the current one, skipping persist");
                    return Ok(ImportOutcome {
                        added: 0,
                        total: incoming.len(),
                        persisted: false,
                    });
                }

                if let Err(source) = self.registry.append_as_new_version(&incoming).await {
                    warn!(error = %source, "failed to store imported list");
                    return Err(IssuerError::Unpersisted {
                        batch: incoming.into_vec(),
                        source,
                    });
                }

                info!(total = incoming.len(), "replaced current list");
                let total = incoming.len();
                state.used = incoming;
                state.pending.clear();
                Ok(ImportOutcome {
                    added,
                    total,
                    persisted: true,
                })
            }
        }
    }

    /// Writes the mirror if an earlier write failed. Returns whether it wrote.
    pub async fn sync(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.pending.is_empty() {
            return Ok(false);
        }
        self.persist(&mut state).await?;
        Ok(true)
    }

    /// Snapshot of the local mirror.
    pub async fn used_codes(&self) -> UsedCodes {
        self.state.lock().await.used.clone()
    }

    /// Whether the mirror holds codes the registry has not stored.
    pub async fn is_dirty(&self) -> bool {
        !self.state.lock().await.pending.is_empty()
    }

    /// Stored versions, newest first.
    pub async fn versions(&self) -> Result<Vec<CodeListSummary>> {
        Ok(self.registry.versions().await?)
    }

    async fn persist(&self, state: &mut State) -> std::result::Result<(), RegistryError> {
        match self.registry.replace_current(&state.used).await {
            Ok(()) => {
                state.pending.clear();
                debug!(total = state.used.len(), "persisted issued codes");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, total = state.used.len(), "failed to persist issued codes");
                Err(err)
            }
        }
    }
}
