//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::upload::{
    Assembler, ChunkStore, CompletionLocks, MetadataStore, Retrieval, StorageLayout,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub chunk_store: ChunkStore,
    pub assembler: Assembler,
    pub retrieval: Retrieval,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        let layout = StorageLayout::new(&config.storage.chunk_dir, &config.storage.upload_dir);
        let chunk_store = ChunkStore::new(layout.clone());
        let metadata_store = MetadataStore::new(layout.clone());
        let assembler = Assembler::new(
            layout.clone(),
            chunk_store.clone(),
            metadata_store.clone(),
            CompletionLocks::new(),
        );
        let retrieval = Retrieval::new(layout, metadata_store);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                chunk_store,
                assembler,
                retrieval,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the chunk store
    pub fn chunk_store(&self) -> &ChunkStore {
        &self.inner.chunk_store
    }

    /// Get the assembler
    pub fn assembler(&self) -> &Assembler {
        &self.inner.assembler
    }

    /// Get artifact retrieval
    pub fn retrieval(&self) -> &Retrieval {
        &self.inner.retrieval
    }
}
