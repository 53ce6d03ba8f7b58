use async_trait::async_trait;
use cf_core::{Error, InferenceModel, Result, VersionMetadata, VersionRecord, VersionStorage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;
use super::{new_version_id, rank_by_similarity};

#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<(VersionRecord, Vec<f32>)>>,
}

impl MemoryStore {
    pub fn insert(&mut self, collection: &str, record: VersionRecord, embedding: Vec<f32>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push((record, embedding));
    }

    pub fn query(&self, collection: &str, embedding: &[f32], limit: usize) -> Result<Vec<VersionRecord>> {
        let entries = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        Ok(rank_by_similarity(embedding, entries.clone(), limit))
    }
}

/// Process-local store; everything is lost when the process exits.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    collection: String,
    embedder: Arc<dyn InferenceModel>,
}

impl MemoryStorage {
    pub fn new(collection: &str, embedder: Arc<dyn InferenceModel>) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
            collection: collection.to_string(),
            embedder,
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }
}

#[async_trait]
impl VersionStorage for MemoryStorage {
    async fn save(&self, content: &str, metadata: &VersionMetadata) -> Result<String> {
        let embedding = self.embedder.generate_embeddings(content).await?;
        let id = new_version_id();
        let record = VersionRecord {
            id: id.clone(),
            content: content.to_string(),
            metadata: metadata.clone(),
            score: None,
        };
        self.store.write().await.insert(&self.collection, record, embedding);
        Ok(id)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VersionRecord>> {
        if !self.store.read().await.collections.contains_key(&self.collection) {
            return Err(Error::CollectionNotFound(self.collection.clone()));
        }
        let embedding = self.embedder.generate_embeddings(query).await?;
        let store = self.store.read().await;
        store.query(&self.collection, &embedding, limit)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
