use async_trait::async_trait;
use cf_core::{Error, InferenceModel, Result, VersionMetadata, VersionRecord, VersionStorage};
use chromadb::v1::{
    client::{ChromaClient, ChromaClientOptions},
    collection::{CollectionEntries, QueryOptions},
};
use std::sync::Arc;
use crate::StorageBackend;
use super::new_version_id;

pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Versions kept in a Chroma server collection. Chroma ranks by distance;
/// the score reported here is `1 - distance`.
pub struct ChromaStorage {
    client: ChromaClient,
    collection: String,
    embedder: Arc<dyn InferenceModel>,
}

impl StorageBackend for ChromaStorage {
    fn get_error_message() -> &'static str {
        "ChromaDB should be running on http://localhost:8000"
    }
}

impl ChromaStorage {
    pub fn new(url: Option<&str>, collection: &str, embedder: Arc<dyn InferenceModel>) -> Result<Self> {
        let client = ChromaClient::new(ChromaClientOptions {
            url: url.unwrap_or(DEFAULT_URL).to_string(),
            ..Default::default()
        });
        Ok(Self {
            client,
            collection: collection.to_string(),
            embedder,
        })
    }
}

#[async_trait]
impl VersionStorage for ChromaStorage {
    async fn save(&self, content: &str, metadata: &VersionMetadata) -> Result<String> {
        let embedding = self.embedder.generate_embeddings(content).await?;
        let collection = self.client.get_or_create_collection(&self.collection, None)
            .map_err(Error::External)?;

        let id = new_version_id();
        let entries = CollectionEntries {
            ids: vec![id.as_str()],
            embeddings: Some(vec![embedding]),
            metadatas: Some(vec![metadata.to_map()]),
            documents: Some(vec![content]),
        };

        collection.add(entries, None)
            .map_err(Error::External)?;

        Ok(id)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VersionRecord>> {
        let collection = self.client.get_collection(&self.collection)
            .map_err(|e| Error::CollectionNotFound(format!("{}: {}", self.collection, e)))?;
        let embedding = self.embedder.generate_embeddings(query).await?;

        let query_options = QueryOptions {
            query_embeddings: Some(vec![embedding]),
            query_texts: None,
            n_results: Some(limit),
            where_document: None,
            where_metadata: None,
            include: Some(vec!["documents", "metadatas", "distances"]),
        };

        let results = collection.query(query_options, None)
            .map_err(Error::External)?;

        let ids = results.ids.into_iter().next().unwrap_or_default();
        let documents = results.documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = results.metadatas
            .and_then(|m| m.into_iter().next())
            .flatten()
            .unwrap_or_default();
        let distances = results.distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let records = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| VersionRecord {
                id,
                content: documents.get(i).cloned().unwrap_or_default(),
                metadata: metadatas
                    .get(i)
                    .and_then(|m| m.as_ref())
                    .map(VersionMetadata::from_map)
                    .unwrap_or_else(|| VersionMetadata::from_map(&Default::default())),
                score: distances.get(i).map(|d| 1.0 - d),
            })
            .collect();

        Ok(records)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
