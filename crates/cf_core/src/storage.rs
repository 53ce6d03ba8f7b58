use async_trait::async_trait;
use crate::types::{VersionMetadata, VersionRecord};
use crate::Result;

#[async_trait]
pub trait VersionStorage: Send + Sync {
    /// Store a version under a freshly generated id, creating the collection if needed
    async fn save(&self, content: &str, metadata: &VersionMetadata) -> Result<String>;

    /// Return up to `limit` versions ranked by similarity to `query`.
    /// Fails with `Error::CollectionNotFound` when nothing was ever saved.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VersionRecord>>;

    fn collection(&self) -> &str;
}
