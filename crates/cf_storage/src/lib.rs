use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use cf_core::{Error, InferenceModel, Result, VersionStorage};

pub mod backends;

pub use backends::*;

/// Hint shown when a backend cannot be opened.
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    Memory,
    #[default]
    Sqlite,
    Chroma,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            "chroma" => Ok(StorageKind::Chroma),
            other => Err(Error::Config(format!(
                "Unknown storage '{}'. Available storages: sqlite, memory, chroma",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub store_dir: PathBuf,
    pub collection: String,
    /// Server address for remote backends
    pub url: Option<String>,
}

impl BackendConfig {
    pub fn new(store_dir: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            store_dir: store_dir.into(),
            collection: collection.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

fn with_hint<T: StorageBackend>(e: Error) -> Error {
    Error::Storage(format!("{} ({})", e, T::get_error_message()))
}

/// Open the backend named by `kind`. Documents and queries are embedded with `embedder`.
pub async fn create_storage(
    kind: StorageKind,
    config: &BackendConfig,
    embedder: Arc<dyn InferenceModel>,
) -> Result<Arc<dyn VersionStorage>> {
    let storage: Arc<dyn VersionStorage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new(&config.collection, embedder)),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Arc::new(
            SqliteStorage::open(&config.store_dir, &config.collection, embedder)
                .await
                .map_err(with_hint::<SqliteStorage>)?,
        ),
        #[cfg(feature = "chroma")]
        StorageKind::Chroma => Arc::new(
            ChromaStorage::new(config.url.as_deref(), &config.collection, embedder)
                .map_err(with_hint::<ChromaStorage>)?,
        ),
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::Config(format!(
                "Storage {:?} is not compiled in, rebuild with its cargo feature",
                other
            )))
        }
    };
    tracing::debug!("Opened {:?} storage for collection {}", kind, config.collection);
    Ok(storage)
}

pub mod prelude {
    pub use super::{create_storage, BackendConfig, StorageKind};
    pub use super::backends::*;
}
