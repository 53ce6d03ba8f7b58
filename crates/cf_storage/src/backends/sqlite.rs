use async_trait::async_trait;
use cf_core::{Error, InferenceModel, Result, VersionMetadata, VersionRecord, VersionStorage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::StorageBackend;
use super::{new_version_id, rank_by_similarity};

pub const DB_FILE_NAME: &str = "versions.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS versions (
        id TEXT PRIMARY KEY,
        collection TEXT NOT NULL REFERENCES collections(name),
        content TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_versions_collection ON versions(collection)",
];

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

/// Versions persisted in `<store_dir>/versions.db`.
pub struct SqliteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
    collection: String,
    embedder: Arc<dyn InferenceModel>,
}

impl StorageBackend for SqliteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database directory should be writable"
    }
}

impl SqliteStorage {
    pub async fn open(store_dir: &Path, collection: &str, embedder: Arc<dyn InferenceModel>) -> Result<Self> {
        std::fs::create_dir_all(store_dir)?;
        let db_path = store_dir.join(DB_FILE_NAME);

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path,
            collection: collection.to_string(),
            embedder,
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn collection_exists(&self) -> Result<bool> {
        let row = sqlx::query("SELECT name FROM collections WHERE name = ?")
            .bind(&self.collection)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to look up collection"))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl VersionStorage for SqliteStorage {
    async fn save(&self, content: &str, metadata: &VersionMetadata) -> Result<String> {
        let embedding = self.embedder.generate_embeddings(content).await?;
        let id = new_version_id();

        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        sqlx::query("INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)")
            .bind(&self.collection)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to create collection"))?;
        sqlx::query(
            r#"
            INSERT INTO versions (id, collection, content, metadata, embedding)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&self.collection)
        .bind(content)
        .bind(serde_json::to_string(metadata)?)
        .bind(serde_json::to_string(&embedding)?)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store version"))?;
        tx.commit().await.map_err(db_error("Failed to commit version"))?;

        Ok(id)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VersionRecord>> {
        if !self.collection_exists().await? {
            return Err(Error::CollectionNotFound(self.collection.clone()));
        }
        let query_embedding = self.embedder.generate_embeddings(query).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata, embedding FROM versions
            WHERE collection = ?
            ORDER BY rowid
            "#,
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to read versions"))?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata: String = row.try_get("metadata").map_err(db_error("Bad metadata column"))?;
            let embedding: String = row.try_get("embedding").map_err(db_error("Bad embedding column"))?;
            let record = VersionRecord {
                id: row.try_get("id").map_err(db_error("Bad id column"))?,
                content: row.try_get("content").map_err(db_error("Bad content column"))?,
                metadata: serde_json::from_str(&metadata)?,
                score: None,
            };
            candidates.push((record, serde_json::from_str::<Vec<f32>>(&embedding)?));
        }

        Ok(rank_by_similarity(&query_embedding, candidates, limit))
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
