use std::fmt;
use std::path::PathBuf;
use url::Url;
use crate::{Error, Result};

pub const DEFAULT_SOURCE_URL: &str =
    "https://en.wikisource.org/wiki/The_Gates_of_Morning/Book_1/Chapter_1";
pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Everything a run needs to know, handed to the pipeline at construction.
#[derive(Clone)]
pub struct PipelineConfig {
    pub source_url: String,
    pub screenshot_path: PathBuf,
    pub content_path: PathBuf,
    pub store_dir: PathBuf,
    pub collection_name: String,
    pub versions_dir: PathBuf,
    pub generation_api_key: Option<String>,
    pub generation_model_name: String,
    pub embedding_model_name: String,
    /// Characters of input embedded in a generation prompt
    pub prompt_char_limit: usize,
    /// Characters shown to the operator at a checkpoint
    pub preview_chars: usize,
    /// Characters of a retrieved version shown to the operator
    pub retrieved_preview_chars: usize,
    pub search_limit: usize,
    /// Drop search results scoring below this, when set
    pub min_score: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            screenshot_path: PathBuf::from("chapter1_screenshot.png"),
            content_path: PathBuf::from("chapter1_content.txt"),
            store_dir: PathBuf::from("chroma_db"),
            collection_name: "book_chapters".to_string(),
            versions_dir: PathBuf::from("versions"),
            generation_api_key: None,
            generation_model_name: DEFAULT_MODEL_NAME.to_string(),
            embedding_model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
            prompt_char_limit: 3000,
            preview_chars: 500,
            retrieved_preview_chars: 1000,
            search_limit: 1,
            min_score: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("source_url", &self.source_url)
            .field("screenshot_path", &self.screenshot_path)
            .field("content_path", &self.content_path)
            .field("store_dir", &self.store_dir)
            .field("collection_name", &self.collection_name)
            .field("versions_dir", &self.versions_dir)
            .field("generation_api_key", &self.generation_api_key.as_deref().map(|_| "<redacted>"))
            .field("generation_model_name", &self.generation_model_name)
            .field("embedding_model_name", &self.embedding_model_name)
            .field("prompt_char_limit", &self.prompt_char_limit)
            .field("preview_chars", &self.preview_chars)
            .field("retrieved_preview_chars", &self.retrieved_preview_chars)
            .field("search_limit", &self.search_limit)
            .field("min_score", &self.min_score)
            .finish()
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.source_url, e)))?;
        if self.collection_name.trim().is_empty() {
            return Err(Error::Config("collection name must not be empty".to_string()));
        }
        if self.search_limit == 0 {
            return Err(Error::Config("search limit must be at least 1".to_string()));
        }
        Ok(())
    }
}
