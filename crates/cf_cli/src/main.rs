mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use cf_core::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL_NAME, DEFAULT_SOURCE_URL};
use cf_core::{PipelineConfig, Result};
use cf_pipeline::{ConsoleGate, Pipeline};
use cf_scrapers::BrowserSource;
use cf_storage::{BackendConfig, StorageKind};
use tracing::info;

// No Debug derive: `api_key` must never reach the logs.
#[derive(Parser)]
#[command(author, version, about = "Scrape a chapter, rewrite it with AI and human checkpoints, then store the final version", long_about = None)]
pub struct Cli {
    /// Page to scrape
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    url: String,
    #[arg(long, default_value = "sqlite", help = "Storage backend. Available storages: sqlite (default), memory, chroma")]
    storage: String,
    /// Server URL for remote storage backends
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, default_value = "gemini", help = "Model to use for inference. Available models: gemini (default), dummy")]
    model: String,
    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    model_name: String,
    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value = "book_chapters")]
    collection: String,
    #[arg(long, default_value = "chroma_db")]
    store_dir: PathBuf,
    /// Directory receiving one sub-directory of snapshots per run
    #[arg(long, default_value = "versions")]
    versions_dir: PathBuf,
    #[arg(long, default_value = "chapter1_screenshot.png")]
    screenshot: PathBuf,
    #[arg(long, default_value = "chapter1_content.txt")]
    content: PathBuf,
    /// Number of versions returned by the retrieval search
    #[arg(long, default_value_t = 1)]
    top_n: usize,
    /// Hide retrieved versions scoring below this
    #[arg(long)]
    min_score: Option<f32>,
    /// Open a visible browser window instead of rendering headless
    #[arg(long)]
    show_browser: bool,
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            source_url: self.url.clone(),
            screenshot_path: self.screenshot.clone(),
            content_path: self.content.clone(),
            store_dir: self.store_dir.clone(),
            collection_name: self.collection.clone(),
            versions_dir: self.versions_dir.clone(),
            generation_api_key: self.api_key.clone(),
            generation_model_name: self.model_name.clone(),
            embedding_model_name: self.embedding_model.clone(),
            search_limit: self.top_n,
            min_score: self.min_score,
            ..Default::default()
        }
    }

    fn backend_config(&self) -> BackendConfig {
        let config = BackendConfig::new(&self.store_dir, &self.collection);
        match &self.backend_url {
            Some(url) => config.with_url(url),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = cli.pipeline_config();
    tracing::debug!("Configuration: {:?}", config);

    let model = cf_inference::create_model(&cli.model, &config)?;
    info!("🧠 Inference model initialized successfully (using {})", model.name());

    let kind: StorageKind = cli.storage.parse()?;
    let storage = cf_storage::create_storage(kind, &cli.backend_config(), model.clone()).await?;
    info!("🏦 Storage initialized successfully (collection {})", storage.collection());

    let source = BrowserSource::new().headless(!cli.show_browser);
    let gate = ConsoleGate::stdio(config.preview_chars);
    let mut pipeline = Pipeline::new(config, Arc::new(source), model, storage, Box::new(gate))?;
    let report = pipeline.run().await?;

    info!(
        "✨ Run {} finished: {} snapshots in {}, version {}",
        report.run.id,
        report.run.snapshots.len(),
        report.run.dir.display(),
        report.version_id
    );
    Ok(())
}
