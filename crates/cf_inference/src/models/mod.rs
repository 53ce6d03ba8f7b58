use std::sync::Arc;
use cf_core::{Error, InferenceModel, PipelineConfig, Result};

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Build the model named by `provider` ("gemini" or "dummy").
pub fn create_model(provider: &str, config: &PipelineConfig) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match provider.to_lowercase().as_str() {
        "gemini" => Arc::new(GeminiModel::new(
            config.generation_api_key.clone(),
            &config.generation_model_name,
            &config.embedding_model_name,
        )?),
        "dummy" => Arc::new(DummyModel::new()),
        other => {
            return Err(Error::Config(format!(
                "Unknown model '{}'. Available models: gemini, dummy",
                other
            )))
        }
    };
    tracing::debug!("Created inference model {:?}", model);
    Ok(model)
}
