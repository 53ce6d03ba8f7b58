use std::sync::Arc;
use cf_core::{Generation, InferenceModel, Result};
use crate::prompt::{PromptTemplate, DEFAULT_CHAR_LIMIT};

/// Writer and reviewer front-end over an [`InferenceModel`].
pub struct TextGenerator {
    model: Arc<dyn InferenceModel>,
    char_limit: usize,
}

impl TextGenerator {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self {
            model,
            char_limit: DEFAULT_CHAR_LIMIT,
        }
    }

    pub fn with_char_limit(mut self, char_limit: usize) -> Self {
        self.char_limit = char_limit;
        self
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel> {
        &self.model
    }

    /// One backend call, no retry. Backend errors are returned as-is.
    pub async fn generate(&self, template: PromptTemplate, text: &str) -> Result<Generation> {
        let prompt = template.render(text, self.char_limit);
        let generation = self.model.generate(&prompt).await?;
        if generation.is_fallback() {
            tracing::warn!(
                "⚠️ {} returned no text for {:?}, keeping the raw response",
                self.model.name(),
                template
            );
        }
        Ok(generation)
    }

    pub async fn write(&self, text: &str) -> Result<String> {
        Ok(self.generate(PromptTemplate::Rewrite, text).await?.into_text())
    }

    pub async fn review(&self, text: &str) -> Result<String> {
        Ok(self.generate(PromptTemplate::Review, text).await?.into_text())
    }
}
