use async_trait::async_trait;
use std::fmt;
use crate::types::Generation;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Send a prompt to the backend once and return whatever it produced
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    /// Generate embeddings for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;
}
