use std::fmt;
use cf_core::{Generation, InferenceModel, Result};

const EMBEDDING_SIZE: usize = 256;

/// Offline model: echoes the prompt body and embeds text as hashed word counts.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

// FNV-1a, stable across runs and platforms
fn bucket(token: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % EMBEDDING_SIZE as u64) as usize
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let body = prompt.split_once("\n\n").map(|(_, body)| body).unwrap_or(prompt);
        // Take the first 20 words, like a very lazy writer
        let words: Vec<&str> = body.split_whitespace().take(20).collect();
        Ok(Generation::Text(format!("[dummy] {}", words.join(" "))))
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; EMBEDDING_SIZE];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            embedding[bucket(&token.to_lowercase())] += 1.0;
        }

        let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(embedding)
    }
}
