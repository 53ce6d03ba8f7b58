use std::fmt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use cf_core::{Error, Generation, InferenceModel, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    embedding_model: String,
    base_url: String,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("embedding_model", &self.embedding_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiModel {
    pub fn new(api_key: Option<String>, model_name: &str, embedding_model: &str) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Inference("Gemini API key is required".to_string()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: model_name.to_string(),
            embedding_model: embedding_model.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Pull the generated text out of a `generateContent` response.
///
/// Responses without any text part (safety blocks, empty candidates) fall
/// back to the JSON rendering of the whole response.
pub fn extract_generation(response: &Value) -> Generation {
    let parts = response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let text: Option<String> = parts.and_then(|parts| {
        let texts: Vec<&str> = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    });

    match text {
        Some(text) => Generation::Text(text),
        None => Generation::Fallback(response.to_string()),
    }
}

#[async_trait::async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!("Calling {} with a {} character prompt", self.model_name, prompt.chars().count());
        let response = self.client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model_name))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(extract_generation(&response))
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let response = self.client
            .post(format!("{}/models/{}:embedContent", self.base_url, self.embedding_model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbedContentResponse>()
            .await?;

        Ok(response.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_requires_api_key() {
        let result = GeminiModel::new(None, "gemini-2.5-flash", "text-embedding-004");
        assert_eq!(result.unwrap_err().to_string(), "Inference error: Gemini API key is required");

        let result = GeminiModel::new(Some("  ".to_string()), "gemini-2.5-flash", "text-embedding-004");
        assert!(result.is_err());

        let result = GeminiModel::new(Some("test-key".to_string()), "gemini-2.5-flash", "text-embedding-004");
        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let model = GeminiModel::new(Some("test-key".to_string()), "gemini-2.5-flash", "text-embedding-004").unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("test-key"));
    }

    #[test]
    fn test_extract_generation_joins_text_parts() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Once upon " }, { "text": "a time" }] }
            }]
        });
        assert_eq!(extract_generation(&response), Generation::Text("Once upon a time".to_string()));
    }

    #[test]
    fn test_extract_generation_falls_back_without_text() {
        let response = json!({
            "candidates": [{ "finishReason": "SAFETY" }],
            "promptFeedback": { "blockReason": "OTHER" }
        });
        let generation = extract_generation(&response);
        assert!(generation.is_fallback());
        assert!(generation.as_str().contains("SAFETY"));

        let empty = json!({});
        assert_eq!(extract_generation(&empty), Generation::Fallback("{}".to_string()));
    }
}
