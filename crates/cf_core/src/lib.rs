pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod source;
pub mod storage;
pub mod types;

pub use config::PipelineConfig;
pub use error::Error;
pub use gate::HumanGate;
pub use models::InferenceModel;
pub use source::ContentSource;
pub use storage::VersionStorage;
pub use types::{
    Generation, PageCapture, Role, RunId, Stage, StageSnapshot, VersionMetadata, VersionRecord,
};

pub type Result<T> = std::result::Result<T, Error>;

/// First `limit` characters of `text`, counted in chars rather than bytes.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `truncate_chars` for display: marks the cut with " ... [truncated]", and
/// only when something was actually cut.
pub fn preview(text: &str, limit: usize) -> String {
    let head = truncate_chars(text, limit);
    if head.len() < text.len() {
        format!("{} ... [truncated]", head)
    } else {
        head.to_string()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
