use cf_core::{cosine_similarity, VersionRecord};

pub mod memory;

#[cfg(feature = "chroma")]
pub mod chroma;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStorage;

#[cfg(feature = "chroma")]
pub use chroma::ChromaStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

pub(crate) fn new_version_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Score every candidate against `query` and keep the best `limit`.
/// The sort is stable, so equal scores stay in insertion order.
pub(crate) fn rank_by_similarity(
    query: &[f32],
    candidates: Vec<(VersionRecord, Vec<f32>)>,
    limit: usize,
) -> Vec<VersionRecord> {
    let mut scored: Vec<VersionRecord> = candidates
        .into_iter()
        .map(|(mut record, embedding)| {
            record.score = Some(cosine_similarity(query, &embedding));
            record
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .unwrap_or_default()
            .total_cmp(&a.score.unwrap_or_default())
    });
    scored.truncate(limit);
    scored
}
