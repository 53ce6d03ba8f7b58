use std::fs;
use std::path::Path;
use std::sync::Arc;
use chrono::Local;
use cf_core::{
    preview, ContentSource, HumanGate, InferenceModel, PageCapture, PipelineConfig, Result,
    Role, Stage, VersionMetadata, VersionRecord, VersionStorage,
};
use cf_inference::TextGenerator;
use tracing::info;
use crate::checkpoint::{CheckpointStore, Run};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: Run,
    pub version_id: String,
    pub retrieved: Vec<VersionRecord>,
}

/// Drives one document through fetch, write, review, edit, persist and retrieve.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn ContentSource>,
    generator: TextGenerator,
    storage: Arc<dyn VersionStorage>,
    gate: Box<dyn HumanGate>,
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn ContentSource>,
        model: Arc<dyn InferenceModel>,
        storage: Arc<dyn VersionStorage>,
        gate: Box<dyn HumanGate>,
    ) -> Result<Self> {
        config.validate()?;
        let generator = TextGenerator::new(model).with_char_limit(config.prompt_char_limit);
        Ok(Self {
            config,
            source,
            generator,
            storage,
            gate,
        })
    }

    /// Run every stage once, in order. The first error ends the run; snapshots
    /// already written stay on disk.
    pub async fn run(&mut self) -> Result<RunReport> {
        let started_at = Local::now();
        let source_url = self.config.source_url.clone();

        let raw_text = self.fetch(&source_url).await?;
        let mut checkpoints = CheckpointStore::create(&self.config.versions_dir, &started_at, &source_url)?;
        checkpoints.save(Stage::Raw, &raw_text)?;

        info!("✍️ Writing draft with {}", self.generator.model().name());
        let draft = self.generator.write(&raw_text).await?;
        checkpoints.save(Stage::Writer, &draft)?;
        let draft = self.gate.request_edit(&draft, Role::Writer)?;
        checkpoints.save(Stage::WriterEdited, &draft)?;

        info!("🧐 Reviewing draft with {}", self.generator.model().name());
        let feedback = self.generator.review(&draft).await?;
        checkpoints.save(Stage::ReviewerFeedback, &feedback)?;
        self.gate.present("AI Reviewer Feedback", &feedback)?;
        let reviewed = self.gate.request_edit(&draft, Role::Reviewer)?;
        checkpoints.save(Stage::ReviewerEdited, &reviewed)?;

        let finalized = self.gate.request_edit(&reviewed, Role::Editor)?;
        checkpoints.save(Stage::Final, &finalized)?;

        let metadata = VersionMetadata::final_version(&source_url);
        let version_id = self.storage.save(&finalized, &metadata).await?;
        info!("🏦 Version saved with ID: {}", version_id);

        let retrieved = self.retrieve().await?;

        Ok(RunReport {
            run: checkpoints.into_run(),
            version_id,
            retrieved,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        info!("🦗 Fetching {} with {}", url, self.source.name());
        let PageCapture { screenshot, text } = self.source.fetch(url).await?;

        write_file(&self.config.screenshot_path, &screenshot)?;
        info!("📸 Screenshot saved to {}", self.config.screenshot_path.display());
        write_file(&self.config.content_path, text.as_bytes())?;
        info!("📄 Content saved to {}", self.config.content_path.display());

        Ok(text)
    }

    async fn retrieve(&mut self) -> Result<Vec<VersionRecord>> {
        let query = self.gate.request_query()?;
        let mut results = self.storage.search(&query, self.config.search_limit).await?;
        if let Some(min_score) = self.config.min_score {
            results.retain(|r| r.score.map_or(true, |score| score >= min_score));
        }

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        info!("🔎 Retrieved version(s): {:?}", ids);

        match results.first() {
            Some(top) => {
                let text = preview(&top.content, self.config.retrieved_preview_chars);
                self.gate.present("Retrieved Content", &text)?;
            }
            None => self.gate.present("Retrieved Content", "No stored version matched the query")?,
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_creates_parents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("shot.png");
        write_file(&path, b"png").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"png");
    }
}
