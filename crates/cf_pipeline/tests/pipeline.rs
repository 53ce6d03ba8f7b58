use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cf_core::{
    ContentSource, Error, Generation, InferenceModel, PageCapture, PipelineConfig, Result, Role,
    Stage, VersionStorage,
};
use cf_inference::models::DummyModel;
use cf_pipeline::{AcceptAll, GateEvent, Pipeline, ScriptedGate};
use cf_storage::MemoryStorage;
use tempfile::TempDir;

struct StubSource {
    capture: Option<PageCapture>,
}

#[async_trait]
impl ContentSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch(&self, _url: &str) -> Result<PageCapture> {
        self.capture
            .clone()
            .ok_or_else(|| Error::Scraping("navigation failed".to_string()))
    }
}

#[derive(Debug)]
struct BrokenModel;

#[async_trait]
impl InferenceModel for BrokenModel {
    fn name(&self) -> &str {
        "Broken"
    }

    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        Err(Error::Inference("backend unavailable".to_string()))
    }

    async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }
}

fn config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        source_url: "https://example.com/chapter1".to_string(),
        screenshot_path: dir.path().join("out").join("chapter1_screenshot.png"),
        content_path: dir.path().join("out").join("chapter1_content.txt"),
        store_dir: dir.path().join("store"),
        versions_dir: dir.path().join("versions"),
        ..Default::default()
    }
}

fn source(text: &str) -> Arc<dyn ContentSource> {
    Arc::new(StubSource {
        capture: Some(PageCapture {
            screenshot: b"\x89PNG fake".to_vec(),
            text: text.to_string(),
        }),
    })
}

fn memory_storage(config: &PipelineConfig) -> Arc<MemoryStorage> {
    Arc::new(MemoryStorage::new(&config.collection_name, Arc::new(DummyModel::new())))
}

fn run_dirs(versions_dir: &Path) -> Vec<std::path::PathBuf> {
    match fs::read_dir(versions_dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_run_writes_six_snapshots_and_retrieves_final() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let storage = memory_storage(&config);
    let gate = ScriptedGate::new(
        vec![None, Some("Reviewer rewrite".to_string()), Some("Hello\nWorld".to_string())],
        vec!["hello world".to_string()],
    );
    let log = gate.log();

    let mut pipeline = Pipeline::new(
        config.clone(),
        source("The sea was calm.\nThe ship sailed on."),
        Arc::new(DummyModel::new()),
        storage.clone(),
        Box::new(gate),
    )
    .unwrap();
    let report = pipeline.run().await.unwrap();

    let stages: Vec<Stage> = report.run.snapshots.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());

    let mut expected: Vec<String> = Stage::ALL.iter().map(|s| s.file_name().to_string()).collect();
    expected.sort();
    assert_eq!(file_names(&report.run.dir), expected);

    for snapshot in &report.run.snapshots {
        let written = fs::read(report.run.dir.join(snapshot.stage.file_name())).unwrap();
        assert_eq!(written, snapshot.content.as_bytes(), "{} differs", snapshot.stage);
    }

    let content = |stage| report.run.snapshot(stage).unwrap().content.as_str();
    assert_eq!(content(Stage::Raw), "The sea was calm.\nThe ship sailed on.");
    assert_eq!(content(Stage::Writer), "[dummy] The sea was calm. The ship sailed on.");
    assert_eq!(content(Stage::WriterEdited), content(Stage::Writer));
    assert!(content(Stage::ReviewerFeedback).starts_with("[dummy] [dummy]"));
    assert_eq!(content(Stage::ReviewerEdited), "Reviewer rewrite");
    assert_eq!(content(Stage::Final), "Hello\nWorld");

    assert_eq!(fs::read(&config.screenshot_path).unwrap(), b"\x89PNG fake");
    assert_eq!(
        fs::read_to_string(&config.content_path).unwrap(),
        "The sea was calm.\nThe ship sailed on."
    );

    assert_eq!(report.retrieved.len(), 1);
    assert_eq!(report.retrieved[0].id, report.version_id);
    assert_eq!(report.retrieved[0].content, "Hello\nWorld");
    assert_eq!(report.retrieved[0].metadata.source_url, "https://example.com/chapter1");
    assert_eq!(report.retrieved[0].metadata.role, "final_version");

    let edit = |role, stage| GateEvent::Edit {
        role,
        text: content(stage).to_string(),
    };
    let present = |heading: &str, text: &str| GateEvent::Present {
        heading: heading.to_string(),
        text: text.to_string(),
    };
    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            edit(Role::Writer, Stage::Writer),
            present("AI Reviewer Feedback", content(Stage::ReviewerFeedback)),
            edit(Role::Reviewer, Stage::WriterEdited),
            edit(Role::Editor, Stage::ReviewerEdited),
            GateEvent::Query("hello world".to_string()),
            present("Retrieved Content", "Hello\nWorld"),
        ]
    );
}

#[tokio::test]
async fn test_reviewer_edits_the_writer_edited_draft() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let gate = ScriptedGate::new(
        vec![Some("Operator draft".to_string()), None, None],
        vec!["draft".to_string()],
    );
    let log = gate.log();
    let mut pipeline = Pipeline::new(
        config.clone(),
        source("machine text"),
        Arc::new(DummyModel::new()),
        memory_storage(&config),
        Box::new(gate),
    )
    .unwrap();
    let report = pipeline.run().await.unwrap();

    let feedback = &report.run.snapshot(Stage::ReviewerFeedback).unwrap().content;
    assert_eq!(feedback, "[dummy] Operator draft");
    assert_eq!(report.run.snapshot(Stage::ReviewerEdited).unwrap().content, "Operator draft");

    let events = log.lock().unwrap().clone();
    let feedback_at = events
        .iter()
        .position(|e| matches!(e, GateEvent::Present { heading, .. } if heading == "AI Reviewer Feedback"))
        .unwrap();
    let reviewer_at = events
        .iter()
        .position(|e| matches!(e, GateEvent::Edit { role: Role::Reviewer, .. }))
        .unwrap();
    assert!(feedback_at < reviewer_at);
    assert_eq!(
        events[reviewer_at],
        GateEvent::Edit {
            role: Role::Reviewer,
            text: "Operator draft".to_string()
        }
    );
}

#[tokio::test]
async fn test_long_retrieved_version_is_previewed() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        retrieved_preview_chars: 10,
        ..config(&dir)
    };
    let final_text = "reef ".repeat(10);
    let gate = ScriptedGate::new(vec![None, None, Some(final_text.clone())], vec!["reef".to_string()]);
    let log = gate.log();
    let mut pipeline = Pipeline::new(
        config.clone(),
        source("text"),
        Arc::new(DummyModel::new()),
        memory_storage(&config),
        Box::new(gate),
    )
    .unwrap();
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.retrieved[0].content, final_text);
    let events = log.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&GateEvent::Present {
            heading: "Retrieved Content".to_string(),
            text: "reef reef  ... [truncated]".to_string()
        })
    );
}

#[tokio::test]
async fn test_page_without_body_still_produces_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let mut pipeline = Pipeline::new(
        config.clone(),
        source(""),
        Arc::new(DummyModel::new()),
        memory_storage(&config),
        Box::new(AcceptAll::new("anything")),
    )
    .unwrap();
    let report = pipeline.run().await.unwrap();

    assert!(config.screenshot_path.exists());
    assert_eq!(fs::read_to_string(&config.content_path).unwrap(), "");
    assert_eq!(report.run.snapshot(Stage::Raw).unwrap().content, "");
}

#[tokio::test]
async fn test_fetch_failure_writes_no_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let storage = memory_storage(&config);
    let mut pipeline = Pipeline::new(
        config.clone(),
        Arc::new(StubSource { capture: None }),
        Arc::new(DummyModel::new()),
        storage.clone(),
        Box::new(AcceptAll::default()),
    )
    .unwrap();

    assert!(matches!(pipeline.run().await, Err(Error::Scraping(_))));
    assert!(run_dirs(&config.versions_dir).is_empty());
    assert!(!config.screenshot_path.exists());
    assert!(matches!(storage.search("x", 1).await, Err(Error::CollectionNotFound(_))));
}

#[tokio::test]
async fn test_generation_failure_keeps_earlier_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let storage = memory_storage(&config);
    let mut pipeline = Pipeline::new(
        config.clone(),
        source("chapter text"),
        Arc::new(BrokenModel),
        storage.clone(),
        Box::new(AcceptAll::default()),
    )
    .unwrap();

    assert!(matches!(pipeline.run().await, Err(Error::Inference(_))));
    let runs = run_dirs(&config.versions_dir);
    assert_eq!(runs.len(), 1);
    assert_eq!(file_names(&runs[0]), vec!["raw.txt".to_string()]);
    assert!(storage.search("chapter", 1).await.is_err());
}

#[tokio::test]
async fn test_min_score_filters_unrelated_matches() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        min_score: Some(0.99),
        ..config(&dir)
    };
    let gate = ScriptedGate::new(
        vec![None, None, Some("lagoon island reef".to_string())],
        vec!["quarterly earnings".to_string()],
    );
    let log = gate.log();
    let mut pipeline = Pipeline::new(
        config.clone(),
        source("text"),
        Arc::new(DummyModel::new()),
        memory_storage(&config),
        Box::new(gate),
    )
    .unwrap();

    let report = pipeline.run().await.unwrap();
    assert!(report.retrieved.is_empty());
    assert!(!report.version_id.is_empty());
    assert_eq!(
        log.lock().unwrap().last(),
        Some(&GateEvent::Present {
            heading: "Retrieved Content".to_string(),
            text: "No stored version matched the query".to_string()
        })
    );
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        source_url: "nowhere".to_string(),
        ..config(&dir)
    };
    let result = Pipeline::new(
        config.clone(),
        source("text"),
        Arc::new(DummyModel::new()),
        memory_storage(&config),
        Box::new(AcceptAll::default()),
    );
    assert!(matches!(result, Err(Error::InvalidUrl(_))));
}
