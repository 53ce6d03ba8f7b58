use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use cf_core::{Error, Result, RunId, Stage, StageSnapshot};

const MAX_RUN_DIR_ATTEMPTS: u32 = 1000;

/// One pipeline execution and the snapshots it has written so far.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub dir: PathBuf,
    pub source_url: String,
    pub snapshots: Vec<StageSnapshot>,
}

impl Run {
    pub fn snapshot(&self, stage: Stage) -> Option<&StageSnapshot> {
        self.snapshots.iter().find(|s| s.stage == stage)
    }
}

/// Writes stage snapshots into `<versions_dir>/<run-id>/`.
///
/// Snapshot files are created exclusively and stages must arrive in
/// pipeline order, so nothing already written can be replaced.
#[derive(Debug)]
pub struct CheckpointStore {
    run: Run,
}

impl CheckpointStore {
    /// Create the run directory. If another run already took the
    /// timestamp-derived name, `_2`, `_3`, ... are tried in turn.
    pub fn create(versions_dir: &Path, started_at: &DateTime<Local>, source_url: &str) -> Result<Self> {
        fs::create_dir_all(versions_dir)?;
        let base = RunId::from_datetime(started_at);

        for attempt in 1..=MAX_RUN_DIR_ATTEMPTS {
            let id = if attempt == 1 { base.clone() } else { base.with_suffix(attempt) };
            let dir = versions_dir.join(id.as_str());
            match fs::create_dir(&dir) {
                Ok(()) => {
                    tracing::info!("📁 Created run directory {}", dir.display());
                    return Ok(Self {
                        run: Run {
                            id,
                            dir,
                            source_url: source_url.to_string(),
                            snapshots: Vec::new(),
                        },
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("Run directory {} already exists", dir.display());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Checkpoint(format!(
            "no free run directory for {} after {} attempts",
            base, MAX_RUN_DIR_ATTEMPTS
        )))
    }

    pub fn save(&mut self, stage: Stage, content: &str) -> Result<PathBuf> {
        if let Some(last) = self.run.snapshots.last() {
            if stage <= last.stage {
                return Err(Error::Checkpoint(format!(
                    "stage {} cannot be saved after {}",
                    stage, last.stage
                )));
            }
        }

        let path = self.run.dir.join(stage.file_name());
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    Error::Checkpoint(format!("{} was already written", path.display()))
                }
                _ => Error::Io(e),
            })?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        self.run.snapshots.push(StageSnapshot {
            run_id: self.run.id.clone(),
            stage,
            content: content.to_string(),
        });
        tracing::info!("💾 Saved {} to {}", stage.file_name(), self.run.dir.display());
        Ok(path)
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn into_run(self) -> Run {
        self.run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn started_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_create_names_directory_after_start_time() {
        let temp_dir = tempdir().unwrap();
        let store = CheckpointStore::create(temp_dir.path(), &started_at(), "https://example.com").unwrap();
        assert_eq!(store.run().id.as_str(), "2024-05-01_10-30-00");
        assert!(store.run().dir.is_dir());
        assert!(store.run().snapshots.is_empty());
    }

    #[test]
    fn test_runs_in_the_same_second_do_not_collide() {
        let temp_dir = tempdir().unwrap();
        let first = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        let second = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        let third = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        assert_eq!(second.run().id.as_str(), "2024-05-01_10-30-00_2");
        assert_eq!(third.run().id.as_str(), "2024-05-01_10-30-00_3");
        assert_ne!(first.run().dir, second.run().dir);
    }

    #[test]
    fn test_save_writes_exact_bytes() {
        let temp_dir = tempdir().unwrap();
        let mut store = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        let content = "línea uno\r\nline two\n\n";
        let path = store.save(Stage::Raw, content).unwrap();
        assert_eq!(path.file_name().unwrap(), "raw.txt");
        assert_eq!(fs::read(&path).unwrap(), content.as_bytes());
        assert_eq!(store.run().snapshot(Stage::Raw).unwrap().content, content);
    }

    #[test]
    fn test_save_rejects_out_of_order_and_repeated_stages() {
        let temp_dir = tempdir().unwrap();
        let mut store = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        store.save(Stage::Raw, "raw").unwrap();
        store.save(Stage::WriterEdited, "edited").unwrap();

        assert!(matches!(store.save(Stage::Writer, "late"), Err(Error::Checkpoint(_))));
        assert!(matches!(store.save(Stage::WriterEdited, "again"), Err(Error::Checkpoint(_))));
        assert_eq!(
            fs::read_to_string(store.run().dir.join("writer_edited.txt")).unwrap(),
            "edited"
        );
        assert!(!store.run().dir.join("writer.txt").exists());
    }

    #[test]
    fn test_existing_file_is_never_overwritten() {
        let temp_dir = tempdir().unwrap();
        let mut store = CheckpointStore::create(temp_dir.path(), &started_at(), "u").unwrap();
        fs::write(store.run().dir.join("final.txt"), "left by hand").unwrap();

        assert!(matches!(store.save(Stage::Final, "new"), Err(Error::Checkpoint(_))));
        assert_eq!(fs::read_to_string(store.run().dir.join("final.txt")).unwrap(), "left by hand");
    }
}
