use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single pipeline run, derived from its start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub const FORMAT: &'static str = "%Y-%m-%d_%H-%M-%S";

    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format(Self::FORMAT).to_string())
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Variant used when the plain id is already taken on disk.
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}_{}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The content-producing steps of a run, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Raw,
    Writer,
    WriterEdited,
    ReviewerFeedback,
    ReviewerEdited,
    Final,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Raw,
        Stage::Writer,
        Stage::WriterEdited,
        Stage::ReviewerFeedback,
        Stage::ReviewerEdited,
        Stage::Final,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Stage::Raw => "raw.txt",
            Stage::Writer => "writer.txt",
            Stage::WriterEdited => "writer_edited.txt",
            Stage::ReviewerFeedback => "reviewer_feedback.txt",
            Stage::ReviewerEdited => "reviewer_edited.txt",
            Stage::Final => "final.txt",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Writer => "writer",
            Stage::WriterEdited => "writer_edited",
            Stage::ReviewerFeedback => "reviewer_feedback",
            Stage::ReviewerEdited => "reviewer_edited",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub run_id: RunId,
    pub stage: Stage,
    pub content: String,
}

/// Who is looking at the text at a human checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Writer,
    Reviewer,
    Editor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Writer => "Writer",
            Role::Reviewer => "Reviewer",
            Role::Editor => "Editor",
        };
        f.write_str(name)
    }
}

/// What a content source hands back for one URL.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    pub screenshot: Vec<u8>,
    pub text: String,
}

/// Result of one call to a generative backend.
///
/// `Fallback` holds the string form of a response that carried no text
/// payload; callers keep going with it instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Fallback(String),
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Generation::Fallback(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Generation::Text(text) | Generation::Fallback(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Generation::Text(text) | Generation::Fallback(text) => text,
        }
    }
}

pub const FINAL_VERSION_ROLE: &str = "final_version";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub timestamp: String,
    pub source_url: String,
    pub role: String,
}

impl VersionMetadata {
    pub fn final_version(source_url: &str) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            source_url: source_url.to_string(),
            role: FINAL_VERSION_ROLE.to_string(),
        }
    }

    /// Flat key/value view used by stores that only accept string maps.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from_iter(vec![
            ("timestamp".to_string(), serde_json::Value::String(self.timestamp.clone())),
            ("source_url".to_string(), serde_json::Value::String(self.source_url.clone())),
            ("role".to_string(), serde_json::Value::String(self.role.clone())),
        ])
    }

    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let field = |key: &str| {
            map.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            timestamp: field("timestamp"),
            source_url: field("source_url"),
            role: field("role"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub content: String,
    pub metadata: VersionMetadata,
    /// Similarity to the query that produced this record, if it came from a search.
    pub score: Option<f32>,
}
