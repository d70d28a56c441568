//! Keyed store of saved video transcripts.
//!
//! Stores are constructed by the caller and passed around explicitly; there is
//! no process-wide handle. The solve core never touches them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::io::config::write_atomic;

pub const DEFAULT_STORE_PATH: &str = "cube_db.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub transcript: String,
    #[serde(default)]
    pub url: String,
    /// RFC3339 timestamp of the insert.
    pub added_at: String,
}

impl Transcript {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        channel: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            channel: channel.into(),
            transcript: transcript.into(),
            url: String::new(),
            added_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Case-insensitive substring match over title and transcript text.
    pub fn matches(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.transcript.to_lowercase().contains(&needle)
    }
}

pub trait TranscriptStore {
    fn lookup_by_video_id(&self, video_id: &str) -> Option<&Transcript>;

    /// Insert a record, replacing any existing one with the same `video_id`.
    fn insert(&mut self, transcript: Transcript) -> Result<()>;

    fn search_by_keyword(&self, keyword: &str) -> Vec<&Transcript>;

    /// All records in insertion order.
    fn list_all(&self) -> &[Transcript];
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptStore {
    records: Vec<Transcript>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn lookup_by_video_id(&self, video_id: &str) -> Option<&Transcript> {
        self.records.iter().find(|r| r.video_id == video_id)
    }

    fn insert(&mut self, transcript: Transcript) -> Result<()> {
        match self
            .records
            .iter_mut()
            .find(|r| r.video_id == transcript.video_id)
        {
            Some(existing) => *existing = transcript,
            None => self.records.push(transcript),
        }
        Ok(())
    }

    fn search_by_keyword(&self, keyword: &str) -> Vec<&Transcript> {
        self.records.iter().filter(|r| r.matches(keyword)).collect()
    }

    fn list_all(&self) -> &[Transcript] {
        &self.records
    }
}

/// Records kept in one JSON file: loaded on open, rewritten on every insert.
#[derive(Debug)]
pub struct JsonTranscriptStore {
    path: PathBuf,
    inner: MemoryTranscriptStore,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    transcripts: Vec<Transcript>,
}

impl JsonTranscriptStore {
    /// Open `path`, starting empty if it does not exist yet.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let mut inner = MemoryTranscriptStore::new();
        if path.exists() {
            let contents =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            let file: StoreFile = serde_json::from_str(&contents)
                .with_context(|| format!("parse {}", path.display()))?;
            for record in file.transcripts {
                inner.insert(record)?;
            }
        }
        debug!(records = inner.len(), "opened transcript store");
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn save(&self) -> Result<()> {
        let file = StoreFile {
            transcripts: self.inner.records.clone(),
        };
        let mut buf = serde_json::to_string_pretty(&file).context("serialize transcripts")?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }
}

impl TranscriptStore for JsonTranscriptStore {
    fn lookup_by_video_id(&self, video_id: &str) -> Option<&Transcript> {
        self.inner.lookup_by_video_id(video_id)
    }

    fn insert(&mut self, transcript: Transcript) -> Result<()> {
        self.inner.insert(transcript)?;
        self.save()
    }

    fn search_by_keyword(&self, keyword: &str) -> Vec<&Transcript> {
        self.inner.search_by_keyword(keyword)
    }

    fn list_all(&self) -> &[Transcript] {
        self.inner.list_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Transcript> {
        vec![
            Transcript::new("abc123", "Beginner Cross", "CubeSkills", "Solve the white cross first."),
            Transcript::new("def456", "PLL in depth", "J Perm", "The T perm swaps two corners.")
                .with_url("https://example.invalid/def456"),
        ]
    }

    #[test]
    fn memory_store_lookup_and_search() {
        let mut store = MemoryTranscriptStore::new();
        for record in sample() {
            store.insert(record).expect("insert");
        }
        assert_eq!(store.list_all().len(), 2);
        assert_eq!(
            store.lookup_by_video_id("def456").map(|r| r.title.as_str()),
            Some("PLL in depth")
        );
        assert!(store.lookup_by_video_id("missing").is_none());

        let hits: Vec<&str> = store
            .search_by_keyword("WHITE")
            .iter()
            .map(|r| r.video_id.as_str())
            .collect();
        assert_eq!(hits, vec!["abc123"]);
        assert_eq!(store.search_by_keyword("pll").len(), 1);
        assert!(store.search_by_keyword("OLL").is_empty());
    }

    #[test]
    fn insert_replaces_same_video_id() {
        let mut store = MemoryTranscriptStore::new();
        for record in sample() {
            store.insert(record).expect("insert");
        }
        store
            .insert(Transcript::new("abc123", "Cross v2", "CubeSkills", "updated"))
            .expect("insert");
        assert_eq!(store.len(), 2);
        assert_eq!(store.list_all()[0].title, "Cross v2");
    }

    #[test]
    fn added_at_is_rfc3339() {
        let record = Transcript::new("id", "t", "c", "x");
        assert!(chrono::DateTime::parse_from_rfc3339(&record.added_at).is_ok());
    }

    #[test]
    fn json_store_persists_across_opens() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cube_db.json");

        let mut store = JsonTranscriptStore::open(&path).expect("open");
        assert!(store.is_empty());
        for record in sample() {
            store.insert(record).expect("insert");
        }
        assert!(path.exists());

        let reopened = JsonTranscriptStore::open(&path).expect("reopen");
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.list_all(), store.list_all());
        assert_eq!(
            reopened.lookup_by_video_id("def456").map(|r| r.url.as_str()),
            Some("https://example.invalid/def456")
        );
    }

    #[test]
    fn json_store_rejects_corrupt_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cube_db.json");
        fs::write(&path, "not json").expect("write");
        let err = JsonTranscriptStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
