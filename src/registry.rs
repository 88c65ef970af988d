//! Registry lookup boundary
//!
//! The registry that owns `DocumentRecord`s is an external collaborator; the
//! core consumes it through the [`Registry`] trait only. A failed lookup is
//! `RegistryUnavailable` and never turns into a verdict.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash_utils::normalize_digest;
use crate::types::{DocumentRecord, DocumentStatus};

/// Lookup capability over the external document registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the record keyed by `doc_id`, or `None` when absent.
    /// `Err` means the backend could not answer, not that the id is unknown.
    async fn lookup(&self, doc_id: &str) -> Result<Option<DocumentRecord>>;
}

/// In-process registry, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: HashMap<String, DocumentRecord>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: DocumentRecord) {
        self.records.insert(record.doc_id.clone(), record);
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn lookup(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        Ok(self.records.get(doc_id).cloned())
    }
}

/// Loosely-shaped record as external exports actually spell it. Normalized
/// into the single canonical [`DocumentRecord`] shape at this boundary; the
/// core never branches on alternative field spellings.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "id")]
    doc_id: String,
    #[serde(alias = "hash", alias = "sha256")]
    file_hash: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    status: DocumentStatus,
    uploaded_at: Option<DateTime<Utc>>,
}

impl From<RawRecord> for DocumentRecord {
    fn from(raw: RawRecord) -> Self {
        DocumentRecord {
            doc_id: raw.doc_id,
            file_hash: normalize_digest(&raw.file_hash),
            title: raw.title,
            owner: raw.owner,
            status: raw.status,
            uploaded_at: raw.uploaded_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Registry backed by a JSON export of records, used by the CLI.
#[derive(Debug)]
pub struct JsonRegistry {
    records: HashMap<String, DocumentRecord>,
}

impl JsonRegistry {
    /// Loads a JSON array of records. A garbled file surfaces as
    /// `RegistryUnavailable`: the backing store exists but cannot answer.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Error::RegistryUnavailable(format!("cannot read registry: {e}")))?;
        let parsed: Vec<RawRecord> = serde_json::from_str(&raw)
            .map_err(|e| Error::RegistryUnavailable(format!("cannot parse registry: {e}")))?;
        let records: HashMap<String, DocumentRecord> = parsed
            .into_iter()
            .map(DocumentRecord::from)
            .map(|r| (r.doc_id.clone(), r))
            .collect();
        debug!(count = records.len(), "registry loaded");
        Ok(Self { records })
    }
}

#[async_trait]
impl Registry for JsonRegistry {
    async fn lookup(&self, doc_id: &str) -> Result<Option<DocumentRecord>> {
        Ok(self.records.get(doc_id).cloned())
    }
}
