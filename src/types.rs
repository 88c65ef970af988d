//! Shared data model for stamping and verification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of a registered document. The verification core carries this
/// opaquely; it never influences a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl Default for DocumentStatus {
    fn default() -> Self {
        DocumentStatus::Submitted
    }
}

/// A registry record, read-only from this crate's perspective.
///
/// `file_hash` is the lowercase hex SHA-256 of the canonical original bytes
/// and is immutable once set; records are uniquely keyed by `doc_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub file_hash: String,
    pub title: String,
    pub owner: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// The binding a stamp asserts: which registry record the artifact belongs
/// to, and the digest of the *original, unstamped* input bytes. Stamping
/// never alters the hash the marker asserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampBinding {
    pub doc_id: String,
    pub file_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_url: Option<String>,
}

impl StampBinding {
    pub fn new(doc_id: impl Into<String>, file_hash: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            file_hash: file_hash.into(),
            verify_url: None,
        }
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = Some(url.into());
        self
    }
}

/// Explicit caller identity, supplied per operation. Replaces the ambient
/// per-process identity headers the surrounding application used to attach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerContext {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Verifier,
    Admin,
}

/// Terminal verdicts of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    NotFound,
}

/// Why a verdict of `invalid` was reached. The reason states only what was
/// detected; it deliberately does not claim a cause (tampering, wrong
/// document and corrupted transfer are indistinguishable here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    HashMismatch,
}

/// Outcome of one verification call. Created fresh per call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verdict: Verdict,
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<DocumentRecord>,
}

impl VerificationResult {
    pub fn valid(doc_id: impl Into<String>, record: DocumentRecord) -> Self {
        Self {
            verdict: Verdict::Valid,
            doc_id: doc_id.into(),
            reason: None,
            record: Some(record),
        }
    }

    pub fn hash_mismatch(doc_id: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Invalid,
            doc_id: doc_id.into(),
            reason: Some(ReasonCode::HashMismatch),
            record: None,
        }
    }

    pub fn not_found(doc_id: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::NotFound,
            doc_id: doc_id.into(),
            reason: None,
            record: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict == Verdict::Valid
    }
}
