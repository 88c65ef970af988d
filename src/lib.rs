//! Document stamping and dual-path verification
//!
//! Embeds a tamper-evident integrity marker into PDF documents at
//! registration time and later reconciles a presented artifact, either the
//! file itself or a claimed hash string, against the registry record it
//! asserts. The marker has three faces: a visible footer band with the
//! truncated hash and doc id, a scannable payload image, and machine-readable
//! trailer lines after the document's end-of-file marker.
//!
//! The trailer is a hash-linkage convention, not a cryptographic signature:
//! it authenticates "this artifact matches registry record X", not "this
//! artifact was produced by a trusted issuer". An adversary who can rewrite
//! both the artifact and the registry is out of scope.

// Configuration and shared model
pub mod config;
pub mod error;
pub mod hash_utils;
pub mod types;

// Marker construction
pub mod payload;
pub mod pdf_writer;
pub mod stamper;
pub mod trailer;

// Verification
pub mod registry;
pub mod verify;

// Re-exports for crate consumers
pub use config::StampConfig;
pub use error::{Error, Result};
pub use payload::{PayloadEncoder, VerificationPayload};
pub use registry::{InMemoryRegistry, JsonRegistry, Registry};
pub use stamper::{BatchItem, BatchReport, PdfStamper, StampJob};
pub use trailer::TrailerBinding;
pub use types::{
    CallerContext, DocumentRecord, DocumentStatus, ReasonCode, Role, StampBinding,
    VerificationResult, Verdict,
};
pub use verify::VerificationReconciler;
