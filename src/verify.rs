//! Verification reconciliation
//!
//! Reconciles a presented artifact (a file or a claimed hash string) against
//! the registry record for its doc id. Both operations share one state
//! machine: lookup, then compare; `not_found` short-circuits only after the
//! lookup, and no path reaches `valid` without an explicit digest equality
//! check. Verdicts are return values; only infrastructure failures are
//! errors, so an outage can never masquerade as a tamper finding.

use tracing::{debug, info};

use crate::config::StampConfig;
use crate::error::Result;
use crate::hash_utils::{digests_match, normalize_digest, sha256_hex};
use crate::registry::Registry;
use crate::trailer;
use crate::types::{CallerContext, StampBinding, VerificationResult};

/// Dual-path verifier over a registry lookup.
pub struct VerificationReconciler<R: Registry> {
    registry: R,
    config: StampConfig,
}

impl<R: Registry> VerificationReconciler<R> {
    pub fn new(registry: R, config: StampConfig) -> Self {
        Self { registry, config }
    }

    /// Verifies a claimed hash string against the record for `doc_id`.
    pub async fn verify_by_hash(
        &self,
        ctx: &CallerContext,
        doc_id: &str,
        claimed_hash: &str,
    ) -> Result<VerificationResult> {
        debug!(doc_id, caller = %ctx.user_id, role = ?ctx.role, "verifying by hash");
        let Some(record) = self.registry.lookup(doc_id).await? else {
            return Ok(VerificationResult::not_found(doc_id));
        };

        let claimed = normalize_digest(claimed_hash);
        let result = if digests_match(&claimed, &record.file_hash) {
            VerificationResult::valid(doc_id, record)
        } else {
            VerificationResult::hash_mismatch(doc_id)
        };
        info!(doc_id, verdict = ?result.verdict, "hash verification finished");
        Ok(result)
    }

    /// Verifies a presented file against the record for `doc_id`.
    ///
    /// The digest is computed over the canonical content region: everything
    /// before the first trailer marker token. For a stamped artifact that
    /// region is byte-identical to the registered original, so an unmodified
    /// copy verifies `valid`; any change to the rendered content legitimately
    /// shifts the digest and is reported as `hash_mismatch`.
    pub async fn verify_by_file(
        &self,
        ctx: &CallerContext,
        doc_id: &str,
        presented: &[u8],
    ) -> Result<VerificationResult> {
        debug!(
            doc_id,
            caller = %ctx.user_id,
            role = ?ctx.role,
            bytes = presented.len(),
            "verifying by file"
        );
        let Some(record) = self.registry.lookup(doc_id).await? else {
            return Ok(VerificationResult::not_found(doc_id));
        };

        let canonical = trailer::canonicalize(presented, &self.config.product_token);
        let digest = sha256_hex(canonical);
        let result = if digests_match(&digest, &record.file_hash) {
            VerificationResult::valid(doc_id, record)
        } else {
            VerificationResult::hash_mismatch(doc_id)
        };
        info!(doc_id, verdict = ?result.verdict, "file verification finished");
        Ok(result)
    }

    /// Recovers the binding asserted by an artifact's trailer lines, without
    /// consulting the registry. Audit aid; never a verification verdict.
    pub fn extract_asserted_binding(&self, artifact: &[u8]) -> Option<StampBinding> {
        trailer::extract_binding(artifact, &self.config.product_token)
            .map(|t| StampBinding::new(t.doc_id, t.file_hash))
    }
}
