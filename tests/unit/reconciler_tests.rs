//! Wire-contract and registry-boundary tests

use std::fs;

use acv::hash_utils::sha256_hex;
use acv::{
    CallerContext, Error, JsonRegistry, Registry, Role, StampConfig, VerificationReconciler,
    VerificationResult, Verdict,
};

use crate::fixtures::{minimal_pdf, record_for};

fn ctx() -> CallerContext {
    CallerContext {
        user_id: "auditor-9".to_string(),
        role: Role::Admin,
    }
}

#[test]
fn verification_result_wire_shape() {
    let record = record_for("doc-001", b"original");
    let valid = VerificationResult::valid("doc-001", record);
    let json = serde_json::to_value(&valid).unwrap();
    assert_eq!(json["verdict"], "valid");
    assert_eq!(json["doc_id"], "doc-001");
    assert!(json.get("reason").is_none());
    assert_eq!(json["record"]["status"], "APPROVED");

    let mismatch = VerificationResult::hash_mismatch("doc-001");
    let json = serde_json::to_value(&mismatch).unwrap();
    assert_eq!(json["verdict"], "invalid");
    assert_eq!(json["reason"], "hash_mismatch");
    assert!(json.get("record").is_none());

    let missing = VerificationResult::not_found("doc-x");
    let json = serde_json::to_value(&missing).unwrap();
    assert_eq!(json["verdict"], "not_found");
}

#[tokio::test]
async fn json_registry_normalizes_external_shapes() {
    let original = minimal_pdf(1);
    let digest = sha256_hex(&original).to_ascii_uppercase();
    let path = std::env::temp_dir().join(format!("acv-registry-{}.json", std::process::id()));
    fs::write(
        &path,
        format!(
            r#"[{{"id": "doc-001", "sha256": "{digest}", "title": "Transcript", "owner": "alice", "status": "APPROVED"}}]"#
        ),
    )
    .unwrap();

    let registry = JsonRegistry::load(&path).unwrap();
    let record = registry.lookup("doc-001").await.unwrap().unwrap();
    // Stored lowercase regardless of the export's casing.
    assert_eq!(record.file_hash, digest.to_ascii_lowercase());

    let reconciler = VerificationReconciler::new(registry, StampConfig::default());
    let result = reconciler
        .verify_by_file(&ctx(), "doc-001", &original)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Valid);

    fs::remove_file(&path).ok();
}

#[test]
fn missing_registry_file_is_unavailable_not_a_verdict() {
    let outcome = JsonRegistry::load("/nonexistent/acv-records.json");
    assert!(matches!(outcome, Err(Error::RegistryUnavailable(_))));
}

#[test]
fn garbled_registry_file_is_unavailable() {
    let path = std::env::temp_dir().join(format!("acv-garbled-{}.json", std::process::id()));
    fs::write(&path, "{ not json ").unwrap();
    let outcome = JsonRegistry::load(&path);
    assert!(matches!(outcome, Err(Error::RegistryUnavailable(_))));
    fs::remove_file(&path).ok();
}
