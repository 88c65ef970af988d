//! End-to-end stamping and verification tests

use acv::hash_utils::sha256_hex;
use acv::{
    CallerContext, Error, InMemoryRegistry, PdfStamper, ReasonCode, Role, StampBinding,
    StampConfig, StampJob, VerificationReconciler, Verdict,
};
use lopdf::Document;

use crate::fixtures::{minimal_pdf, record_for};

fn ctx() -> CallerContext {
    CallerContext {
        user_id: "verifier-1".to_string(),
        role: Role::Verifier,
    }
}

fn stamper() -> PdfStamper {
    PdfStamper::new(StampConfig::default()).unwrap()
}

fn reconciler_for(
    records: Vec<acv::DocumentRecord>,
) -> VerificationReconciler<InMemoryRegistry> {
    let mut registry = InMemoryRegistry::new();
    for record in records {
        registry.insert(record);
    }
    VerificationReconciler::new(registry, StampConfig::default())
}

#[tokio::test]
async fn round_trip_stamped_file_verifies_valid() {
    let original = minimal_pdf(1);
    let record = record_for("doc-001", &original);
    let binding = StampBinding::new("doc-001", record.file_hash.clone());

    let artifact = stamper().stamp(&original, &binding).unwrap();
    let reconciler = reconciler_for(vec![record]);

    let result = reconciler
        .verify_by_file(&ctx(), "doc-001", &artifact)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Valid);
    assert_eq!(result.record.unwrap().doc_id, "doc-001");
}

#[tokio::test]
async fn unstamped_original_also_verifies_valid() {
    let original = minimal_pdf(1);
    let record = record_for("doc-001", &original);
    let reconciler = reconciler_for(vec![record]);

    let result = reconciler
        .verify_by_file(&ctx(), "doc-001", &original)
        .await
        .unwrap();
    assert!(result.is_valid());
}

#[test]
fn trailer_carries_untruncated_binding_lines() {
    let original = minimal_pdf(1);
    let file_hash = sha256_hex(&original);
    let binding = StampBinding::new("doc-001", file_hash.clone());

    let artifact = stamper().stamp(&original, &binding).unwrap();
    let expected_hash_line = format!("%%ACV-HASH:{file_hash}\n");
    let expected_docid_line = "%%ACV-DOCID:doc-001\n";

    let haystack = String::from_utf8_lossy(&artifact);
    assert!(haystack.contains(&expected_hash_line));
    assert!(haystack.contains(expected_docid_line));
}

#[test]
fn stamped_artifact_still_parses_with_same_page_count() {
    let original = minimal_pdf(3);
    let binding = StampBinding::new("doc-002", sha256_hex(&original));

    let artifact = stamper().stamp(&original, &binding).unwrap();
    let doc = Document::load_mem(&artifact).expect("stamped artifact must stay parseable");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);

    // Every page now carries the stamp's font and image resources.
    for page_id in pages.values() {
        let page = doc
            .get_object(*page_id)
            .and_then(|o| o.as_dict())
            .expect("page dictionary");
        let resources = page
            .get(b"Resources")
            .and_then(|o| o.as_dict())
            .expect("page resources");
        let fonts = resources.get(b"Font").and_then(|o| o.as_dict()).unwrap();
        assert!(fonts.has(b"AcvF"));
        let xobjects = resources.get(b"XObject").and_then(|o| o.as_dict()).unwrap();
        assert!(xobjects.has(b"AcvQ"));
    }
}

#[test]
fn stamping_is_deterministic() {
    let original = minimal_pdf(1);
    let binding = StampBinding::new("doc-003", sha256_hex(&original));
    let stamper = stamper();

    let first = stamper.stamp(&original, &binding).unwrap();
    let second = stamper.stamp(&original, &binding).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn flipping_a_content_byte_yields_hash_mismatch() {
    let original = minimal_pdf(1);
    let record = record_for("doc-004", &original);
    let binding = StampBinding::new("doc-004", record.file_hash.clone());

    let mut artifact = stamper().stamp(&original, &binding).unwrap();
    // Flip one byte inside the original content region, well before the
    // trailer marker.
    let target = original.len() / 2;
    artifact[target] ^= 0x01;

    let reconciler = reconciler_for(vec![record]);
    let result = reconciler
        .verify_by_file(&ctx(), "doc-004", &artifact)
        .await
        .unwrap();
    assert_eq!(result.verdict, Verdict::Invalid);
    assert_eq!(result.reason, Some(ReasonCode::HashMismatch));
}

#[tokio::test]
async fn verify_by_hash_needs_no_file() {
    let original = minimal_pdf(1);
    let record = record_for("doc-005", &original);
    let claimed = record.file_hash.to_ascii_uppercase();
    let reconciler = reconciler_for(vec![record]);

    let result = reconciler
        .verify_by_hash(&ctx(), "doc-005", &claimed)
        .await
        .unwrap();
    assert!(result.is_valid());
}

#[tokio::test]
async fn unknown_doc_id_is_not_found_on_both_paths() {
    let reconciler = reconciler_for(vec![]);

    let by_hash = reconciler
        .verify_by_hash(&ctx(), "nonexistent-id", &sha256_hex(b"anything"))
        .await
        .unwrap();
    assert_eq!(by_hash.verdict, Verdict::NotFound);

    let by_file = reconciler
        .verify_by_file(&ctx(), "nonexistent-id", &minimal_pdf(1))
        .await
        .unwrap();
    assert_eq!(by_file.verdict, Verdict::NotFound);
}

#[test]
fn malformed_input_is_rejected() {
    let binding = StampBinding::new("doc-006", sha256_hex(b"whatever"));
    let outcome = stamper().stamp(b"this is not a pdf", &binding);
    assert!(matches!(outcome, Err(Error::MalformedDocument(_))));
}

#[tokio::test]
async fn batch_reports_partial_failure_without_corrupting_siblings() {
    let stamper = stamper();
    let mut jobs = Vec::new();
    let mut records = Vec::new();

    for n in 0..4usize {
        let doc_id = format!("doc-10{n}");
        let bytes = if n == 2 {
            b"corrupted upload".to_vec()
        } else {
            minimal_pdf(1 + n)
        };
        records.push(record_for(&doc_id, &bytes));
        jobs.push(StampJob {
            name: format!("upload-{n}.pdf"),
            binding: StampBinding::new(doc_id, sha256_hex(&bytes)),
            bytes,
        });
    }

    let report = stamper.stamp_batch(&jobs);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.items[2].result,
        Err(Error::MalformedDocument(_))
    ));

    // The three surviving artifacts still verify cleanly.
    let reconciler = reconciler_for(records);
    for item in report.items.iter().filter(|i| i.result.is_ok()) {
        let artifact = item.result.as_ref().unwrap();
        let result = reconciler
            .verify_by_file(&ctx(), &item.doc_id, artifact)
            .await
            .unwrap();
        assert!(result.is_valid(), "artifact {} must verify", item.doc_id);
    }
}

#[test]
fn extracted_binding_matches_what_was_stamped() {
    let original = minimal_pdf(1);
    let file_hash = sha256_hex(&original);
    let binding = StampBinding::new("doc-007", file_hash.clone());

    let artifact = stamper().stamp(&original, &binding).unwrap();
    let recovered = acv::trailer::extract_binding(&artifact, "ACV").unwrap();
    assert_eq!(recovered.doc_id, "doc-007");
    assert_eq!(recovered.file_hash, file_hash);
}
