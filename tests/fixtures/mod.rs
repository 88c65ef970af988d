//! In-memory PDF fixtures for stamping and verification tests

use chrono::Utc;
use lopdf::{dictionary, Document, Object, Stream};

use acv::{DocumentRecord, DocumentStatus};

/// Builds a minimal valid PDF with the given number of pages, one text line
/// per page, returned as raw bytes.
pub fn minimal_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for n in 1..=page_count {
        let content = Stream::new(
            dictionary! {},
            format!("BT /F1 24 Tf 72 720 Td (Page {n}) Tj ET").into_bytes(),
        );
        let content_id = doc.add_object(content);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture pdf serialization");
    bytes
}

/// A registry record for a document whose original bytes are `original`.
pub fn record_for(doc_id: &str, original: &[u8]) -> DocumentRecord {
    DocumentRecord {
        doc_id: doc_id.to_string(),
        file_hash: acv::hash_utils::sha256_hex(original),
        title: "Academic Transcript".to_string(),
        owner: "alice".to_string(),
        status: DocumentStatus::Approved,
        uploaded_at: Utc::now(),
    }
}
