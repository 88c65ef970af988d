//! Machine-readable trailer suffix
//!
//! Every stamped artifact ends with a short run of comment lines of the form
//! `%%<TOKEN>-HASH:<hex>` / `%%<TOKEN>-DOCID:<id>`, placed after the original
//! document's end-of-file marker. PDF readers resolve the document from the
//! final `startxref`, so the lines never affect rendering, while an auditor
//! can recover the asserted binding with a plain byte scan and no PDF parser.
//!
//! The suffix is also the canonicalization boundary: everything from the
//! first marker token onward is stripped before re-hashing a presented file,
//! which makes the hashed region byte-identical to the original upload.

use regex::bytes::Regex;

use crate::types::StampBinding;

/// The binding recovered from an artifact's trailer lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerBinding {
    pub file_hash: String,
    pub doc_id: String,
}

fn hash_marker(token: &str) -> String {
    format!("%%{token}-HASH:")
}

/// Renders the suffix lines for a binding, newline-terminated, with no other
/// bytes interspersed. The caller appends this directly after the original
/// bytes; nothing may be inserted before the first marker token, or the
/// canonical content region would no longer equal the original.
pub fn render_suffix(binding: &StampBinding, token: &str) -> Vec<u8> {
    format!(
        "%%{token}-HASH:{}\n%%{token}-DOCID:{}\n",
        binding.file_hash, binding.doc_id
    )
    .into_bytes()
}

/// Strips everything from the first trailer marker token onward. For bytes
/// that carry no marker this is the identity, so unstamped originals hash
/// unchanged.
pub fn canonicalize<'a>(bytes: &'a [u8], token: &str) -> &'a [u8] {
    let marker = hash_marker(token);
    match find_subslice(bytes, marker.as_bytes()) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

/// Recovers the asserted binding from an artifact by byte-scan. Scans the
/// whole buffer rather than a tail window: the incremental update section
/// that draws the visible footer follows the marker lines and can be large.
pub fn extract_binding(bytes: &[u8], token: &str) -> Option<TrailerBinding> {
    let escaped = regex::escape(token);
    let hash_re = Regex::new(&format!("%%{escaped}-HASH:([0-9a-fA-F]{{64}})"))
        .expect("trailer hash pattern");
    let docid_re =
        Regex::new(&format!("%%{escaped}-DOCID:([^\r\n]+)")).expect("trailer docid pattern");

    let file_hash = hash_re
        .captures(bytes)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_ascii_lowercase())?;
    let doc_id = docid_re
        .captures(bytes)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())?;

    Some(TrailerBinding { file_hash, doc_id })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
