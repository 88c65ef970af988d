//! PDF stamping
//!
//! Binds a `{doc_id, file_hash}` marker into a PDF: an opaque footer band
//! with the truncated hash and doc id on every page, the scannable payload
//! image at the page corner, and the machine-readable trailer suffix.
//!
//! The original bytes pass through the stamper untouched. The trailer lines
//! and an incremental-update section are appended after the original
//! end-of-file marker, so stripping the artifact at the first marker token
//! recovers the exact registered bytes. That property is what lets
//! verification re-hash a stamped copy and still match the registry record.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::hash_utils::{is_hex_digest, normalize_digest};
use crate::payload::PayloadEncoder;
use crate::pdf_writer::IncrementalUpdate;
use crate::trailer;
use crate::types::StampBinding;

/// Resource names the stamp registers on each page.
const FONT_RESOURCE: &str = "AcvF";
const IMAGE_RESOURCE: &str = "AcvQ";

/// Vertical inset of the band top relative to the text margin.
const BAND_INSET: f64 = 8.0;
/// Vertical drop of the QR image relative to the text margin.
const QR_DROP: f64 = 4.0;

/// Stamps PDF documents with an integrity marker.
pub struct PdfStamper {
    config: StampConfig,
}

/// One item of a stamping batch.
#[derive(Debug, Clone)]
pub struct StampJob {
    pub name: String,
    pub bytes: Vec<u8>,
    pub binding: StampBinding,
}

/// Per-item batch outcome. A failed item never aborts or corrupts siblings.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub doc_id: String,
    pub result: Result<Vec<u8>>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

struct PageBox {
    x: f64,
    y: f64,
    width: f64,
}

impl PdfStamper {
    pub fn new(config: StampConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Produces the stamped artifact for one document.
    ///
    /// Deterministic for identical inputs: no timestamps or library
    /// serialization enter the output, only the original bytes, the rendered
    /// payload and the appended update section.
    pub fn stamp(&self, original: &[u8], binding: &StampBinding) -> Result<Vec<u8>> {
        let file_hash = normalize_digest(&binding.file_hash);
        if !is_hex_digest(&file_hash) {
            return Err(Error::InvalidConfiguration(
                "binding file_hash must be a 64-character hex digest".into(),
            ));
        }
        let binding = StampBinding {
            doc_id: binding.doc_id.clone(),
            file_hash,
            verify_url: binding.verify_url.clone(),
        };

        let doc = Document::load_mem(original)?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::MalformedDocument("document has no pages".into()));
        }
        let root = doc
            .trailer
            .get(b"Root")
            .and_then(|o| o.as_reference())
            .map_err(|_| Error::MalformedDocument("trailer has no document catalog".into()))?;
        let prev_startxref = last_startxref(original)?;

        debug!(
            doc_id = %binding.doc_id,
            page_count = pages.len(),
            "stamping document"
        );

        let payload = PayloadEncoder::encode(&binding, &self.config)?;
        let raster = image::load_from_memory(&payload.png)?.to_luma8();
        let (qr_width, qr_height) = raster.dimensions();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raster.as_raw())?;
        let qr_data = encoder.finish()?;

        let mut next_id = doc.max_id + 1;
        let mut alloc = || {
            let id: ObjectId = (next_id, 0);
            next_id += 1;
            id
        };

        let font_id = alloc();
        let image_id = alloc();

        let mut update = IncrementalUpdate::new();
        update.add(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
        );
        update.add(
            image_id,
            Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => qr_width as i64,
                    "Height" => qr_height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                qr_data,
            )),
        );

        let footer_text = format!(
            "Doc: {} \u{2022} SHA-256: {}\u{2026}",
            binding.doc_id,
            &binding.file_hash[..self.config.hash_prefix_len]
        );

        let mut stamped_pages: Vec<ObjectId> = Vec::new();
        for page_id in pages.values() {
            if stamped_pages.contains(page_id) {
                continue;
            }
            stamped_pages.push(*page_id);

            let page_dict = doc
                .get_object(*page_id)
                .and_then(|o| o.as_dict())
                .map_err(|_| {
                    Error::MalformedDocument("page object is not a dictionary".into())
                })?
                .clone();

            let page_box = page_box(&doc, *page_id);
            let content_id = alloc();
            update.add(
                content_id,
                Object::Stream(Stream::new(
                    Dictionary::new(),
                    self.footer_ops(&page_box, &footer_text),
                )),
            );

            let mut contents = page_contents(&doc, &page_dict);
            contents.push(Object::Reference(content_id));

            let mut new_page = page_dict;
            new_page.set("Contents", Object::Array(contents));
            new_page.set(
                "Resources",
                Object::Dictionary(merged_resources(&doc, *page_id, font_id, image_id)),
            );
            update.add(*page_id, Object::Dictionary(new_page));
        }

        let suffix = trailer::render_suffix(&binding, &self.config.product_token);
        let base_offset = original.len() + suffix.len();
        let update_bytes = update.render(base_offset, root, prev_startxref, next_id);

        let mut artifact =
            Vec::with_capacity(original.len() + suffix.len() + update_bytes.len());
        artifact.extend_from_slice(original);
        artifact.extend_from_slice(&suffix);
        artifact.extend_from_slice(&update_bytes);

        info!(
            doc_id = %binding.doc_id,
            pages = stamped_pages.len(),
            artifact_bytes = artifact.len(),
            "document stamped"
        );
        Ok(artifact)
    }

    /// Stamps a batch, one item at a time. Partial success is a normal
    /// outcome; a malformed file is reported on its item and the rest of the
    /// batch proceeds.
    pub fn stamp_batch(&self, jobs: &[StampJob]) -> BatchReport {
        let mut items = Vec::with_capacity(jobs.len());
        for job in jobs {
            let result = self.stamp(&job.bytes, &job.binding);
            if let Err(error) = &result {
                warn!(name = %job.name, doc_id = %job.binding.doc_id, %error, "batch item failed");
            }
            items.push(BatchItem {
                name: job.name.clone(),
                doc_id: job.binding.doc_id.clone(),
                result,
            });
        }
        let report = BatchReport { items };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch stamping finished"
        );
        report
    }

    /// Content stream operators for one page's footer band, text and QR.
    fn footer_ops(&self, page: &PageBox, text: &str) -> Vec<u8> {
        let c = &self.config;
        let band_y = page.y + c.margin - BAND_INSET;
        let text_x = page.x + c.margin;
        let text_y = page.y + c.margin;
        let qr_x = page.x + page.width - c.qr_footprint - c.margin;
        let qr_y = page.y + c.margin - QR_DROP;

        let mut ops = Vec::new();
        ops.extend_from_slice(
            format!(
                "q\n0.95 0.95 0.95 rg\n{} {} {} {} re\nf\nQ\n",
                page.x, band_y, page.width, c.band_height
            )
            .as_bytes(),
        );
        ops.extend_from_slice(
            format!(
                "BT\n/{FONT_RESOURCE} {} Tf\n0.2 0.2 0.2 rg\n{text_x} {text_y} Td\n",
                c.font_size
            )
            .as_bytes(),
        );
        ops.push(b'(');
        ops.extend_from_slice(&encode_win_ansi(text));
        ops.extend_from_slice(b") Tj\nET\n");
        ops.extend_from_slice(
            format!(
                "q\n{} 0 0 {} {qr_x} {qr_y} cm\n/{IMAGE_RESOURCE} Do\nQ\n",
                c.qr_footprint, c.qr_footprint
            )
            .as_bytes(),
        );
        ops
    }
}

/// Footer text as a WinAnsi literal string body, with PDF escaping applied.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let byte = match ch {
            '\u{2022}' => 0x95, // bullet
            '\u{2026}' => 0x85, // horizontal ellipsis
            c if c.is_ascii() && !c.is_ascii_control() => c as u8,
            _ => b'?',
        };
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

/// Finds the value of the document's last `startxref` so the appended
/// trailer can chain back to it.
fn last_startxref(bytes: &[u8]) -> Result<u64> {
    let tail_len = bytes.len().min(2048);
    let tail = &bytes[bytes.len() - tail_len..];
    let pos = tail
        .windows(b"startxref".len())
        .rposition(|w| w == b"startxref")
        .ok_or_else(|| Error::MalformedDocument("missing startxref".into()))?;
    let mut digits = String::new();
    for &byte in &tail[pos + b"startxref".len()..] {
        if byte.is_ascii_digit() {
            digits.push(byte as char);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits
        .parse::<u64>()
        .map_err(|_| Error::MalformedDocument("unparseable startxref offset".into()))
}

/// Resolves the effective media box, walking the page tree for inherited
/// values. Falls back to US Letter when the tree carries none.
fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(|o| o.as_dict()) else {
            break;
        };
        if let Some(bounds) = media_box(doc, dict) {
            return bounds;
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    PageBox {
        x: 0.0,
        y: 0.0,
        width: 612.0,
    }
}

fn media_box(doc: &Document, dict: &Dictionary) -> Option<PageBox> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = number(&arr[0])?;
    let lly = number(&arr[1])?;
    let urx = number(&arr[2])?;
    Some(PageBox {
        x: llx,
        y: lly,
        width: urx - llx,
    })
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Collects the page's existing content stream references so the footer
/// stream can be appended without disturbing them.
fn page_contents(doc: &Document, page_dict: &Dictionary) -> Vec<Object> {
    match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Effective page resources with the stamp's font and image entries merged
/// in. Inherited and referenced resource dictionaries are flattened into the
/// replacement page object so existing entries keep resolving.
fn merged_resources(
    doc: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
    image_id: ObjectId,
) -> Dictionary {
    let mut resources = effective_resources(doc, page_id);

    let mut fonts = take_subdictionary(doc, &mut resources, b"Font");
    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut xobjects = take_subdictionary(doc, &mut resources, b"XObject");
    xobjects.set(IMAGE_RESOURCE, Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    resources
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(|o| o.as_dict()) else {
            break;
        };
        if let Ok(raw) = dict.get(b"Resources") {
            let resolved = match raw {
                Object::Reference(rid) => doc
                    .get_object(*rid)
                    .and_then(|o| o.as_dict())
                    .ok()
                    .cloned(),
                Object::Dictionary(d) => Some(d.clone()),
                _ => None,
            };
            if let Some(resources) = resolved {
                return resources;
            }
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    Dictionary::new()
}

fn take_subdictionary(doc: &Document, resources: &mut Dictionary, key: &[u8]) -> Dictionary {
    match resources.remove(key) {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .and_then(|o| o.as_dict())
            .ok()
            .cloned()
            .unwrap_or_else(Dictionary::new),
        _ => Dictionary::new(),
    }
}
