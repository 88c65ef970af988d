//! Machine-readable verification payload
//!
//! Builds the compact payload string binding a document id to its file hash
//! and renders it as a fixed-size scannable QR raster. Pure functions: two
//! calls with the same binding produce byte-identical output, which is what
//! lets an auditor regenerate and compare the payload independently.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::types::StampBinding;

/// Quiet-zone width around the symbol, in modules.
const QUIET_ZONE: u32 = 1;

/// A rendered verification payload: the encoded string and its raster form.
#[derive(Debug, Clone)]
pub struct VerificationPayload {
    /// The exact string the raster encodes; decoding the image yields this.
    pub text: String,
    /// Grayscale PNG, `size` pixels square.
    pub png: Vec<u8>,
    pub size: u32,
}

/// Encoder for the scannable payload.
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Builds the payload string for a binding. A caller-supplied verify URL
    /// wins; otherwise the id and hash are encoded as a query fragment.
    pub fn payload_text(binding: &StampBinding) -> String {
        match &binding.verify_url {
            Some(url) => url.clone(),
            None => format!(
                "doc_id={}&file_hash={}",
                binding.doc_id, binding.file_hash
            ),
        }
    }

    /// Encodes a binding into a payload string and its QR raster at
    /// error-correction level M. Fails with `PayloadTooLarge` when the string
    /// exceeds symbol capacity; the hash is never truncated to make it fit.
    pub fn encode(binding: &StampBinding, config: &StampConfig) -> Result<VerificationPayload> {
        let text = Self::payload_text(binding);
        let code =
            QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M).map_err(
                |e| match e {
                    QrError::DataTooLong => Error::PayloadTooLarge { length: text.len() },
                    other => Error::EncodingFailure(format!("qr encoding failed: {other:?}")),
                },
            )?;

        let size = config.qr_size;
        let pixels = rasterize(&code, size);
        let raster = GrayImage::from_raw(size, size, pixels)
            .ok_or_else(|| Error::EncodingFailure("qr raster buffer mismatch".into()))?;

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(raster)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

        Ok(VerificationPayload { text, png, size })
    }
}

/// Nearest-neighbor scale of the module grid (plus quiet zone) to a fixed
/// square pixel footprint, dark modules as 0x00 and light as 0xff.
fn rasterize(code: &QrCode, size: u32) -> Vec<u8> {
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let grid = modules + 2 * QUIET_ZONE;

    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        let gy = y * grid / size;
        for x in 0..size {
            let gx = x * grid / size;
            let in_symbol = gx >= QUIET_ZONE
                && gx < QUIET_ZONE + modules
                && gy >= QUIET_ZONE
                && gy < QUIET_ZONE + modules;
            let dark = in_symbol && {
                let mx = (gx - QUIET_ZONE) as usize;
                let my = (gy - QUIET_ZONE) as usize;
                colors[my * modules as usize + mx] == Color::Dark
            };
            pixels.push(if dark { 0x00 } else { 0xff });
        }
    }
    pixels
}
