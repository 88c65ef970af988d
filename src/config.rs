//! Configuration types and validation for stamping

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geometry and format settings for the visible footer band, the scannable
/// payload image and the machine-readable trailer suffix.
///
/// All lengths are in PDF points unless noted. Defaults reproduce the
/// production marker layout: a 28pt opaque band near the bottom edge, 10pt
/// Helvetica text, a 64pt QR footprint at the right corner, and a 10-character
/// truncated hash in the visible text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampConfig {
    /// Marker token used in trailer lines (`%%<token>-HASH:` etc.).
    pub product_token: String,
    /// Height of the opaque footer band.
    pub band_height: f64,
    /// Margin between the page edge and the footer text baseline.
    pub margin: f64,
    /// Footer text size.
    pub font_size: f64,
    /// Number of leading hex characters of the hash shown in the footer.
    pub hash_prefix_len: usize,
    /// Pixel edge length of the rendered QR raster.
    pub qr_size: u32,
    /// On-page edge length of the embedded QR image.
    pub qr_footprint: f64,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            product_token: "ACV".to_string(),
            band_height: 28.0,
            margin: 24.0,
            font_size: 10.0,
            hash_prefix_len: 10,
            qr_size: 256,
            qr_footprint: 64.0,
        }
    }
}

impl StampConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: StampConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfiguration(format!("config parse failed: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration before it reaches the stamper.
    pub fn validate(&self) -> Result<()> {
        if self.product_token.is_empty()
            || !self
                .product_token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(Error::InvalidConfiguration(
                "product_token must be non-empty ASCII alphanumerics or hyphens".into(),
            ));
        }
        if self.hash_prefix_len == 0 || self.hash_prefix_len > 64 {
            return Err(Error::InvalidConfiguration(
                "hash_prefix_len must be between 1 and 64".into(),
            ));
        }
        if self.band_height <= 0.0 || self.margin < 0.0 || self.font_size <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "band_height and font_size must be positive, margin non-negative".into(),
            ));
        }
        if self.qr_size < 32 || self.qr_footprint <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "qr_size must be at least 32 pixels and qr_footprint positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StampConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_token() {
        let config = StampConfig {
            product_token: String::new(),
            ..StampConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_oversized_hash_prefix() {
        let config = StampConfig {
            hash_prefix_len: 65,
            ..StampConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
