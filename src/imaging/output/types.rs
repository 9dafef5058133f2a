//! Frame output configuration types

use std::str::FromStr;

use crate::imaging::common::error::CaptureError;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

impl FromStr for TiffCompression {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(TiffCompression::None),
            "lzw" => Ok(TiffCompression::Lzw),
            "deflate-fast" | "deflate" => Ok(TiffCompression::DeflateFast),
            "deflate-balanced" => Ok(TiffCompression::DeflateBalanced),
            "deflate-best" => Ok(TiffCompression::DeflateBest),
            _ => Err(CaptureError::UnsupportedModeError(format!(
                "unknown TIFF compression '{}'",
                s
            ))),
        }
    }
}

/// Configuration for writing captured frames
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing).
    /// Adds processing time, leave at None for maximum speed.
    pub predictor: Option<u16>,
    /// Whether to reject empty or oversized frames before encoding
    pub validate_dimensions: bool,
    pub max_dimension: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            max_dimension: Some(50000),
        }
    }
}

impl OutputConfig {
    pub fn builder() -> OutputConfigBuilder {
        OutputConfigBuilder::default()
    }
}

/// Builder for OutputConfig
#[derive(Default)]
pub struct OutputConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl OutputConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> OutputConfig {
        let default = OutputConfig::default();
        OutputConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
