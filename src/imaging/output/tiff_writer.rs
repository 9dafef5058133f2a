use std::io::{Cursor, Write};

use tiff::encoder::colortype::{ColorType, Gray8, RGB8, RGBA8};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::imaging::buffer::{Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::output::types::{OutputConfig, TiffCompression};
use crate::imaging::output::writer::FrameWriter;

/// Encodes frames as baseline 8-bit TIFF: greyscale as Gray8, RGB as RGB8
/// and RGBA as RGBA8.
pub struct TiffFrameWriter;

impl TiffFrameWriter {
    fn encode<C>(frame: &PixelBuffer, config: &OutputConfig) -> Result<Vec<u8>>
    where
        C: ColorType<Inner = u8>,
    {
        let compression = match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        // The encoder wants tightly packed rows.
        let packed = frame.view().to_packed();

        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
                .map_err(|e| CaptureError::EncodeError(e.to_string()))?
                .with_compression(compression);

            if let Some(predictor_val) = config.predictor {
                let predictor = match predictor_val {
                    2 => Predictor::Horizontal,
                    _ => Predictor::None,
                };
                encoder = encoder.with_predictor(predictor);
            }

            encoder
                .write_image::<C>(frame.width() as u32, frame.height() as u32, &packed)
                .map_err(|e| CaptureError::EncodeError(e.to_string()))?;
        }

        Ok(buffer)
    }
}

impl FrameWriter for TiffFrameWriter {
    fn write_frame(&self, frame: &PixelBuffer, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!(
            "Encoding TIFF frame: {}x{} {}",
            frame.width(),
            frame.height(),
            frame.channels()
        );

        let buffer = match frame.channels() {
            Channels::Greyscale => Self::encode::<Gray8>(frame, config)?,
            Channels::Rgb => Self::encode::<RGB8>(frame, config)?,
            Channels::Rgba => Self::encode::<RGBA8>(frame, config)?,
        };

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
