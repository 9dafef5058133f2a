//! Plays a list of RAW photographs as a mosaic frame sequence.
//!
//! Decoding goes through `rawloader`, so every format it knows (ARW, RAF, CR2,
//! NEF, DNG and others) works. Samples are black-level corrected and scaled
//! to 8 bits from the sensor white level.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rawloader::RawImageData as RawloaderImageData;
use tracing::{debug, info, warn};

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::BayerFilter;
use crate::imaging::device::{
    CaptureDriver, ColorMode, Framerate, IsoChannel, Negotiated, VideoFormat, VideoMode,
};

/// Bit depth assumed when the file carries no usable white level.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 sample type
const U16_BITS: u32 = 16;

/// One decoded photograph, scaled to 8 bits.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    /// Packed single-channel mosaic, `width * height` bytes
    pub data: Vec<u8>,
    pub bayer_filter: BayerFilter,
    /// Sensor bit depth derived from the white level
    pub bits_per_sample: u32,
}

/// Turns the bytes of one RAW file into a frame.
pub trait RawFrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<RawFrame>;
}

/// Decoder backed by `rawloader`
#[derive(Debug, Clone, Copy, Default)]
pub struct RawloaderDecoder;

impl RawFrameDecoder for RawloaderDecoder {
    fn decode(&self, data: &[u8]) -> Result<RawFrame> {
        decode_raw_frame(data)
    }
}

/// Sensor bit depth implied by a white level.
pub(crate) fn bits_from_white_level(white_level: u16) -> u32 {
    if white_level == 0 {
        DEFAULT_BITS_PER_SAMPLE
    } else {
        U16_BITS - white_level.leading_zeros()
    }
}

/// Black-level corrects `values` and maps `black..=white` onto `0..=255`.
pub(crate) fn scale_samples(values: &[u16], black_level: u16, white_level: u16) -> Vec<u8> {
    let black = black_level as f32;
    let white = if white_level == 0 {
        u16::MAX as f32
    } else {
        white_level as f32
    };
    let range = (white - black).max(1.0);

    values
        .iter()
        .map(|&v| (((v as f32 - black).max(0.0) / range) * 255.0).round().min(255.0) as u8)
        .collect()
}

/// Bayer filter of the 2x2 tile at the origin of a sensor CFA.
pub(crate) fn filter_from_cfa(cfa: &rawloader::CFA) -> Result<BayerFilter> {
    let tile = [
        [cfa.color_at(0, 0), cfa.color_at(0, 1)],
        [cfa.color_at(1, 0), cfa.color_at(1, 1)],
    ];
    BayerFilter::from_tile(tile)
        .ok_or_else(|| CaptureError::DecodeError(format!("unsupported CFA pattern {}", cfa.name)))
}

/// Decodes a RAW file held in memory.
pub fn decode_raw_frame(data: &[u8]) -> Result<RawFrame> {
    debug!("Decoding RAW image, {} bytes", data.len());

    let decoded = rawloader::decode(&mut Cursor::new(data))
        .map_err(|e| CaptureError::DecodeError(e.to_string()))?;

    if decoded.cpp != 1 {
        return Err(CaptureError::DecodeError(format!(
            "expected a single-channel mosaic, got {} components per pixel",
            decoded.cpp
        )));
    }

    let bayer_filter = filter_from_cfa(&decoded.cfa)?;

    let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
    let bits_per_sample = bits_from_white_level(max_white_level);
    let black_level = decoded.blacklevels.iter().min().copied().unwrap_or(0);

    let data: Vec<u8> = match decoded.data {
        RawloaderImageData::Integer(values) => {
            scale_samples(&values, black_level, max_white_level)
        }
        RawloaderImageData::Float(values) => values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect(),
    };

    debug!(
        "Decoded {}x{} mosaic, CFA={}, {} bits per sample",
        decoded.width, decoded.height, bayer_filter, bits_per_sample
    );

    Ok(RawFrame {
        width: decoded.width,
        height: decoded.height,
        data,
        bayer_filter,
        bits_per_sample,
    })
}

/// Frame source backed by RAW files on disk.
///
/// Only Format7 is offered; the image size and Bayer filter come from the
/// first file. Every file must share that size. Once the last file has been
/// delivered the driver reports itself finished and keeps handing out that
/// last frame.
pub struct RawFileDriver<R: RawFrameDecoder = RawloaderDecoder> {
    decoder: R,
    paths: Vec<PathBuf>,
    next_index: usize,
    /// First file, decoded during negotiation and consumed by the first
    /// `wait_frame`.
    preloaded: Option<RawFrame>,
    current: Option<RawFrame>,
    negotiated: Option<Negotiated>,
    connected: bool,
    transmitting: bool,
    finished: bool,
}

impl RawFileDriver {
    pub fn new<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self::with_decoder(paths, RawloaderDecoder)
    }
}

impl<R: RawFrameDecoder> RawFileDriver<R> {
    pub fn with_decoder<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>, decoder: R) -> Self {
        Self {
            decoder,
            paths: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            next_index: 0,
            preloaded: None,
            current: None,
            negotiated: None,
            connected: false,
            transmitting: false,
            finished: false,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Index of the file the next frame will be decoded from.
    pub fn position(&self) -> usize {
        self.next_index
    }

    fn load(&self, index: usize) -> Result<RawFrame> {
        let path = &self.paths[index];
        let bytes = std::fs::read(path).map_err(|e| {
            CaptureError::DecodeError(format!("{}: {}", path.display(), e))
        })?;
        self.decoder.decode(&bytes).map_err(|e| match e {
            CaptureError::DecodeError(msg) => {
                CaptureError::DecodeError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

impl<R: RawFrameDecoder> CaptureDriver for RawFileDriver<R> {
    fn connect(&mut self, channel: IsoChannel) -> Result<()> {
        if self.paths.is_empty() {
            return Err(CaptureError::ConnectionError(
                "no RAW files to play".to_string(),
            ));
        }
        if let Some(missing) = self.paths.iter().find(|p| !p.is_file()) {
            return Err(CaptureError::ConnectionError(format!(
                "{} does not exist",
                missing.display()
            )));
        }
        debug!("RAW player opened with {} files on {}", self.paths.len(), channel);
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.transmitting = false;
        self.preloaded = None;
        self.current = None;
        self.negotiated = None;
    }

    fn negotiate(
        &mut self,
        format: VideoFormat,
        mode: VideoMode,
        framerate: Framerate,
    ) -> Result<Negotiated> {
        if !self.connected {
            return Err(CaptureError::ConnectionError(
                "RAW player is not open".to_string(),
            ));
        }
        if format != VideoFormat::Format7 || mode.format() != VideoFormat::Format7 {
            return Err(CaptureError::UnsupportedModeError(format!(
                "RAW files only play as Format7, requested format {} mode {}",
                format, mode
            )));
        }

        let first = self.load(0)?;
        let negotiated = Negotiated {
            width: first.width,
            height: first.height,
            color_mode: ColorMode::Greyscale,
            bayer_filter: Some(first.bayer_filter),
        };
        info!(
            "Playing {} RAW files at {}x{} ({} fps requested)",
            self.paths.len(),
            first.width,
            first.height,
            framerate
        );

        self.next_index = 0;
        self.preloaded = Some(first);
        self.current = None;
        self.finished = false;
        self.negotiated = Some(negotiated);
        Ok(negotiated)
    }

    fn start_transmission(&mut self) -> Result<()> {
        if self.negotiated.is_none() {
            return Err(CaptureError::ResourceError(
                "playback started before negotiation".to_string(),
            ));
        }
        self.transmitting = true;
        Ok(())
    }

    fn stop_transmission(&mut self) -> Result<()> {
        self.transmitting = false;
        Ok(())
    }

    fn wait_frame(&mut self, _timeout: Duration) -> Result<()> {
        if !self.transmitting {
            return Err(CaptureError::ResourceError(
                "playback is not running".to_string(),
            ));
        }
        if self.current.is_some() {
            return Ok(());
        }
        if self.next_index >= self.paths.len() {
            return Err(CaptureError::ResourceError(
                "no frame left to play".to_string(),
            ));
        }

        let frame = match self.preloaded.take() {
            Some(frame) => frame,
            None => self.load(self.next_index)?,
        };
        let negotiated = self
            .negotiated
            .ok_or(CaptureError::NotConfigured("negotiated frame size"))?;
        if frame.width != negotiated.width || frame.height != negotiated.height {
            return Err(CaptureError::InvalidDimensions(frame.width, frame.height));
        }
        if Some(frame.bayer_filter) != negotiated.bayer_filter {
            warn!(
                "{} uses CFA {} but the sequence plays as {}",
                self.paths[self.next_index].display(),
                frame.bayer_filter,
                negotiated.bayer_filter.unwrap_or(BayerFilter::None)
            );
        }

        self.next_index += 1;
        if self.next_index == self.paths.len() {
            self.finished = true;
        }
        self.current = Some(frame);
        Ok(())
    }

    fn fill_raw_buffer(&mut self, buffer: &mut PixelBuffer) -> Result<()> {
        let frame = self
            .current
            .as_ref()
            .ok_or_else(|| CaptureError::ResourceError("no frame dequeued".to_string()))?;
        let width = frame.width;
        if buffer.row_stride() == width {
            buffer.fill_from(&frame.data);
            return Ok(());
        }
        for (y, row) in frame.data.chunks_exact(width.max(1)).take(buffer.height()).enumerate() {
            buffer.row_mut(y).copy_from_slice(row);
        }
        Ok(())
    }

    fn release_frame(&mut self) -> Result<()> {
        // The last frame stays current once the sequence is exhausted.
        if !self.finished {
            self.current = None;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
