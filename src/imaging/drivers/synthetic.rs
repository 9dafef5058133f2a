use std::time::Duration;

use tracing::{debug, trace};

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::BayerFilter;
use crate::imaging::device::{
    CaptureDriver, ColorMode, Framerate, IsoChannel, Negotiated, VideoFormat, VideoMode,
};
use crate::imaging::drivers::yuv::{fill_from_uyvy, UYVY_BYTES_PER_PIXEL};

/// Simulated firewire camera.
///
/// Produces a deterministic test scene that drifts horizontally by a few
/// pixels per frame. Mosaic modes sample the scene through the sensor
/// filter and RGB modes deliver it as interleaved RGB. YUV 4:2:2 modes send
/// UYVY packets whose luma is the scene's first channel and whose chroma is
/// the second and third channel of the even pixel in each pair.
#[derive(Debug, Clone)]
pub struct SyntheticDriver {
    present: bool,
    supported_modes: Vec<VideoMode>,
    format7_size: (usize, usize),
    sensor_filter: Option<BayerFilter>,
    fail_transmission: bool,
    frame_budget: Option<u64>,
    channel: Option<IsoChannel>,
    negotiated: Option<Negotiated>,
    transmitting: bool,
    frame_ready: bool,
    frame_index: u64,
}

impl Default for SyntheticDriver {
    fn default() -> Self {
        Self {
            present: true,
            supported_modes: VideoMode::ALL.to_vec(),
            format7_size: (640, 480),
            sensor_filter: None,
            fail_transmission: false,
            frame_budget: None,
            channel: None,
            negotiated: None,
            transmitting: false,
            frame_ready: false,
            frame_index: 0,
        }
    }
}

impl SyntheticDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera that is not plugged in: `connect` fails.
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::default()
        }
    }

    pub fn with_supported_modes(mut self, modes: &[VideoMode]) -> Self {
        self.supported_modes = modes.to_vec();
        self
    }

    pub fn with_format7_size(mut self, width: usize, height: usize) -> Self {
        self.format7_size = (width, height);
        self
    }

    /// Fixes the sensor layout and reports it during negotiation. Without it
    /// the scene is mosaicked red-first and the device's own filter is used.
    pub fn with_sensor_filter(mut self, filter: BayerFilter) -> Self {
        self.sensor_filter = Some(filter);
        self
    }

    pub fn with_failing_transmission(mut self) -> Self {
        self.fail_transmission = true;
        self
    }

    /// Delivers `frames` frames, then times out.
    pub fn with_frame_budget(mut self, frames: u64) -> Self {
        self.frame_budget = Some(frames);
        self
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame_index
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    /// Scene value of `channel` at (`x`, `y`) in frame `frame`.
    pub fn scene_sample(x: usize, y: usize, channel: usize, frame: u64) -> u8 {
        let shifted = x as u64 + frame * 4;
        let value = match channel {
            0 => shifted * 3,
            1 => y as u64 * 2 + 16,
            _ => (shifted + y as u64) * 5 / 4,
        };
        (value % 256) as u8
    }

    fn mosaic_filter(&self) -> BayerFilter {
        self.sensor_filter.unwrap_or(BayerFilter::Rggb)
    }

    /// The scene as a packed UYVY frame, as the camera would put it on the bus.
    fn render_uyvy(width: usize, height: usize, frame: u64) -> Vec<u8> {
        let mut packed = Vec::with_capacity(width * height * UYVY_BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let pair = x - x % 2;
                let chroma = if x % 2 == 0 { 1 } else { 2 };
                packed.push(Self::scene_sample(pair, y, chroma, frame));
                packed.push(Self::scene_sample(x, y, 0, frame));
            }
        }
        packed
    }
}

impl CaptureDriver for SyntheticDriver {
    fn connect(&mut self, channel: IsoChannel) -> Result<()> {
        if !self.present {
            return Err(CaptureError::ConnectionError(
                "no synthetic camera attached".to_string(),
            ));
        }
        debug!("Synthetic camera connected on {}", channel);
        self.channel = Some(channel);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.channel = None;
        self.negotiated = None;
        self.transmitting = false;
        self.frame_ready = false;
    }

    fn negotiate(
        &mut self,
        format: VideoFormat,
        mode: VideoMode,
        framerate: Framerate,
    ) -> Result<Negotiated> {
        if self.channel.is_none() {
            return Err(CaptureError::ConnectionError(
                "synthetic camera is not connected".to_string(),
            ));
        }
        if !self.supported_modes.contains(&mode) {
            return Err(CaptureError::UnsupportedModeError(format!(
                "camera does not offer mode {} in format {}",
                mode, format
            )));
        }

        let color_mode = ColorMode::from_mode(mode)?;
        let (width, height) = mode.dimensions().unwrap_or(self.format7_size);
        let negotiated = Negotiated {
            width,
            height,
            color_mode,
            bayer_filter: self.sensor_filter,
        };
        debug!(
            "Synthetic camera negotiated {}x{} {:?} at {} fps",
            width, height, color_mode, framerate
        );
        self.negotiated = Some(negotiated);
        Ok(negotiated)
    }

    fn start_transmission(&mut self) -> Result<()> {
        if self.fail_transmission {
            return Err(CaptureError::ResourceError(
                "isochronous bandwidth exhausted".to_string(),
            ));
        }
        if self.negotiated.is_none() {
            return Err(CaptureError::ResourceError(
                "transmission started before negotiation".to_string(),
            ));
        }
        self.transmitting = true;
        self.frame_ready = false;
        Ok(())
    }

    fn stop_transmission(&mut self) -> Result<()> {
        self.transmitting = false;
        self.frame_ready = false;
        Ok(())
    }

    fn wait_frame(&mut self, timeout: Duration) -> Result<()> {
        if !self.transmitting {
            return Err(CaptureError::ResourceError(
                "camera is not transmitting".to_string(),
            ));
        }
        if let Some(budget) = self.frame_budget {
            if self.frame_index >= budget {
                return Err(CaptureError::FrameTimeout(timeout));
            }
        }
        self.frame_ready = true;
        Ok(())
    }

    fn fill_raw_buffer(&mut self, buffer: &mut PixelBuffer) -> Result<()> {
        if !self.frame_ready {
            return Err(CaptureError::ResourceError("no frame dequeued".to_string()));
        }
        let frame = self.frame_index;
        trace!(frame, "Rendering synthetic frame");

        let color_mode = self
            .negotiated
            .map(|n| n.color_mode)
            .ok_or(CaptureError::NotConfigured("negotiated colour mode"))?;

        match color_mode {
            ColorMode::Yuv422 => {
                let packed = Self::render_uyvy(buffer.width(), buffer.height(), frame);
                fill_from_uyvy(buffer, &packed)?;
            }
            ColorMode::Greyscale => {
                let filter = self.mosaic_filter();
                for y in 0..buffer.height() {
                    for (x, sample) in buffer.row_mut(y).iter_mut().enumerate() {
                        let channel = filter.channel_at(x, y).unwrap_or(1);
                        *sample = Self::scene_sample(x, y, channel, frame);
                    }
                }
            }
            ColorMode::Rgb => {
                let count = buffer.channels().count();
                for y in 0..buffer.height() {
                    for (x, pixel) in buffer.row_mut(y).chunks_exact_mut(count).enumerate() {
                        for (channel, sample) in pixel.iter_mut().take(3).enumerate() {
                            *sample = Self::scene_sample(x, y, channel, frame);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn release_frame(&mut self) -> Result<()> {
        if self.frame_ready {
            self.frame_ready = false;
            self.frame_index += 1;
        }
        Ok(())
    }
}
