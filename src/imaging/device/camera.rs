use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::imaging::buffer::{BitsPerChannel, Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::{demosaic, BayerFilter, DebayerMethod};
use crate::imaging::device::config::CaptureConfig;
use crate::imaging::device::context::{DeviceContext, IsoChannel};
use crate::imaging::device::driver::CaptureDriver;
use crate::imaging::device::image_device::ImageDevice;
use crate::imaging::device::types::{
    CaptureParameters, ColorMode, DeviceState, Framerate, Negotiated, VideoFormat, VideoMode,
};

const DEFAULT_FORMAT: VideoFormat = VideoFormat::Format7;
const DEFAULT_MODE: VideoMode = VideoMode::Mode0;
const DEFAULT_FRAMERATE: Framerate = Framerate::Fps15;

/// Camera state machine on top of a [`CaptureDriver`].
///
/// Owns the raw frame buffer the driver fills and the RGB buffer handed to
/// consumers. Mosaic frames are demosaiced into the RGB buffer, RGB and YUV
/// frames are copied unchanged.
pub struct CaptureDevice<D: CaptureDriver> {
    driver: D,
    channel: IsoChannel,
    state: DeviceState,
    format: Option<VideoFormat>,
    mode: Option<VideoMode>,
    framerate: Option<Framerate>,
    bayer_filter: BayerFilter,
    debayer_method: DebayerMethod,
    frame_timeout: Duration,
    negotiated: Option<Negotiated>,
    active_filter: BayerFilter,
    raw: PixelBuffer,
    output: PixelBuffer,
}

impl<D: CaptureDriver> CaptureDevice<D> {
    pub fn new(driver: D, context: &mut DeviceContext, config: CaptureConfig) -> Self {
        let channel = context.allocate_channel();
        debug!("Creating capture device on channel {}", channel);

        let mut device = Self {
            driver,
            channel,
            state: DeviceState::Closed,
            format: None,
            mode: None,
            framerate: None,
            bayer_filter: BayerFilter::Rggb,
            debayer_method: config.debayer_method,
            frame_timeout: config.frame_timeout,
            negotiated: None,
            active_filter: BayerFilter::None,
            raw: PixelBuffer::empty(),
            output: PixelBuffer::empty(),
        };

        if let Some(format) = config.format {
            device.set_video_format(format);
        }
        if let Some(mode) = config.mode {
            device.set_video_mode(mode);
        }
        if let Some(framerate) = config.framerate {
            device.set_video_framerate(framerate);
        }
        if let Some(filter) = config.bayer_filter {
            device.set_bayer_filter(filter);
        }
        device
    }

    /// Selects a format. Mode and framerate must be chosen again afterwards.
    pub fn set_video_format(&mut self, format: VideoFormat) {
        self.format = Some(format);
        self.mode = None;
        self.framerate = None;
    }

    pub fn video_format(&self) -> Result<VideoFormat> {
        self.format.ok_or(CaptureError::NotConfigured("video format"))
    }

    /// Selects a mode, clears the framerate and resets the Bayer filter to
    /// the mode's default.
    pub fn set_video_mode(&mut self, mode: VideoMode) {
        self.mode = Some(mode);
        self.framerate = None;
        self.bayer_filter = mode.default_bayer_filter();
    }

    pub fn video_mode(&self) -> Result<VideoMode> {
        self.mode.ok_or(CaptureError::NotConfigured("video mode"))
    }

    pub fn set_video_framerate(&mut self, framerate: Framerate) {
        self.framerate = Some(framerate);
    }

    pub fn video_framerate(&self) -> Result<Framerate> {
        self.framerate.ok_or(CaptureError::NotConfigured("video framerate"))
    }

    pub fn set_bayer_filter(&mut self, filter: BayerFilter) {
        self.bayer_filter = filter;
    }

    pub fn bayer_filter(&self) -> BayerFilter {
        self.bayer_filter
    }

    pub fn set_debayer_method(&mut self, method: DebayerMethod) {
        self.debayer_method = method;
    }

    pub fn debayer_method(&self) -> DebayerMethod {
        self.debayer_method
    }

    pub fn channel(&self) -> IsoChannel {
        self.channel
    }

    pub fn color_mode(&self) -> Result<ColorMode> {
        self.negotiated
            .map(|n| n.color_mode)
            .ok_or(CaptureError::NotConfigured("color mode"))
    }

    /// Frame shape handed out by [`get_image`](ImageDevice::get_image).
    pub fn capture_parameters(&self) -> Result<CaptureParameters> {
        let negotiated = self
            .negotiated
            .ok_or(CaptureError::NotConfigured("capture parameters"))?;
        Ok(CaptureParameters {
            width: negotiated.width,
            height: negotiated.height,
            channels: Channels::Rgb,
            bits_per_channel: BitsPerChannel::Bpc8,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn negotiate(&mut self) -> Result<(Negotiated, BayerFilter)> {
        let format = self.format.unwrap_or(DEFAULT_FORMAT);
        let mode = self.mode.unwrap_or(DEFAULT_MODE);
        let framerate = self.framerate.unwrap_or(DEFAULT_FRAMERATE);

        if mode.format() != format {
            return Err(CaptureError::UnsupportedModeError(format!(
                "mode {} does not belong to format {}",
                mode, format
            )));
        }
        ColorMode::from_mode(mode)?;

        debug!(
            "Negotiating format {}, mode {}, {} fps",
            format, mode, framerate
        );
        let negotiated = self.driver.negotiate(format, mode, framerate)?;

        if negotiated.width == 0 || negotiated.height == 0 {
            return Err(CaptureError::ResourceError(format!(
                "driver negotiated an empty frame {}x{}",
                negotiated.width, negotiated.height
            )));
        }

        let filter = negotiated.bayer_filter.unwrap_or(self.bayer_filter);
        if negotiated.color_mode == ColorMode::Greyscale && !filter.is_mosaic() {
            return Err(CaptureError::UnsupportedModeError(format!(
                "mode {} delivers a mosaic but no bayer filter is set",
                mode
            )));
        }

        Ok((negotiated, filter))
    }
}

impl<D: CaptureDriver> ImageDevice for CaptureDevice<D> {
    #[instrument(skip(self), fields(channel = %self.channel))]
    fn open(&mut self) -> Result<()> {
        if self.state != DeviceState::Closed {
            return Ok(());
        }
        self.driver.connect(self.channel)?;
        self.state = DeviceState::Opened;
        info!("Device opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.state == DeviceState::Capturing {
            if let Err(e) = self.driver.stop_transmission() {
                warn!("Stopping transmission on close failed: {}", e);
            }
        }
        if self.state != DeviceState::Closed {
            self.driver.disconnect();
            info!(channel = %self.channel, "Device closed");
        }
        self.state = DeviceState::Closed;
        self.negotiated = None;
        self.active_filter = BayerFilter::None;
        self.raw = PixelBuffer::empty();
        self.output = PixelBuffer::empty();
    }

    #[instrument(skip(self), fields(channel = %self.channel))]
    fn capture_start(&mut self) -> Result<()> {
        match self.state {
            DeviceState::Closed => {
                return Err(CaptureError::ConnectionError(
                    "device is not open".to_string(),
                ));
            }
            DeviceState::Capturing => return Err(CaptureError::AlreadyCapturing),
            DeviceState::Opened => {}
        }

        let (negotiated, filter) = self.negotiate()?;
        let raw = PixelBuffer::new(
            negotiated.width,
            negotiated.height,
            negotiated.color_mode.raw_channels(),
        );
        let output = PixelBuffer::new(negotiated.width, negotiated.height, Channels::Rgb);

        self.driver.start_transmission()?;

        self.raw = raw;
        self.output = output;
        self.negotiated = Some(negotiated);
        self.active_filter = filter;
        self.state = DeviceState::Capturing;

        info!(
            width = negotiated.width,
            height = negotiated.height,
            color_mode = ?negotiated.color_mode,
            filter = %filter,
            "Capture started"
        );
        Ok(())
    }

    fn capture_stop(&mut self) -> Result<()> {
        if self.state != DeviceState::Capturing {
            return Err(CaptureError::NotCapturingError(
                "capture_stop called outside capture mode".to_string(),
            ));
        }
        self.driver.stop_transmission()?;
        self.state = DeviceState::Opened;
        info!(channel = %self.channel, "Capture stopped");
        Ok(())
    }

    fn capture_next(&mut self) -> Result<()> {
        if self.state != DeviceState::Capturing {
            return Err(CaptureError::NotCapturingError(
                "capture_next called outside capture mode".to_string(),
            ));
        }
        self.driver.release_frame()
    }

    fn get_image(&mut self) -> Result<&PixelBuffer> {
        if self.state != DeviceState::Capturing {
            return Err(CaptureError::NotCapturingError(
                "get_image called outside capture mode".to_string(),
            ));
        }
        let color_mode = self
            .negotiated
            .map(|n| n.color_mode)
            .ok_or(CaptureError::NotConfigured("color mode"))?;

        self.driver.wait_frame(self.frame_timeout)?;
        self.driver.fill_raw_buffer(&mut self.raw)?;

        match color_mode {
            ColorMode::Greyscale => {
                demosaic(
                    &self.raw,
                    &mut self.output,
                    self.active_filter,
                    self.debayer_method,
                )?;
            }
            ColorMode::Rgb | ColorMode::Yuv422 => self.output.assign(&self.raw),
        }

        Ok(&self.output)
    }

    fn image_width(&self) -> Result<usize> {
        self.negotiated
            .map(|n| n.width)
            .ok_or(CaptureError::NotConfigured("image width"))
    }

    fn image_height(&self) -> Result<usize> {
        self.negotiated
            .map(|n| n.height)
            .ok_or(CaptureError::NotConfigured("image height"))
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }
}

impl<D: CaptureDriver> Drop for CaptureDevice<D> {
    fn drop(&mut self) {
        self.close();
    }
}
