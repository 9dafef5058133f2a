use std::time::Duration;

use crate::imaging::debayer::{BayerFilter, DebayerMethod};
use crate::imaging::device::types::{Framerate, VideoFormat, VideoMode};

/// Initial camera settings.
///
/// Unset format, mode and framerate stay unset on the device and fall back
/// to Format7 / Mode0 / 15 fps when capture starts.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub format: Option<VideoFormat>,
    pub mode: Option<VideoMode>,
    pub framerate: Option<Framerate>,
    pub bayer_filter: Option<BayerFilter>,
    pub debayer_method: DebayerMethod,
    pub frame_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: None,
            mode: None,
            framerate: None,
            bayer_filter: None,
            debayer_method: DebayerMethod::Bilinear,
            frame_timeout: Duration::from_secs(1),
        }
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct CaptureConfigBuilder {
    format: Option<VideoFormat>,
    mode: Option<VideoMode>,
    framerate: Option<Framerate>,
    bayer_filter: Option<BayerFilter>,
    debayer_method: Option<DebayerMethod>,
    frame_timeout: Option<Duration>,
}

impl CaptureConfigBuilder {
    pub fn format(mut self, format: VideoFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn mode(mut self, mode: VideoMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn framerate(mut self, framerate: Framerate) -> Self {
        self.framerate = Some(framerate);
        self
    }

    pub fn bayer_filter(mut self, filter: BayerFilter) -> Self {
        self.bayer_filter = Some(filter);
        self
    }

    pub fn debayer_method(mut self, method: DebayerMethod) -> Self {
        self.debayer_method = Some(method);
        self
    }

    pub fn frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> CaptureConfig {
        let default = CaptureConfig::default();
        CaptureConfig {
            format: self.format,
            mode: self.mode,
            framerate: self.framerate,
            bayer_filter: self.bayer_filter,
            debayer_method: self.debayer_method.unwrap_or(default.debayer_method),
            frame_timeout: self.frame_timeout.unwrap_or(default.frame_timeout),
        }
    }
}
