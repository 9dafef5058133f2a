//! Camera parameter types

use std::fmt;
use std::time::Duration;

use crate::imaging::buffer::{BitsPerChannel, Channels};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::BayerFilter;

/// Lifecycle state of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Closed,
    Opened,
    Capturing,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Closed => write!(f, "closed"),
            DeviceState::Opened => write!(f, "opened"),
            DeviceState::Capturing => write!(f, "capturing"),
        }
    }
}

/// IIDC video format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    /// VGA and below
    Format0,
    /// SVGA/XGA
    Format1,
    /// SXGA/UXGA
    Format2,
    /// Scalable, sensor-defined image size
    Format7,
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoFormat::Format0 => "0",
            VideoFormat::Format1 => "1",
            VideoFormat::Format2 => "2",
            VideoFormat::Format7 => "7",
        };
        f.write_str(name)
    }
}

/// IIDC video mode. Format7 modes take their size from the sensor, every
/// other mode fixes resolution and pixel coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoMode {
    Mode0,
    Mode1,
    Mode160x120Yuv444,
    Mode320x240Yuv422,
    Mode640x480Yuv411,
    Mode640x480Yuv422,
    Mode640x480Rgb,
    Mode640x480Mono8,
    Mode640x480Mono16,
    Mode800x600Yuv422,
    Mode800x600Rgb,
    Mode800x600Mono8,
    Mode1024x768Yuv422,
    Mode1024x768Rgb,
    Mode1024x768Mono8,
    Mode800x600Mono16,
    Mode1024x768Mono16,
    Mode1280x960Yuv422,
    Mode1280x960Rgb,
    Mode1280x960Mono8,
    Mode1600x1200Yuv422,
    Mode1600x1200Rgb,
    Mode1600x1200Mono8,
    Mode1280x960Mono16,
    Mode1600x1200Mono16,
}

/// Pixel coding of a video mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelCoding {
    Yuv444,
    Yuv422,
    Yuv411,
    Rgb,
    Mono8,
    Mono16,
    /// Format7 raw sensor output
    Raw8,
}

impl VideoMode {
    pub const ALL: [VideoMode; 25] = [
        VideoMode::Mode0,
        VideoMode::Mode1,
        VideoMode::Mode160x120Yuv444,
        VideoMode::Mode320x240Yuv422,
        VideoMode::Mode640x480Yuv411,
        VideoMode::Mode640x480Yuv422,
        VideoMode::Mode640x480Rgb,
        VideoMode::Mode640x480Mono8,
        VideoMode::Mode640x480Mono16,
        VideoMode::Mode800x600Yuv422,
        VideoMode::Mode800x600Rgb,
        VideoMode::Mode800x600Mono8,
        VideoMode::Mode1024x768Yuv422,
        VideoMode::Mode1024x768Rgb,
        VideoMode::Mode1024x768Mono8,
        VideoMode::Mode800x600Mono16,
        VideoMode::Mode1024x768Mono16,
        VideoMode::Mode1280x960Yuv422,
        VideoMode::Mode1280x960Rgb,
        VideoMode::Mode1280x960Mono8,
        VideoMode::Mode1600x1200Yuv422,
        VideoMode::Mode1600x1200Rgb,
        VideoMode::Mode1600x1200Mono8,
        VideoMode::Mode1280x960Mono16,
        VideoMode::Mode1600x1200Mono16,
    ];

    /// Format this mode belongs to.
    pub fn format(self) -> VideoFormat {
        use VideoMode::*;
        match self {
            Mode0 | Mode1 => VideoFormat::Format7,
            Mode160x120Yuv444 | Mode320x240Yuv422 | Mode640x480Yuv411 | Mode640x480Yuv422
            | Mode640x480Rgb | Mode640x480Mono8 | Mode640x480Mono16 => VideoFormat::Format0,
            Mode800x600Yuv422 | Mode800x600Rgb | Mode800x600Mono8 | Mode1024x768Yuv422
            | Mode1024x768Rgb | Mode1024x768Mono8 | Mode800x600Mono16 | Mode1024x768Mono16 => {
                VideoFormat::Format1
            }
            Mode1280x960Yuv422 | Mode1280x960Rgb | Mode1280x960Mono8 | Mode1600x1200Yuv422
            | Mode1600x1200Rgb | Mode1600x1200Mono8 | Mode1280x960Mono16
            | Mode1600x1200Mono16 => VideoFormat::Format2,
        }
    }

    /// Fixed image size, `None` for Format7 modes.
    pub fn dimensions(self) -> Option<(usize, usize)> {
        use VideoMode::*;
        let size = match self {
            Mode0 | Mode1 => return None,
            Mode160x120Yuv444 => (160, 120),
            Mode320x240Yuv422 => (320, 240),
            Mode640x480Yuv411 | Mode640x480Yuv422 | Mode640x480Rgb | Mode640x480Mono8
            | Mode640x480Mono16 => (640, 480),
            Mode800x600Yuv422 | Mode800x600Rgb | Mode800x600Mono8 | Mode800x600Mono16 => {
                (800, 600)
            }
            Mode1024x768Yuv422 | Mode1024x768Rgb | Mode1024x768Mono8 | Mode1024x768Mono16 => {
                (1024, 768)
            }
            Mode1280x960Yuv422 | Mode1280x960Rgb | Mode1280x960Mono8 | Mode1280x960Mono16 => {
                (1280, 960)
            }
            Mode1600x1200Yuv422 | Mode1600x1200Rgb | Mode1600x1200Mono8
            | Mode1600x1200Mono16 => (1600, 1200),
        };
        Some(size)
    }

    pub fn coding(self) -> PixelCoding {
        use VideoMode::*;
        match self {
            Mode0 | Mode1 => PixelCoding::Raw8,
            Mode160x120Yuv444 => PixelCoding::Yuv444,
            Mode640x480Yuv411 => PixelCoding::Yuv411,
            Mode320x240Yuv422 | Mode640x480Yuv422 | Mode800x600Yuv422 | Mode1024x768Yuv422
            | Mode1280x960Yuv422 | Mode1600x1200Yuv422 => PixelCoding::Yuv422,
            Mode640x480Rgb | Mode800x600Rgb | Mode1024x768Rgb | Mode1280x960Rgb
            | Mode1600x1200Rgb => PixelCoding::Rgb,
            Mode640x480Mono8 | Mode800x600Mono8 | Mode1024x768Mono8 | Mode1280x960Mono8
            | Mode1600x1200Mono8 => PixelCoding::Mono8,
            Mode640x480Mono16 | Mode800x600Mono16 | Mode1024x768Mono16 | Mode1280x960Mono16
            | Mode1600x1200Mono16 => PixelCoding::Mono16,
        }
    }

    /// Filter assumed for a freshly selected mode: mosaic sensors deliver
    /// MONO8 and Format7 Mode0 frames with a red-first tile.
    pub fn default_bayer_filter(self) -> BayerFilter {
        match self {
            VideoMode::Mode0 => BayerFilter::Rggb,
            mode if mode.coding() == PixelCoding::Mono8 => BayerFilter::Rggb,
            _ => BayerFilter::None,
        }
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((width, height)) = self.dimensions() else {
            return match self {
                VideoMode::Mode0 => f.write_str("0"),
                _ => f.write_str("1"),
            };
        };
        let coding = match self.coding() {
            PixelCoding::Yuv444 => "YUV 4:4:4",
            PixelCoding::Yuv422 => "YUV 4:2:2",
            PixelCoding::Yuv411 => "YUV 4:1:1",
            PixelCoding::Rgb => "RGB",
            PixelCoding::Mono8 => "Mono 8bpp",
            PixelCoding::Mono16 => "Mono 16bpp",
            PixelCoding::Raw8 => "Raw 8bpp",
        };
        write!(f, "{}x{} {}", width, height, coding)
    }
}

/// IIDC frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framerate {
    Fps1_875,
    Fps3_75,
    Fps7_5,
    Fps15,
    Fps30,
    Fps60,
    Fps120,
    Fps240,
}

impl Framerate {
    pub const ALL: [Framerate; 8] = [
        Framerate::Fps1_875,
        Framerate::Fps3_75,
        Framerate::Fps7_5,
        Framerate::Fps15,
        Framerate::Fps30,
        Framerate::Fps60,
        Framerate::Fps120,
        Framerate::Fps240,
    ];

    pub fn fps(self) -> f64 {
        match self {
            Framerate::Fps1_875 => 1.875,
            Framerate::Fps3_75 => 3.75,
            Framerate::Fps7_5 => 7.5,
            Framerate::Fps15 => 15.0,
            Framerate::Fps30 => 30.0,
            Framerate::Fps60 => 60.0,
            Framerate::Fps120 => 120.0,
            Framerate::Fps240 => 240.0,
        }
    }

    pub fn frame_interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps())
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Framerate::Fps1_875 => "1.875",
            Framerate::Fps3_75 => "3.75",
            Framerate::Fps7_5 => "7.5",
            Framerate::Fps15 => "15",
            Framerate::Fps30 => "30",
            Framerate::Fps60 => "60",
            Framerate::Fps120 => "120",
            Framerate::Fps240 => "240",
        };
        f.write_str(name)
    }
}

/// How raw frames become RGB output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Frames arrive as RGB and are copied.
    Rgb,
    /// Frames are a single-channel mosaic and need demosaicing.
    Greyscale,
    /// Frames are YUV 4:2:2, unpacked by the driver into `[Y, U, V]`
    /// triplets and handed through unconverted.
    Yuv422,
}

impl ColorMode {
    pub fn from_mode(mode: VideoMode) -> Result<ColorMode> {
        match mode.coding() {
            PixelCoding::Raw8 | PixelCoding::Mono8 => Ok(ColorMode::Greyscale),
            PixelCoding::Rgb => Ok(ColorMode::Rgb),
            PixelCoding::Yuv422 => Ok(ColorMode::Yuv422),
            PixelCoding::Yuv444 | PixelCoding::Yuv411 | PixelCoding::Mono16 => Err(
                CaptureError::UnsupportedModeError(format!("{} is not supported", mode)),
            ),
        }
    }

    /// Channel layout of the raw buffer the driver fills. YUV frames use the
    /// three-channel layout, one `[Y, U, V]` triplet per pixel.
    pub fn raw_channels(self) -> Channels {
        match self {
            ColorMode::Greyscale => Channels::Greyscale,
            ColorMode::Rgb | ColorMode::Yuv422 => Channels::Rgb,
        }
    }
}

/// What the driver agreed to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub width: usize,
    pub height: usize,
    pub color_mode: ColorMode,
    /// Sensor layout reported by the driver, overriding the configured filter.
    pub bayer_filter: Option<BayerFilter>,
}

/// Shape of the frames handed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureParameters {
    pub width: usize,
    pub height: usize,
    pub channels: Channels,
    pub bits_per_channel: BitsPerChannel,
}
