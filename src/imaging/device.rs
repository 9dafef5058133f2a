//! Capture device module
//!
//! The `Closed -> Opened -> Capturing` state machine shared by all frame
//! sources, the driver seam it runs on and the camera parameter types.

mod camera;
mod config;
mod context;
mod driver;
mod image_device;
pub mod types;

#[cfg(test)]
mod tests;

pub use camera::CaptureDevice;
pub use config::{CaptureConfig, CaptureConfigBuilder};
pub use context::{DeviceContext, IsoChannel};
pub use driver::CaptureDriver;
pub use image_device::ImageDevice;
pub use types::{
    CaptureParameters, ColorMode, DeviceState, Framerate, Negotiated, PixelCoding, VideoFormat,
    VideoMode,
};
