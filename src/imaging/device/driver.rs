use std::time::Duration;

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::Result;
use crate::imaging::device::context::IsoChannel;
use crate::imaging::device::types::{Framerate, Negotiated, VideoFormat, VideoMode};

/// Backend that talks to the actual frame source.
///
/// A [`CaptureDevice`](super::CaptureDevice) calls these in lifecycle order:
/// `connect`, `negotiate`, `start_transmission`, then per frame
/// `wait_frame` + `fill_raw_buffer` and `release_frame`, finally
/// `stop_transmission` and `disconnect`.
pub trait CaptureDriver {
    /// Attaches to the hardware. Fails with `ConnectionError` when there is
    /// nothing to attach to.
    fn connect(&mut self, channel: IsoChannel) -> Result<()>;

    fn disconnect(&mut self);

    /// Agrees on a frame layout for the requested parameters.
    fn negotiate(
        &mut self,
        format: VideoFormat,
        mode: VideoMode,
        framerate: Framerate,
    ) -> Result<Negotiated>;

    fn start_transmission(&mut self) -> Result<()>;

    fn stop_transmission(&mut self) -> Result<()>;

    /// Blocks until a frame is available, at most `timeout`.
    fn wait_frame(&mut self, timeout: Duration) -> Result<()>;

    /// Copies the current frame into `buffer`, which has the negotiated size
    /// and the raw channel layout of the negotiated colour mode.
    ///
    /// Greyscale mosaics take one byte per pixel and RGB three. YUV 4:2:2
    /// frames also take three: the driver expands each UYVY pair into two
    /// `[Y, U, V]` triplets (see `drivers::fill_from_uyvy`).
    fn fill_raw_buffer(&mut self, buffer: &mut PixelBuffer) -> Result<()>;

    /// Gives the current frame back so the next one can arrive.
    fn release_frame(&mut self) -> Result<()>;

    /// True once a finite source has delivered its last frame.
    fn is_finished(&self) -> bool {
        false
    }
}
