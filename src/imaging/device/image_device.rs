use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::Result;
use crate::imaging::device::types::DeviceState;

/// Frame source as seen by consumers.
///
/// The frame returned by [`get_image`](ImageDevice::get_image) borrows the
/// device and is overwritten by the next call.
pub trait ImageDevice {
    fn open(&mut self) -> Result<()>;

    /// Stops capturing if needed and releases the hardware. Always succeeds.
    fn close(&mut self);

    fn capture_start(&mut self) -> Result<()>;

    fn capture_stop(&mut self) -> Result<()>;

    fn capture_next(&mut self) -> Result<()>;

    fn get_image(&mut self) -> Result<&PixelBuffer>;

    fn image_width(&self) -> Result<usize>;

    fn image_height(&self) -> Result<usize>;

    fn state(&self) -> DeviceState;

    fn is_finished(&self) -> bool {
        false
    }
}

impl<T: ImageDevice + ?Sized> ImageDevice for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn capture_start(&mut self) -> Result<()> {
        (**self).capture_start()
    }

    fn capture_stop(&mut self) -> Result<()> {
        (**self).capture_stop()
    }

    fn capture_next(&mut self) -> Result<()> {
        (**self).capture_next()
    }

    fn get_image(&mut self) -> Result<&PixelBuffer> {
        (**self).get_image()
    }

    fn image_width(&self) -> Result<usize> {
        (**self).image_width()
    }

    fn image_height(&self) -> Result<usize> {
        (**self).image_height()
    }

    fn state(&self) -> DeviceState {
        (**self).state()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}
