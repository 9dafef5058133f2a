use std::io::Write;

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::Result;
use crate::imaging::output::types::OutputConfig;

pub trait FrameWriter {
    fn write_frame(&self, frame: &PixelBuffer, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
}
