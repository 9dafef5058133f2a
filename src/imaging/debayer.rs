//! Debayering module for converting Bayer mosaic frames to RGB

mod bilinear;
mod linear_debayer;
pub mod types;


pub use bilinear::{check_preconditions, debayer, try_debayer};
pub use linear_debayer::LinearDebayer;
pub use types::{BayerFilter, DebayerMethod};

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::Result;

/// Runs `method` from `source` (mosaic) into `destination` (RGB).
pub fn demosaic(
    source: &PixelBuffer,
    destination: &mut PixelBuffer,
    filter: BayerFilter,
    method: DebayerMethod,
) -> Result<()> {
    match method {
        DebayerMethod::Bilinear => try_debayer(source, destination, filter),
        DebayerMethod::Linear => LinearDebayer::new().process(source, destination, filter),
    }
}
