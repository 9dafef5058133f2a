//! 4:2:2 frame unpacking.
//!
//! Firewire cameras send YUV 4:2:2 as UYVY: two bytes per pixel, one chroma
//! pair shared by every two pixels. Capture buffers hold three bytes per
//! pixel, so drivers expand each pair into `[Y, U, V]` triplets before the
//! device sees the frame. No colour conversion takes place.

use crate::imaging::buffer::{Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};

/// Bytes per pixel in a packed UYVY row
pub const UYVY_BYTES_PER_PIXEL: usize = 2;

/// Expands one packed UYVY row into `[Y, U, V]` triplets.
///
/// A trailing unpaired pixel of an odd-width row is left untouched.
pub fn expand_uyvy_row(packed: &[u8], row: &mut [u8]) {
    for (quad, pair) in packed.chunks_exact(4).zip(row.chunks_exact_mut(6)) {
        let (u, y0, v, y1) = (quad[0], quad[1], quad[2], quad[3]);
        pair.copy_from_slice(&[y0, u, v, y1, u, v]);
    }
}

/// Fills a three-channel `buffer` from a packed UYVY frame of the same size.
pub fn fill_from_uyvy(buffer: &mut PixelBuffer, packed: &[u8]) -> Result<()> {
    if buffer.channels() != Channels::Rgb {
        return Err(CaptureError::ResourceError(format!(
            "4:2:2 frames unpack into three channels, buffer has {}",
            buffer.channels()
        )));
    }

    let packed_stride = buffer.width() * UYVY_BYTES_PER_PIXEL;
    if packed.len() < packed_stride * buffer.height() {
        return Err(CaptureError::InvalidDimensions(buffer.width(), buffer.height()));
    }

    for (y, packed_row) in packed
        .chunks_exact(packed_stride.max(1))
        .take(buffer.height())
        .enumerate()
    {
        expand_uyvy_row(packed_row, buffer.row_mut(y));
    }
    Ok(())
}
