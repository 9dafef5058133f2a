//! Integer bilinear demosaicing.
//!
//! Every interior output pixel takes its own colour straight from the mosaic
//! and the two missing colours from the unweighted mean of the neighbouring
//! samples of that colour: four diagonal or four cross neighbours where the
//! colour surrounds the pixel, two neighbours (left/right or above/below) at
//! green sites. Means round half up with `(sum + n/2) >> log2(n)`.
//!
//! The outermost ring of output pixels has no full neighbourhood and is set
//! to zero.

use tracing::trace;

use crate::imaging::buffer::{Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::types::BayerFilter;

#[inline]
fn mean2(a: u8, b: u8) -> u8 {
    ((a as u32 + b as u32 + 1) >> 1) as u8
}

#[inline]
fn mean4(a: u8, b: u8, c: u8, d: u8) -> u8 {
    ((a as u32 + b as u32 + c as u32 + d as u32 + 2) >> 2) as u8
}

/// Validates the buffer shapes and the filter for a demosaic run.
pub fn check_preconditions(
    source: &PixelBuffer,
    destination: &PixelBuffer,
    filter: BayerFilter,
) -> Result<()> {
    if source.channels() != Channels::Greyscale {
        return Err(CaptureError::PreconditionViolation(format!(
            "source must be greyscale, got {}",
            source.channels()
        )));
    }
    if destination.channels() != Channels::Rgb {
        return Err(CaptureError::PreconditionViolation(format!(
            "destination must be RGB, got {}",
            destination.channels()
        )));
    }
    if source.width() != destination.width() || source.height() != destination.height() {
        return Err(CaptureError::PreconditionViolation(format!(
            "size mismatch: source {}x{}, destination {}x{}",
            source.width(),
            source.height(),
            destination.width(),
            destination.height()
        )));
    }
    if !filter.is_mosaic() {
        return Err(CaptureError::PreconditionViolation(
            "no bayer filter selected".to_string(),
        ));
    }
    Ok(())
}

/// Converts a greyscale mosaic into RGB.
///
/// # Panics
///
/// When `source` is not greyscale, `destination` is not RGB, their sizes
/// differ or `filter` is [`BayerFilter::None`]. Those are caller bugs; use
/// [`try_debayer`] to get an error instead.
pub fn debayer(source: &PixelBuffer, destination: &mut PixelBuffer, filter: BayerFilter) {
    if let Err(e) = check_preconditions(source, destination, filter) {
        panic!("{}", e);
    }
    run(source, destination, filter);
}

/// Checked form of [`debayer`].
pub fn try_debayer(
    source: &PixelBuffer,
    destination: &mut PixelBuffer,
    filter: BayerFilter,
) -> Result<()> {
    check_preconditions(source, destination, filter)?;
    run(source, destination, filter);
    Ok(())
}

fn run(source: &PixelBuffer, destination: &mut PixelBuffer, filter: BayerFilter) {
    let Some(mut phase) = filter.phase() else {
        return;
    };

    let width = source.width();
    let height = source.height();
    trace!(width, height, %filter, "bilinear debayer");

    if width < 3 || height < 3 {
        for y in 0..height {
            destination.row_mut(y).fill(0);
        }
        return;
    }

    let s = source.row_stride();
    let ds = destination.row_stride();
    let src = source.as_bytes();
    let dst = destination.as_bytes_mut();
    let line = width * 3;

    dst[..line].fill(0);
    dst[(height - 1) * ds..(height - 1) * ds + line].fill(0);

    // `bayer` is the top-left sample of the 3x3 neighbourhood around the
    // output pixel starting at byte `px` of output row `row + 1`.
    for row in 0..height - 2 {
        let row_start = row * s;
        let row_end = row_start + width - 2;
        let out = (row + 1) * ds;

        dst[out..out + 3].fill(0);
        dst[out + line - 3..out + line].fill(0);

        // `near` receives the averages taken along the neighbourhood's first
        // axis, `far` the ones along the second.
        let (near, far) = if phase.blue_right { (0, 2) } else { (2, 0) };

        let mut bayer = row_start;
        let mut px = out + 3;

        if phase.start_with_green {
            dst[px + near] = mean2(src[bayer + 1], src[bayer + 2 * s + 1]);
            dst[px + 1] = src[bayer + s + 1];
            dst[px + far] = mean2(src[bayer + s], src[bayer + s + 2]);
            bayer += 1;
            px += 3;
        }

        while bayer + 2 <= row_end {
            dst[px + near] = mean4(
                src[bayer],
                src[bayer + 2],
                src[bayer + 2 * s],
                src[bayer + 2 * s + 2],
            );
            dst[px + 1] = mean4(
                src[bayer + 1],
                src[bayer + s],
                src[bayer + s + 2],
                src[bayer + 2 * s + 1],
            );
            dst[px + far] = src[bayer + s + 1];

            dst[px + 3 + near] = mean2(src[bayer + 2], src[bayer + 2 * s + 2]);
            dst[px + 4] = src[bayer + s + 2];
            dst[px + 3 + far] = mean2(src[bayer + s + 1], src[bayer + s + 3]);

            bayer += 2;
            px += 6;
        }

        if bayer < row_end {
            dst[px + near] = mean4(
                src[bayer],
                src[bayer + 2],
                src[bayer + 2 * s],
                src[bayer + 2 * s + 2],
            );
            dst[px + 1] = mean4(
                src[bayer + 1],
                src[bayer + s],
                src[bayer + s + 2],
                src[bayer + 2 * s + 1],
            );
            dst[px + far] = src[bayer + s + 1];
        }

        phase.flip();
    }
}
