use std::io::Cursor;

use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::imaging::buffer::PixelBuffer;
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::bilinear::check_preconditions;
use crate::imaging::debayer::types::BayerFilter;

/// Demosaics with the `bayer` crate's linear interpolation.
///
/// Unlike the integer bilinear engine this fills the border pixels too, but
/// its output is not bit-compatible with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearDebayer;

impl LinearDebayer {
    pub fn new() -> Self {
        Self
    }

    pub fn process(
        &self,
        source: &PixelBuffer,
        destination: &mut PixelBuffer,
        filter: BayerFilter,
    ) -> Result<()> {
        check_preconditions(source, destination, filter)?;
        let cfa = filter.cfa().ok_or_else(|| {
            CaptureError::PreconditionViolation("no bayer filter selected".to_string())
        })?;

        let width = source.width();
        let height = source.height();
        debug!("Running linear demosaic {}x{}, CFA={}", width, height, filter);

        // The crate reads a packed mosaic and writes a packed raster.
        let mosaic = source.view().to_packed();
        let mut output_buf = vec![0u8; width * height * 3];
        {
            let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth8, &mut output_buf);
            bayer::run_demosaic(
                &mut Cursor::new(&mosaic[..]),
                BayerDepth::Depth8,
                cfa,
                Demosaic::Linear,
                &mut output_raster,
            )
            .map_err(|e| CaptureError::DemosaicError(format!("{:?}", e)))?;
        }

        let line = width * 3;
        if line == 0 {
            return Ok(());
        }
        for (y, packed_row) in output_buf.chunks_exact(line).enumerate() {
            destination.row_mut(y).copy_from_slice(packed_row);
        }

        Ok(())
    }
}
