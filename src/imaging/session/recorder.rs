use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::device::ImageDevice;
use crate::imaging::output::{FrameWriter, OutputConfig, TiffFrameWriter};
use crate::imaging::session::timing::{SessionTimings, Timer};

/// File name of frame `index` inside a recording directory.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:05}.tiff", index)
}

/// Rejects empty frames and, when a maximum is set, oversized ones.
fn validate_dimensions(config: &OutputConfig, width: usize, height: usize) -> Result<()> {
    if !config.validate_dimensions {
        return Ok(());
    }

    if width == 0 || height == 0 {
        return Err(CaptureError::InvalidDimensions(width, height));
    }

    if let Some(max) = config.max_dimension {
        if width > max || height > max {
            warn!(
                "Frame dimensions {}x{} exceed maximum {}",
                width, height, max
            );
            return Err(CaptureError::InvalidDimensions(width, height));
        }
    }

    Ok(())
}

/// Drives a device through a recording and writes every frame it grabs.
pub struct CaptureSession<D: ImageDevice, W: FrameWriter> {
    device: D,
    writer: W,
    config: OutputConfig,
}

impl<D: ImageDevice> CaptureSession<D, TiffFrameWriter> {
    pub fn new(device: D, config: OutputConfig) -> Self {
        Self {
            device,
            writer: TiffFrameWriter,
            config,
        }
    }
}

impl<D: ImageDevice, W: FrameWriter> CaptureSession<D, W> {
    pub fn with_custom(device: D, writer: W, config: OutputConfig) -> Self {
        Self {
            device,
            writer,
            config,
        }
    }

    /// Grabs the current frame and writes it to `output`. The device must be
    /// capturing; it is not advanced.
    pub fn capture_frame(&mut self, output: &mut dyn Write) -> Result<()> {
        let frame = self.device.get_image()?;
        validate_dimensions(&self.config, frame.width(), frame.height())?;
        self.writer.write_frame(frame, output, &self.config)
    }

    /// Records up to `frames` frames into `directory` as
    /// `frame_00000.tiff`, `frame_00001.tiff`, ...
    ///
    /// Opens the device and starts capturing, stops early when the device
    /// reports it is finished, and always stops capturing before returning.
    #[instrument(skip(self, directory), fields(directory = %directory.as_ref().display()))]
    pub fn record<P: AsRef<Path>>(&mut self, frames: usize, directory: P) -> Result<SessionTimings> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory)?;

        self.device.open()?;
        self.device.capture_start()?;
        info!(frames, "Recording started");

        let mut timings = SessionTimings::new();
        let result = self.record_frames(frames, directory, &mut timings);
        let stopped = self.device.capture_stop();

        result?;
        stopped?;

        info!(frames = timings.frame_count(), "Recording complete");
        Ok(timings)
    }

    fn record_frames(
        &mut self,
        frames: usize,
        directory: &Path,
        timings: &mut SessionTimings,
    ) -> Result<()> {
        for index in 0..frames {
            let _span = tracing::info_span!("frame", index).entered();

            let timer = Timer::start("grab");
            let frame = self.device.get_image()?;
            timings.record(timer);

            validate_dimensions(&self.config, frame.width(), frame.height())?;

            let path: PathBuf = directory.join(frame_file_name(index));
            let timer = Timer::start("encode");
            let mut file = std::fs::File::create(&path)?;
            self.writer.write_frame(frame, &mut file, &self.config)?;
            timings.record(timer);
            timings.count_frame();

            if self.device.is_finished() {
                info!("Source finished after {} frames", index + 1);
                break;
            }

            let timer = Timer::start("advance");
            self.device.capture_next()?;
            timings.record(timer);
        }
        Ok(())
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OutputConfig) {
        self.config = config;
    }

    pub fn into_device(self) -> D {
        self.device
    }
}
