use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::imaging::buffer::{Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::device::{
    CaptureConfig, CaptureDevice, DeviceContext, DeviceState, ImageDevice,
};
use crate::imaging::drivers::SyntheticDriver;
use crate::imaging::output::{FrameWriter, OutputConfig};
use crate::imaging::session::{frame_file_name, CaptureSession, SessionTimings};

type CallLog = Arc<Mutex<Vec<String>>>;

struct MockDevice {
    state: DeviceState,
    frame: PixelBuffer,
    frame_index: usize,
    finish_after: Option<usize>,
    fail_grab_at: Option<usize>,
    calls: CallLog,
}

impl MockDevice {
    fn new(width: usize, height: usize, calls: CallLog) -> Self {
        Self {
            state: DeviceState::Closed,
            frame: PixelBuffer::new(width, height, Channels::Rgb),
            frame_index: 0,
            finish_after: None,
            fail_grab_at: None,
            calls,
        }
    }

    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl ImageDevice for MockDevice {
    fn open(&mut self) -> Result<()> {
        self.log("open");
        self.state = DeviceState::Opened;
        Ok(())
    }

    fn close(&mut self) {
        self.log("close");
        self.state = DeviceState::Closed;
    }

    fn capture_start(&mut self) -> Result<()> {
        self.log("start");
        self.state = DeviceState::Capturing;
        Ok(())
    }

    fn capture_stop(&mut self) -> Result<()> {
        self.log("stop");
        self.state = DeviceState::Opened;
        Ok(())
    }

    fn capture_next(&mut self) -> Result<()> {
        self.log("next");
        self.frame_index += 1;
        Ok(())
    }

    fn get_image(&mut self) -> Result<&PixelBuffer> {
        self.log("grab");
        if self.fail_grab_at == Some(self.frame_index) {
            return Err(CaptureError::FrameTimeout(Duration::from_millis(10)));
        }
        self.frame.as_bytes_mut().fill(self.frame_index as u8);
        Ok(&self.frame)
    }

    fn image_width(&self) -> Result<usize> {
        Ok(self.frame.width())
    }

    fn image_height(&self) -> Result<usize> {
        Ok(self.frame.height())
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn is_finished(&self) -> bool {
        self.finish_after
            .map(|n| self.frame_index + 1 >= n)
            .unwrap_or(false)
    }
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<(usize, usize, u8)>>>,
}

impl FrameWriter for MockWriter {
    fn write_frame(&self, frame: &PixelBuffer, output: &mut dyn Write, _config: &OutputConfig) -> Result<()> {
        if self.should_fail {
            return Err(CaptureError::EncodeError("Mock encode error".to_string()));
        }
        self.written
            .lock()
            .unwrap()
            .push((frame.width(), frame.height(), frame.pixel(0, 0, 0)));
        output.write_all(b"frame")?;
        Ok(())
    }
}

fn mock_writer(should_fail: bool) -> (MockWriter, Arc<Mutex<Vec<(usize, usize, u8)>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    (
        MockWriter {
            should_fail,
            written: written.clone(),
        },
        written,
    )
}

#[test]
fn test_record_writes_numbered_frames() {
    let calls = CallLog::default();
    let (writer, written) = mock_writer(false);
    let mut session = CaptureSession::with_custom(
        MockDevice::new(4, 3, calls.clone()),
        writer,
        OutputConfig::default(),
    );
    let dir = tempfile::tempdir().unwrap();

    let timings = session.record(3, dir.path()).unwrap();

    assert_eq!(timings.frame_count(), 3);
    for index in 0..3 {
        let path = dir.path().join(frame_file_name(index));
        assert_eq!(std::fs::read(path).unwrap(), b"frame");
    }
    assert!(!dir.path().join(frame_file_name(3)).exists());
    assert_eq!(
        *written.lock().unwrap(),
        vec![(4, 3, 0), (4, 3, 1), (4, 3, 2)]
    );
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "open", "start", "grab", "next", "grab", "next", "grab", "next", "stop",
        ]
    );
    assert_eq!(session.device().state(), DeviceState::Opened);
}

#[test]
fn test_record_stops_when_source_finishes() {
    let calls = CallLog::default();
    let mut device = MockDevice::new(4, 3, calls.clone());
    device.finish_after = Some(2);
    let (writer, written) = mock_writer(false);
    let mut session = CaptureSession::with_custom(device, writer, OutputConfig::default());
    let dir = tempfile::tempdir().unwrap();

    let timings = session.record(10, dir.path()).unwrap();

    assert_eq!(timings.frame_count(), 2);
    assert_eq!(written.lock().unwrap().len(), 2);
    let log = calls.lock().unwrap().clone();
    assert_eq!(&log[log.len() - 2..], ["grab", "stop"]);
}

#[test]
fn test_record_stops_capture_on_grab_failure() {
    let calls = CallLog::default();
    let mut device = MockDevice::new(4, 3, calls.clone());
    device.fail_grab_at = Some(1);
    let (writer, _written) = mock_writer(false);
    let mut session = CaptureSession::with_custom(device, writer, OutputConfig::default());
    let dir = tempfile::tempdir().unwrap();

    let result = session.record(5, dir.path());

    assert!(matches!(result, Err(CaptureError::FrameTimeout(_))));
    assert_eq!(calls.lock().unwrap().last().unwrap(), "stop");
    assert_eq!(session.device().state(), DeviceState::Opened);
}

#[test]
fn test_writer_failure_is_reported() {
    let (writer, _written) = mock_writer(true);
    let mut session = CaptureSession::with_custom(
        MockDevice::new(4, 3, CallLog::default()),
        writer,
        OutputConfig::default(),
    );
    let dir = tempfile::tempdir().unwrap();

    let result = session.record(2, dir.path());

    assert!(matches!(result, Err(CaptureError::EncodeError(_))));
}

#[test]
fn test_dimension_validation_failure() {
    let (writer, written) = mock_writer(false);
    let config = OutputConfig::builder()
        .validate_dimensions(true)
        .max_dimension(Some(100))
        .build();
    let mut session =
        CaptureSession::with_custom(MockDevice::new(200, 50, CallLog::default()), writer, config);
    let dir = tempfile::tempdir().unwrap();

    let result = session.record(1, dir.path());

    assert!(matches!(result, Err(CaptureError::InvalidDimensions(200, 50))));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_dimension_validation_can_be_disabled() {
    let (writer, written) = mock_writer(false);
    let config = OutputConfig::builder()
        .validate_dimensions(false)
        .max_dimension(Some(100))
        .build();
    let mut session =
        CaptureSession::with_custom(MockDevice::new(200, 50, CallLog::default()), writer, config);
    let dir = tempfile::tempdir().unwrap();

    session.record(1, dir.path()).unwrap();

    assert_eq!(written.lock().unwrap().len(), 1);
}

#[test]
fn test_capture_frame_writes_to_any_output() {
    let (writer, written) = mock_writer(false);
    let mut session = CaptureSession::with_custom(
        MockDevice::new(6, 2, CallLog::default()),
        writer,
        OutputConfig::default(),
    );
    let mut output = Cursor::new(Vec::new());

    session.capture_frame(&mut output).unwrap();

    assert_eq!(output.into_inner(), b"frame");
    assert_eq!(written.lock().unwrap().len(), 1);
}

#[test]
fn test_timings_cover_every_step() {
    let (writer, _written) = mock_writer(false);
    let mut session = CaptureSession::with_custom(
        MockDevice::new(4, 3, CallLog::default()),
        writer,
        OutputConfig::default(),
    );
    let dir = tempfile::tempdir().unwrap();

    let timings = session.record(2, dir.path()).unwrap();

    assert!(timings.get_step("grab").is_some());
    assert!(timings.get_step("encode").is_some());
    assert!(timings.get_step("advance").is_some());
    assert_eq!(timings.steps().len(), 6);
    assert!(timings.total_duration() >= timings.get_step("grab").unwrap());
}

#[test]
fn test_timings_accumulate_by_name() {
    let mut timings = SessionTimings::new();
    timings.add_step("grab", Duration::from_millis(2));
    timings.add_step("grab", Duration::from_millis(3));
    timings.add_step("encode", Duration::from_millis(5));

    assert_eq!(timings.get_step("grab"), Some(Duration::from_millis(5)));
    assert_eq!(timings.total_duration(), Duration::from_millis(10));
    assert_eq!(timings.steps().len(), 3);
    assert_eq!(timings.get_step("advance"), None);
}

#[test]
fn test_synthetic_camera_records_tiff_files() {
    let mut context = DeviceContext::new();
    let driver = SyntheticDriver::new().with_format7_size(24, 16);
    let device = CaptureDevice::new(driver, &mut context, CaptureConfig::default());
    let mut session = CaptureSession::new(device, OutputConfig::default());
    let dir = tempfile::tempdir().unwrap();

    let timings = session.record(3, dir.path()).unwrap();

    assert_eq!(timings.frame_count(), 3);
    for index in 0..3 {
        let bytes = std::fs::read(dir.path().join(frame_file_name(index))).unwrap();
        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (24, 16));
        assert_eq!(decoder.colortype().unwrap(), tiff::ColorType::RGB(8));
    }
    assert_eq!(session.device().driver().frames_delivered(), 3);
}

#[test]
fn test_frame_file_names_are_zero_padded() {
    assert_eq!(frame_file_name(0), "frame_00000.tiff");
    assert_eq!(frame_file_name(42), "frame_00042.tiff");
}
