use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::imaging::buffer::{Channels, PixelBuffer};
use crate::imaging::common::error::{CaptureError, Result};
use crate::imaging::debayer::{debayer, BayerFilter, DebayerMethod};
use crate::imaging::device::{
    CaptureConfig, CaptureDevice, CaptureDriver, ColorMode, DeviceContext, DeviceState, Framerate,
    ImageDevice, IsoChannel, Negotiated, VideoFormat, VideoMode,
};

type CallLog = Arc<Mutex<Vec<String>>>;

struct MockDriver {
    present: bool,
    fail_start: bool,
    fail_stop: bool,
    size: (usize, usize),
    sensor_filter: Option<BayerFilter>,
    calls: CallLog,
    fill_value: u8,
}

impl MockDriver {
    fn new(calls: CallLog) -> Self {
        Self {
            present: true,
            fail_start: false,
            fail_stop: false,
            size: (8, 6),
            sensor_filter: None,
            calls,
            fill_value: 0,
        }
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl CaptureDriver for MockDriver {
    fn connect(&mut self, channel: IsoChannel) -> Result<()> {
        if !self.present {
            return Err(CaptureError::ConnectionError("no camera".to_string()));
        }
        self.log(format!("connect {}", channel.number()));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.log("disconnect");
    }

    fn negotiate(
        &mut self,
        _format: VideoFormat,
        mode: VideoMode,
        _framerate: Framerate,
    ) -> Result<Negotiated> {
        self.log(format!("negotiate {}", mode));
        let (width, height) = mode.dimensions().unwrap_or(self.size);
        Ok(Negotiated {
            width,
            height,
            color_mode: ColorMode::from_mode(mode)?,
            bayer_filter: self.sensor_filter,
        })
    }

    fn start_transmission(&mut self) -> Result<()> {
        if self.fail_start {
            return Err(CaptureError::ResourceError("no bandwidth".to_string()));
        }
        self.log("start");
        Ok(())
    }

    fn stop_transmission(&mut self) -> Result<()> {
        if self.fail_stop {
            return Err(CaptureError::ResourceError("bus reset".to_string()));
        }
        self.log("stop");
        Ok(())
    }

    fn wait_frame(&mut self, _timeout: Duration) -> Result<()> {
        self.log("wait");
        Ok(())
    }

    fn fill_raw_buffer(&mut self, buffer: &mut PixelBuffer) -> Result<()> {
        self.log(format!("fill {}", buffer.channels()));
        let (w, h) = (buffer.width(), buffer.height());
        for y in 0..h {
            for x in 0..w {
                for c in 0..buffer.channels().count() {
                    buffer[(x, y, c)] = self.fill_value.wrapping_add((x * 7 + y * 3 + c) as u8);
                }
            }
        }
        Ok(())
    }

    fn release_frame(&mut self) -> Result<()> {
        self.log("release");
        self.fill_value = self.fill_value.wrapping_add(1);
        Ok(())
    }
}

fn new_device(driver: MockDriver) -> CaptureDevice<MockDriver> {
    let mut context = DeviceContext::new();
    CaptureDevice::new(driver, &mut context, CaptureConfig::default())
}

fn calls_of(calls: &CallLog) -> Vec<String> {
    calls.lock().unwrap().clone()
}

#[test]
fn test_full_lifecycle() {
    let calls = CallLog::default();
    let mut device = new_device(MockDriver::new(calls.clone()));
    assert_eq!(device.state(), DeviceState::Closed);

    device.open().unwrap();
    assert_eq!(device.state(), DeviceState::Opened);

    device.capture_start().unwrap();
    assert_eq!(device.state(), DeviceState::Capturing);

    let frame = device.get_image().unwrap();
    assert_eq!(frame.width(), 8);
    assert_eq!(frame.height(), 6);
    assert_eq!(frame.channels(), Channels::Rgb);

    device.capture_next().unwrap();
    device.capture_stop().unwrap();
    assert_eq!(device.state(), DeviceState::Opened);

    device.close();
    assert_eq!(device.state(), DeviceState::Closed);

    assert_eq!(
        calls_of(&calls),
        vec![
            "connect 0",
            "negotiate 0",
            "start",
            "wait",
            "fill greyscale",
            "release",
            "stop",
            "disconnect",
        ]
    );
}

#[test]
fn test_open_without_camera_fails() {
    let mut driver = MockDriver::new(CallLog::default());
    driver.present = false;
    let mut device = new_device(driver);

    let result = device.open();
    assert!(matches!(result, Err(CaptureError::ConnectionError(_))));
    assert_eq!(device.state(), DeviceState::Closed);
}

#[test]
fn test_open_twice_is_a_no_op() {
    let calls = CallLog::default();
    let mut device = new_device(MockDriver::new(calls.clone()));

    device.open().unwrap();
    device.open().unwrap();

    assert_eq!(calls_of(&calls), vec!["connect 0"]);
}

#[test]
fn test_get_image_before_capture_start_fails() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    assert!(matches!(
        device.get_image(),
        Err(CaptureError::NotCapturingError(_))
    ));

    device.open().unwrap();
    assert!(matches!(
        device.get_image(),
        Err(CaptureError::NotCapturingError(_))
    ));
}

#[test]
fn test_capture_next_and_stop_outside_capture_fail() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.open().unwrap();

    assert!(matches!(
        device.capture_next(),
        Err(CaptureError::NotCapturingError(_))
    ));
    assert!(matches!(
        device.capture_stop(),
        Err(CaptureError::NotCapturingError(_))
    ));
    assert_eq!(device.state(), DeviceState::Opened);
}

#[test]
fn test_capture_start_on_closed_device_fails() {
    let mut device = new_device(MockDriver::new(CallLog::default()));

    let result = device.capture_start();
    assert!(matches!(result, Err(CaptureError::ConnectionError(_))));
    assert_eq!(device.state(), DeviceState::Closed);
}

#[test]
fn test_second_capture_start_is_refused() {
    let calls = CallLog::default();
    let mut device = new_device(MockDriver::new(calls.clone()));
    device.open().unwrap();
    device.capture_start().unwrap();

    let result = device.capture_start();

    assert!(matches!(result, Err(CaptureError::AlreadyCapturing)));
    assert_eq!(device.state(), DeviceState::Capturing);
    let starts = calls_of(&calls).iter().filter(|c| *c == "start").count();
    assert_eq!(starts, 1);
}

#[test]
fn test_unsupported_mode_stays_opened() {
    for mode in [
        VideoMode::Mode160x120Yuv444,
        VideoMode::Mode640x480Yuv411,
        VideoMode::Mode640x480Mono16,
        VideoMode::Mode1600x1200Mono16,
    ] {
        let mut device = new_device(MockDriver::new(CallLog::default()));
        device.set_video_format(mode.format());
        device.set_video_mode(mode);
        device.open().unwrap();

        let result = device.capture_start();

        assert!(
            matches!(result, Err(CaptureError::UnsupportedModeError(_))),
            "{}",
            mode
        );
        assert_eq!(device.state(), DeviceState::Opened);
        assert!(device.image_width().is_err());
    }
}

#[test]
fn test_mode_outside_format_is_unsupported() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_video_format(VideoFormat::Format1);
    device.set_video_mode(VideoMode::Mode640x480Rgb);
    device.open().unwrap();

    assert!(matches!(
        device.capture_start(),
        Err(CaptureError::UnsupportedModeError(_))
    ));
    assert_eq!(device.state(), DeviceState::Opened);
}

#[test]
fn test_mosaic_mode_without_filter_is_unsupported() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_bayer_filter(BayerFilter::None);
    device.open().unwrap();

    assert!(matches!(
        device.capture_start(),
        Err(CaptureError::UnsupportedModeError(_))
    ));
    assert_eq!(device.state(), DeviceState::Opened);
}

#[test]
fn test_failed_transmission_start_leaves_device_opened() {
    let mut driver = MockDriver::new(CallLog::default());
    driver.fail_start = true;
    let mut device = new_device(driver);
    device.open().unwrap();

    let result = device.capture_start();

    assert!(matches!(result, Err(CaptureError::ResourceError(_))));
    assert_eq!(device.state(), DeviceState::Opened);
    assert!(device.image_width().is_err());
}

#[test]
fn test_failed_stop_keeps_capturing() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.open().unwrap();
    device.capture_start().unwrap();
    device.driver_mut().fail_stop = true;

    assert!(device.capture_stop().is_err());
    assert_eq!(device.state(), DeviceState::Capturing);

    device.driver_mut().fail_stop = false;
    device.capture_stop().unwrap();
    assert_eq!(device.state(), DeviceState::Opened);
}

#[test]
fn test_close_is_idempotent_and_stops_capture() {
    let calls = CallLog::default();
    let mut device = new_device(MockDriver::new(calls.clone()));
    device.close();
    assert!(calls_of(&calls).is_empty());

    device.open().unwrap();
    device.capture_start().unwrap();
    device.close();
    device.close();

    assert_eq!(device.state(), DeviceState::Closed);
    let log = calls_of(&calls);
    assert_eq!(&log[log.len() - 2..], ["stop", "disconnect"]);
    assert_eq!(log.iter().filter(|c| *c == "disconnect").count(), 1);
}

#[test]
fn test_drop_closes_the_device() {
    let calls = CallLog::default();
    {
        let mut device = new_device(MockDriver::new(calls.clone()));
        device.open().unwrap();
        device.capture_start().unwrap();
    }
    let log = calls_of(&calls);
    assert_eq!(&log[log.len() - 2..], ["stop", "disconnect"]);
}

#[test]
fn test_greyscale_frames_are_demosaiced() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.open().unwrap();
    device.capture_start().unwrap();

    let frame = device.get_image().unwrap().clone();

    let mut raw = PixelBuffer::new(8, 6, Channels::Greyscale);
    MockDriver::new(CallLog::default())
        .fill_raw_buffer(&mut raw)
        .unwrap();
    let mut expected = PixelBuffer::new(8, 6, Channels::Rgb);
    debayer(&raw, &mut expected, BayerFilter::Rggb);

    assert_eq!(frame, expected);
}

#[test]
fn test_driver_reported_filter_wins() {
    let mut driver = MockDriver::new(CallLog::default());
    driver.sensor_filter = Some(BayerFilter::Gbrg);
    let mut device = new_device(driver);
    device.open().unwrap();
    device.capture_start().unwrap();

    let frame = device.get_image().unwrap().clone();

    let mut raw = PixelBuffer::new(8, 6, Channels::Greyscale);
    MockDriver::new(CallLog::default())
        .fill_raw_buffer(&mut raw)
        .unwrap();
    let mut expected = PixelBuffer::new(8, 6, Channels::Rgb);
    debayer(&raw, &mut expected, BayerFilter::Gbrg);

    assert_eq!(frame, expected);
}

#[test]
fn test_rgb_frames_are_copied() {
    let calls = CallLog::default();
    let mut device = new_device(MockDriver::new(calls.clone()));
    device.set_video_format(VideoFormat::Format0);
    device.set_video_mode(VideoMode::Mode640x480Rgb);
    device.open().unwrap();
    device.capture_start().unwrap();

    let frame = device.get_image().unwrap();

    assert_eq!(frame.width(), 640);
    assert_eq!(frame.height(), 480);
    assert_eq!(frame.pixel(10, 20, 2), (10 * 7 + 20 * 3 + 2) as u8);
    assert!(calls_of(&calls).contains(&"fill RGB".to_string()));
}

#[test]
fn test_yuv_frames_pass_through() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_video_format(VideoFormat::Format0);
    device.set_video_mode(VideoMode::Mode320x240Yuv422);
    device.open().unwrap();
    device.capture_start().unwrap();

    assert_eq!(device.color_mode().unwrap(), ColorMode::Yuv422);
    let frame = device.get_image().unwrap();
    assert_eq!(frame.channels(), Channels::Rgb);
    assert_eq!(frame.pixel(1, 1, 0), 10);

    // One [Y, U, V] triplet per pixel, rows padded to the line alignment,
    // bytes exactly as the driver wrote them.
    assert_eq!(frame.row_stride(), 960);
    assert_eq!(frame.allocated_bytes(), 960 * 240);
    for (x, y) in [(0, 0), (1, 0), (319, 5), (200, 239)] {
        for c in 0..3 {
            let offset = y * 960 + x * 3 + c;
            assert_eq!(frame.as_bytes()[offset], (x * 7 + y * 3 + c) as u8);
        }
    }
}

#[test]
fn test_each_frame_overwrites_the_output() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_video_format(VideoFormat::Format0);
    device.set_video_mode(VideoMode::Mode640x480Rgb);
    device.open().unwrap();
    device.capture_start().unwrap();

    let first = device.get_image().unwrap().pixel(0, 0, 0);
    device.capture_next().unwrap();
    let second = device.get_image().unwrap().pixel(0, 0, 0);

    assert_eq!(first, 0);
    assert_eq!(second, 1);
}

#[test]
fn test_dimensions_follow_negotiation() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    assert!(matches!(
        device.image_width(),
        Err(CaptureError::NotConfigured(_))
    ));
    assert!(device.capture_parameters().is_err());

    device.open().unwrap();
    device.capture_start().unwrap();

    assert_eq!(device.image_width().unwrap(), 8);
    assert_eq!(device.image_height().unwrap(), 6);
    let params = device.capture_parameters().unwrap();
    assert_eq!(params.channels, Channels::Rgb);
    assert_eq!(params.bits_per_channel.bits(), 8);
    assert_eq!((params.width, params.height), (8, 6));
}

#[test]
fn test_unset_parameters_report_not_configured() {
    let device = new_device(MockDriver::new(CallLog::default()));

    assert!(matches!(
        device.video_format(),
        Err(CaptureError::NotConfigured(_))
    ));
    assert!(device.video_mode().is_err());
    assert!(device.video_framerate().is_err());
    assert_eq!(device.bayer_filter(), BayerFilter::Rggb);
}

#[test]
fn test_setting_format_clears_mode_and_framerate() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_video_format(VideoFormat::Format0);
    device.set_video_mode(VideoMode::Mode640x480Mono8);
    device.set_video_framerate(Framerate::Fps30);

    device.set_video_format(VideoFormat::Format1);

    assert_eq!(device.video_format().unwrap(), VideoFormat::Format1);
    assert!(device.video_mode().is_err());
    assert!(device.video_framerate().is_err());
}

#[test]
fn test_setting_mode_resets_framerate_and_filter() {
    let mut device = new_device(MockDriver::new(CallLog::default()));
    device.set_video_framerate(Framerate::Fps60);
    device.set_bayer_filter(BayerFilter::Bggr);

    device.set_video_mode(VideoMode::Mode800x600Rgb);
    assert!(device.video_framerate().is_err());
    assert_eq!(device.bayer_filter(), BayerFilter::None);

    device.set_video_mode(VideoMode::Mode800x600Mono8);
    assert_eq!(device.bayer_filter(), BayerFilter::Rggb);
}

#[test]
fn test_config_is_applied_on_construction() {
    let config = CaptureConfig::builder()
        .format(VideoFormat::Format2)
        .mode(VideoMode::Mode1280x960Mono8)
        .framerate(Framerate::Fps7_5)
        .bayer_filter(BayerFilter::Grbg)
        .debayer_method(DebayerMethod::Linear)
        .frame_timeout(Duration::from_millis(250))
        .build();
    let mut context = DeviceContext::new();
    let device = CaptureDevice::new(MockDriver::new(CallLog::default()), &mut context, config);

    assert_eq!(device.video_format().unwrap(), VideoFormat::Format2);
    assert_eq!(device.video_mode().unwrap(), VideoMode::Mode1280x960Mono8);
    assert_eq!(device.video_framerate().unwrap(), Framerate::Fps7_5);
    assert_eq!(device.bayer_filter(), BayerFilter::Grbg);
    assert_eq!(device.debayer_method(), DebayerMethod::Linear);
}

#[test]
fn test_context_hands_out_distinct_channels() {
    let calls = CallLog::default();
    let mut context = DeviceContext::starting_at(3);
    let mut first = CaptureDevice::new(
        MockDriver::new(calls.clone()),
        &mut context,
        CaptureConfig::default(),
    );
    let mut second = CaptureDevice::new(
        MockDriver::new(calls.clone()),
        &mut context,
        CaptureConfig::default(),
    );

    assert_eq!(first.channel().number(), 3);
    assert_eq!(second.channel().number(), 4);
    assert_eq!(context.next_channel(), 5);

    first.open().unwrap();
    second.open().unwrap();
    assert_eq!(calls_of(&calls), vec!["connect 3", "connect 4"]);
}

#[test]
fn test_boxed_device_forwards_calls() {
    let mut device: Box<dyn ImageDevice> = Box::new(new_device(MockDriver::new(CallLog::default())));

    device.open().unwrap();
    device.capture_start().unwrap();
    assert_eq!(device.get_image().unwrap().width(), 8);
    assert_eq!(device.state(), DeviceState::Capturing);
    assert!(!device.is_finished());
}

#[test]
fn test_mode_metadata() {
    assert_eq!(VideoMode::Mode640x480Mono8.to_string(), "640x480 Mono 8bpp");
    assert_eq!(VideoMode::Mode320x240Yuv422.to_string(), "320x240 YUV 4:2:2");
    assert_eq!(VideoMode::Mode0.to_string(), "0");
    assert_eq!(VideoMode::Mode1024x768Rgb.dimensions(), Some((1024, 768)));
    assert_eq!(VideoMode::Mode1.dimensions(), None);
    assert_eq!(VideoMode::Mode1.format(), VideoFormat::Format7);
    assert_eq!(VideoMode::Mode1600x1200Mono16.format(), VideoFormat::Format2);
    assert_eq!(VideoFormat::Format7.to_string(), "7");

    for mode in VideoMode::ALL {
        assert_eq!(mode.dimensions().is_none(), mode.format() == VideoFormat::Format7);
    }
}

#[test]
fn test_framerate_metadata() {
    assert_eq!(Framerate::Fps1_875.to_string(), "1.875");
    assert_eq!(Framerate::Fps7_5.to_string(), "7.5");
    assert_eq!(Framerate::Fps240.to_string(), "240");
    assert_eq!(Framerate::Fps30.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    assert!(Framerate::ALL.windows(2).all(|w| w[0].fps() < w[1].fps()));
}

#[test]
fn test_color_mode_derivation() {
    assert_eq!(ColorMode::from_mode(VideoMode::Mode0).unwrap(), ColorMode::Greyscale);
    assert_eq!(ColorMode::from_mode(VideoMode::Mode1024x768Mono8).unwrap(), ColorMode::Greyscale);
    assert_eq!(ColorMode::from_mode(VideoMode::Mode800x600Rgb).unwrap(), ColorMode::Rgb);
    assert_eq!(ColorMode::from_mode(VideoMode::Mode1280x960Yuv422).unwrap(), ColorMode::Yuv422);
    assert!(ColorMode::from_mode(VideoMode::Mode640x480Yuv411).is_err());
}

#[test]
fn test_context_channel_counter_wraps() {
    let mut context = DeviceContext::starting_at(u32::MAX);

    assert_eq!(context.allocate_channel().number(), u32::MAX);
    assert_eq!(context.allocate_channel().number(), 0);
    assert_eq!(context.next_channel(), 1);
}
