//! Frame acquisition and colour reconstruction
//!
//! Pixel buffers with a fixed row layout, the Bayer demosaic engine, the
//! capture device state machine with its drivers, and TIFF frame output.

pub mod buffer;
pub mod common;
pub mod debayer;
pub mod device;
pub mod drivers;
pub mod output;
pub mod session;

pub use common::{
    CaptureError,
    Result,
};

pub use buffer::{
    BitsPerChannel,
    BufferView,
    Channels,
    LineAlignment,
    PixelBuffer,
};

pub use debayer::{
    BayerFilter,
    DebayerMethod,
    LinearDebayer,
};

pub use device::{
    CaptureConfig,
    CaptureConfigBuilder,
    CaptureDevice,
    CaptureDriver,
    CaptureParameters,
    ColorMode,
    DeviceContext,
    DeviceState,
    Framerate,
    ImageDevice,
    IsoChannel,
    Negotiated,
    PixelCoding,
    VideoFormat,
    VideoMode,
};

pub use drivers::{
    decode_raw_frame,
    expand_uyvy_row,
    fill_from_uyvy,
    RawFileDriver,
    RawFrame,
    RawFrameDecoder,
    RawloaderDecoder,
    SyntheticDriver,
};

pub use output::{
    FrameWriter,
    OutputConfig,
    OutputConfigBuilder,
    TiffCompression,
    TiffFrameWriter,
};

pub use session::{
    frame_file_name,
    CaptureSession,
    SessionTimings,
};
