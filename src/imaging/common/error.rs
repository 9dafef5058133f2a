use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to connect to capture device: {0}")]
    ConnectionError(String),

    #[error("Unsupported video mode: {0}")]
    UnsupportedModeError(String),

    #[error("Capture resource failure: {0}")]
    ResourceError(String),

    #[error("Not in capture mode: {0}")]
    NotCapturingError(String),

    #[error("Already in capture mode")]
    AlreadyCapturing,

    #[error("Debayer precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Capture parameter was not set: {0}")]
    NotConfigured(&'static str),

    #[error("No frame arrived within {0:?}")]
    FrameTimeout(Duration),

    #[error("Demosaic failed: {0}")]
    DemosaicError(String),

    #[error("Failed to decode RAW frame: {0}")]
    DecodeError(String),

    #[error("Failed to encode frame: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
