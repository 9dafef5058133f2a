//! Frame output module
//!
//! Encodes captured frames to TIFF with various compression options.

mod tiff_writer;
pub mod types;
mod writer;


pub use tiff_writer::TiffFrameWriter;
pub use types::{OutputConfig, OutputConfigBuilder, TiffCompression};
pub use writer::FrameWriter;
