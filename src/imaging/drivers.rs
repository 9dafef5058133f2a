//! Concrete frame sources

mod raw_file;
mod synthetic;
mod yuv;


pub use raw_file::{decode_raw_frame, RawFileDriver, RawFrame, RawFrameDecoder, RawloaderDecoder};
pub use synthetic::SyntheticDriver;
pub use yuv::{expand_uyvy_row, fill_from_uyvy, UYVY_BYTES_PER_PIXEL};
