//! Pixel buffer module
//!
//! Owned 8-bit image memory with line-aligned rows, plus a borrowed view for
//! handing the memory to code that expects a raw header.

mod pixel_buffer;
pub mod types;
mod view;


pub use pixel_buffer::PixelBuffer;
pub use types::{aligned_row_stride, BitsPerChannel, Channels, LineAlignment};
pub use view::BufferView;
