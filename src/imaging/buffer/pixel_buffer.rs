use std::ops::{Index, IndexMut};

use crate::imaging::buffer::types::{aligned_row_stride, BitsPerChannel, Channels, LineAlignment};
use crate::imaging::buffer::view::BufferView;

/// Owned 8-bit image memory with line-aligned rows.
///
/// Every row starts on a `line_alignment` byte boundary, so the row stride is
/// `width * channels` rounded up to the next multiple of the alignment. The
/// buffer always holds exactly `row_stride * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: Channels,
    bits_per_channel: BitsPerChannel,
    line_alignment: LineAlignment,
    row_stride: usize,
    allocated_height: usize,
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl PixelBuffer {
    /// Allocates a `width` x `height` buffer. The content is zeroed but
    /// callers must not rely on it.
    pub fn new(width: usize, height: usize, channels: Channels) -> Self {
        Self::with_alignment(width, height, channels, LineAlignment::default())
    }

    pub fn with_alignment(
        width: usize,
        height: usize,
        channels: Channels,
        line_alignment: LineAlignment,
    ) -> Self {
        let mut buffer = Self {
            data: Vec::new(),
            width,
            height,
            channels,
            bits_per_channel: BitsPerChannel::Bpc8,
            line_alignment,
            row_stride: 0,
            allocated_height: 0,
        };
        buffer.allocate();
        buffer
    }

    /// An RGB buffer without any backing memory.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            channels: Channels::Rgb,
            bits_per_channel: BitsPerChannel::Bpc8,
            line_alignment: LineAlignment::default(),
            row_stride: 0,
            allocated_height: 0,
        }
    }

    fn allocate(&mut self) {
        self.row_stride = aligned_row_stride(self.width, self.channels, self.line_alignment);
        self.allocated_height = self.height;
        // A fresh Vec, never a reuse of the old capacity.
        self.data = vec![0u8; self.row_stride * self.allocated_height];
    }

    /// Drops the current memory and allocates for the new dimensions, keeping
    /// channels and alignment. The content afterwards is unspecified.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.allocate();
    }

    /// Value copy of `other`: takes over its shape and alignment, reallocating
    /// when the shape differs, then copies its whole allocated region.
    pub fn assign(&mut self, other: &PixelBuffer) {
        self.bits_per_channel = other.bits_per_channel;

        if self.width != other.width
            || self.height != other.height
            || self.channels != other.channels
            || self.line_alignment != other.line_alignment
            || self.data.len() != other.data.len()
        {
            self.width = other.width;
            self.height = other.height;
            self.channels = other.channels;
            self.line_alignment = other.line_alignment;
            self.allocate();
        }

        self.data.copy_from_slice(&other.data);
    }

    /// Copies as many bytes from `src` as fit and returns the count.
    ///
    /// `src` must already use this buffer's row stride. Driver frames may be
    /// larger than the buffer (trailing packet padding), the excess is ignored.
    pub fn fill_from(&mut self, src: &[u8]) -> usize {
        let len = src.len().min(self.data.len());
        self.data[..len].copy_from_slice(&src[..len]);
        len
    }

    /// Byte offset of channel `channel` of pixel (`x`, `y`).
    #[inline]
    pub fn offset(&self, x: usize, y: usize, channel: usize) -> usize {
        y * self.row_stride + x * self.channels.count() + channel
    }

    /// Random pixel access.
    ///
    /// Coordinates are not validated against `width`/`height`; an `x` past
    /// the logical width silently reads row padding or the next row. Hoist
    /// the row offset instead of calling this in per-pixel loops.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[self.offset(x, y, channel)]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize, channel: usize) -> &mut u8 {
        let offset = self.offset(x, y, channel);
        &mut self.data[offset]
    }

    /// Checked pixel access.
    pub fn get_pixel(&self, x: usize, y: usize, channel: usize) -> Option<u8> {
        if x >= self.width || y >= self.height || channel >= self.channels.count() {
            return None;
        }
        Some(self.pixel(x, y, channel))
    }

    /// Logical bytes of row `y`, without padding.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.row_stride;
        &self.data[start..start + self.width * self.channels.count()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.row_stride;
        let len = self.width * self.channels.count();
        &mut self.data[start..start + len]
    }

    /// Header-style view over this buffer's memory, rebuilt on every call.
    pub fn view(&self) -> BufferView<'_> {
        BufferView::new(
            &self.data,
            self.width,
            self.height,
            self.channels,
            self.bits_per_channel,
            self.line_alignment,
            self.row_stride,
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn bits_per_channel(&self) -> BitsPerChannel {
        self.bits_per_channel
    }

    pub fn line_alignment(&self) -> LineAlignment {
        self.line_alignment
    }

    /// Bytes per row including alignment padding.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn allocated_height(&self) -> usize {
        self.allocated_height
    }

    pub fn allocated_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Index<(usize, usize, usize)> for PixelBuffer {
    type Output = u8;

    #[inline]
    fn index(&self, (x, y, channel): (usize, usize, usize)) -> &u8 {
        &self.data[self.offset(x, y, channel)]
    }
}

impl IndexMut<(usize, usize, usize)> for PixelBuffer {
    #[inline]
    fn index_mut(&mut self, (x, y, channel): (usize, usize, usize)) -> &mut u8 {
        let offset = self.offset(x, y, channel);
        &mut self.data[offset]
    }
}
