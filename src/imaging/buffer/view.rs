use crate::imaging::buffer::types::{BitsPerChannel, Channels, LineAlignment};

/// Borrowed description of a [`PixelBuffer`](super::PixelBuffer)'s memory.
///
/// Carries the same fields an external vision library header would (size,
/// depth, channel count, alignment, row step and a data pointer) but never
/// owns the bytes and cannot outlive the buffer it was taken from.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub channels: Channels,
    pub depth: BitsPerChannel,
    pub align: LineAlignment,
    pub width_step: usize,
}

impl<'a> BufferView<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: Channels,
        depth: BitsPerChannel,
        align: LineAlignment,
        width_step: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            depth,
            align,
            width_step,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn image_size(&self) -> usize {
        self.data.len()
    }

    /// Logical rows, padding stripped.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let line = self.width * self.channels.count();
        let step = self.width_step.max(1);
        self.data
            .chunks(step)
            .take(self.height)
            .map(move |row| &row[..line])
    }

    /// Copies the pixels into a tightly packed vector (no row padding).
    pub fn to_packed(&self) -> Vec<u8> {
        let line = self.width * self.channels.count();
        if line == self.width_step {
            return self.data[..line * self.height].to_vec();
        }

        let mut packed = Vec::with_capacity(line * self.height);
        for row in self.rows() {
            packed.extend_from_slice(row);
        }
        packed
    }
}
