//! Pixel buffer layout types

use std::fmt;

/// Number of interleaved channels per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channels {
    Greyscale = 1,
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    pub const fn count(self) -> usize {
        self as usize
    }

    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Channels::Greyscale),
            3 => Some(Channels::Rgb),
            4 => Some(Channels::Rgba),
            _ => None,
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Greyscale => write!(f, "greyscale"),
            Channels::Rgb => write!(f, "RGB"),
            Channels::Rgba => write!(f, "RGBA"),
        }
    }
}

/// Bits per channel. Only 8-bit samples are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitsPerChannel {
    #[default]
    Bpc8 = 8,
}

impl BitsPerChannel {
    pub const fn bits(self) -> usize {
        self as usize
    }
}

/// Byte boundary every row starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineAlignment {
    A1 = 1,
    A2 = 2,
    #[default]
    A4 = 4,
    A8 = 8,
}

impl LineAlignment {
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Bytes per row for `width` pixels of `channels`, padded up to `alignment`.
pub const fn aligned_row_stride(width: usize, channels: Channels, alignment: LineAlignment) -> usize {
    let line = width * channels.count();
    let align = alignment.bytes();
    line + (align - line % align) % align
}
