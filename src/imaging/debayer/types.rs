//! Types for debayering operations

use std::fmt;
use std::str::FromStr;

use crate::imaging::common::error::CaptureError;

/// Colour filter arrangement of the sensor, named after its top-left 2x2 tile
/// read row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerFilter {
    /// The frame is not a mosaic and needs no debayering.
    None,
    /// R G / G B
    Rggb,
    /// B G / G R
    Bggr,
    /// G R / B G
    Grbg,
    /// G B / R G
    Gbrg,
}

/// Where the interpolation starts for the first processed output row.
///
/// `blue_right` tells whether the non-green sample of that row ends up in
/// the blue channel; `start_with_green` whether the first interior pixel is a
/// green sample. Both flip after every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Phase {
    pub blue_right: bool,
    pub start_with_green: bool,
}

impl Phase {
    pub fn flip(&mut self) {
        self.blue_right = !self.blue_right;
        self.start_with_green = !self.start_with_green;
    }
}

impl BayerFilter {
    pub const MOSAICS: [BayerFilter; 4] = [
        BayerFilter::Rggb,
        BayerFilter::Bggr,
        BayerFilter::Grbg,
        BayerFilter::Gbrg,
    ];

    pub fn is_mosaic(self) -> bool {
        self != BayerFilter::None
    }

    pub(crate) fn phase(self) -> Option<Phase> {
        let (blue_right, start_with_green) = match self {
            BayerFilter::None => return None,
            BayerFilter::Rggb => (true, false),
            BayerFilter::Bggr => (false, false),
            BayerFilter::Grbg => (true, true),
            BayerFilter::Gbrg => (false, true),
        };
        Some(Phase { blue_right, start_with_green })
    }

    /// Colour channel (0=R, 1=G, 2=B) sampled at (`x`, `y`).
    pub fn channel_at(self, x: usize, y: usize) -> Option<usize> {
        let tile = match self {
            BayerFilter::None => return None,
            BayerFilter::Rggb => [[0, 1], [1, 2]],
            BayerFilter::Bggr => [[2, 1], [1, 0]],
            BayerFilter::Grbg => [[1, 0], [2, 1]],
            BayerFilter::Gbrg => [[1, 2], [0, 1]],
        };
        Some(tile[y % 2][x % 2])
    }

    /// Filter whose top-left tile matches the given channel layout.
    pub fn from_tile(tile: [[usize; 2]; 2]) -> Option<BayerFilter> {
        Self::MOSAICS.into_iter().find(|filter| {
            (0..2).all(|y| (0..2).all(|x| filter.channel_at(x, y) == Some(tile[y][x])))
        })
    }

    pub(crate) fn cfa(self) -> Option<bayer::CFA> {
        match self {
            BayerFilter::None => None,
            BayerFilter::Rggb => Some(bayer::CFA::RGGB),
            BayerFilter::Bggr => Some(bayer::CFA::BGGR),
            BayerFilter::Grbg => Some(bayer::CFA::GRBG),
            BayerFilter::Gbrg => Some(bayer::CFA::GBRG),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BayerFilter::None => "none",
            BayerFilter::Rggb => "RGGB",
            BayerFilter::Bggr => "BGGR",
            BayerFilter::Grbg => "GRBG",
            BayerFilter::Gbrg => "GBRG",
        }
    }
}

impl fmt::Display for BayerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BayerFilter {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(BayerFilter::None),
            "rggb" => Ok(BayerFilter::Rggb),
            "bggr" => Ok(BayerFilter::Bggr),
            "grbg" => Ok(BayerFilter::Grbg),
            "gbrg" => Ok(BayerFilter::Gbrg),
            _ => Err(CaptureError::UnsupportedModeError(format!(
                "unknown bayer filter '{}'",
                s
            ))),
        }
    }
}

/// Demosaic algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebayerMethod {
    /// Bit-exact integer bilinear interpolation; the outer pixel ring is zero.
    #[default]
    Bilinear,
    /// Linear interpolation from the `bayer` crate, borders included.
    Linear,
}

impl FromStr for DebayerMethod {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bilinear" => Ok(DebayerMethod::Bilinear),
            "linear" => Ok(DebayerMethod::Linear),
            _ => Err(CaptureError::UnsupportedModeError(format!(
                "unknown debayer method '{}'",
                s
            ))),
        }
    }
}
