//! Common utilities module
//!
//! This module contains shared utilities used across the imaging modules.

pub mod error;

pub use error::{CaptureError, Result};
