//! Error types for the crate
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and device operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Errors while opening, converting or releasing a framebuffer
//!
//! ## Example
//!
//! ```
//! use fbpix::{Builder, BuilderError, Geometry};
//!
//! // Missing device path
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingDevice)));
//!
//! // Degenerate geometry
//! let result = Geometry::new(0, 480);
//! assert!(result.is_err());
//! ```

use std::io;

/// Errors that can occur when interacting with a framebuffer
///
/// Open failures wrap the [`io::Error`] reported by the kernel so callers can
/// inspect `raw_os_error()` (e.g. `EACCES` vs `ENOENT`).
#[derive(Debug)]
pub enum Error {
    /// The device node could not be opened for read/write
    DeviceUnavailable {
        /// Underlying OS error
        source: io::Error,
    },
    /// The device rejected the video-mode query
    ///
    /// Usually means the path is not a framebuffer device at all.
    QueryFailed {
        /// Underlying OS error
        source: io::Error,
    },
    /// Native pixel layout is not one of RGB565, RGB888 or XRGB8888
    UnsupportedFormat {
        /// Reported bits per pixel
        bits_per_pixel: u32,
        /// Red channel length in bits
        red: u32,
        /// Green channel length in bits
        green: u32,
        /// Blue channel length in bits
        blue: u32,
    },
    /// Device memory could not be mapped into the process
    MappingFailed {
        /// Number of bytes requested
        len: usize,
        /// Underlying OS error
        source: io::Error,
    },
    /// Requested pixel run extends past the end of the framebuffer
    ///
    /// Nothing is read or written when this is returned.
    OutOfRange {
        /// First pixel of the run
        offset: usize,
        /// Number of pixels in the run
        count: usize,
        /// Total pixels in the framebuffer
        capacity: usize,
    },
    /// Caller-supplied RGB buffer is too small for the pixel run
    ///
    /// The buffer must be at least `count * 3` bytes.
    BufferTooSmall {
        /// Required buffer size in bytes
        required: usize,
        /// Provided buffer size in bytes
        provided: usize,
    },
    /// Backing store does not match the geometry and layout it was paired with
    BufferSizeMismatch {
        /// Expected size in bytes
        expected: usize,
        /// Actual size in bytes
        provided: usize,
    },
    /// Reported or supplied geometry is empty or too large to address
    InvalidGeometry {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Unmapping the device memory failed
    ReleaseFailed {
        /// Underlying OS error
        source: io::Error,
    },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DeviceUnavailable { source } => write!(f, "Device unavailable: {source}"),
            Self::QueryFailed { source } => write!(f, "Video mode query failed: {source}"),
            Self::UnsupportedFormat {
                bits_per_pixel,
                red,
                green,
                blue,
            } => write!(
                f,
                "Unsupported pixel format: {bits_per_pixel} bpp, channels {red}/{green}/{blue}"
            ),
            Self::MappingFailed { len, source } => {
                write!(f, "Mapping {len} bytes of device memory failed: {source}")
            }
            Self::OutOfRange {
                offset,
                count,
                capacity,
            } => write!(
                f,
                "Pixel run out of range: offset {offset} + count {count} exceeds {capacity}"
            ),
            Self::BufferTooSmall { required, provided } => {
                write!(
                    f,
                    "Buffer too small: required {required} bytes, provided {provided}"
                )
            }
            Self::BufferSizeMismatch { expected, provided } => {
                write!(
                    f,
                    "Backing buffer size mismatch: expected {expected} bytes, provided {provided}"
                )
            }
            Self::InvalidGeometry { width, height } => {
                write!(f, "Invalid geometry: {width}x{height}")
            }
            Self::ReleaseFailed { source } => write!(f, "Unmapping device memory failed: {source}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::DeviceUnavailable { source }
            | Self::QueryFailed { source }
            | Self::MappingFailed { source, .. }
            | Self::ReleaseFailed { source } => Some(source),
            _ => None,
        }
    }
}

/// Errors that can occur when building configuration
#[derive(Debug)]
pub enum BuilderError {
    /// Device path was not specified
    ///
    /// [`Builder::device()`](crate::config::Builder::device) must be called before building.
    MissingDevice,
    /// Invalid geometry provided
    ///
    /// See [`Geometry::new()`](crate::config::Geometry::new) for constraints.
    InvalidGeometry {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingDevice => write!(f, "Device path must be specified"),
            Self::InvalidGeometry { width, height } => write!(
                f,
                "Invalid geometry {width}x{height} (both must be non-zero and addressable)"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}
