//! Framebuffer configuration types and builder

use std::path::{Path, PathBuf};

pub use crate::error::BuilderError;

/// Framebuffer geometry in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Width in pixels (row length)
    pub width: u32,
    /// Height in pixels (number of rows)
    pub height: u32,
}

impl Geometry {
    /// Create new geometry with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidGeometry` if:
    /// - width or height is zero
    /// - width * height * 4 does not fit in `usize`
    pub fn new(width: u32, height: u32) -> Result<Self, BuilderError> {
        if width == 0 || height == 0 {
            return Err(BuilderError::InvalidGeometry { width, height });
        }
        // Largest native pixel is 4 bytes; the mapping length must be addressable.
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(BuilderError::InvalidGeometry { width, height })?;
        Ok(Self { width, height })
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of a buffer holding every pixel at `bytes_per_pixel`
    pub fn buffer_size(&self, bytes_per_pixel: usize) -> usize {
        self.pixel_count() * bytes_per_pixel
    }

    /// Linear (row-major) pixel offset of `(x, y)`, or `None` if outside
    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

/// Framebuffer open configuration
///
/// Use `Builder` to create a Config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Path to the device node, e.g. `/dev/fb0`
    ///
    /// The mapping always covers the device's virtual resolution.
    pub device: PathBuf,
}

impl Config {
    /// Configuration for `device`
    pub fn for_device(device: impl AsRef<Path>) -> Self {
        Self {
            device: device.as_ref().to_path_buf(),
        }
    }
}

/// Builder for constructing framebuffer configuration
///
/// # Example
///
/// ```
/// use fbpix::Builder;
///
/// let config = match Builder::new().device("/dev/fb0").build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.device.to_str(), Some("/dev/fb0"));
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    /// Device node path (required)
    device: Option<PathBuf>,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device node path (required)
    pub fn device(mut self, path: impl AsRef<Path>) -> Self {
        self.device = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingDevice` if no device path was set
    pub fn build(self) -> Result<Config, BuilderError> {
        Ok(Config {
            device: self.device.ok_or(BuilderError::MissingDevice)?,
        })
    }
}
