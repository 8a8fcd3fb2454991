//! Linux Framebuffer Pixel Access
//!
//! Opens an fbdev device, detects its native pixel layout, maps its memory into
//! the process and converts runs of pixels between that layout and RGB24.
//!
//! ## Features
//!
//! - RGB565, RGB888 and XRGB8888 native layouts, with device-reported channel positions
//! - Zero-copy: reads and writes go directly to mapped device memory
//! - Linear-offset bulk conversion plus per-coordinate helpers
//! - Deterministic unmapping via [`Framebuffer::close`] or `Drop`
//! - `embedded-graphics` integration (with `graphics` feature)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fbpix::{Builder, Framebuffer};
//!
//! let config = match Builder::new().device("/dev/fb0").build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! let mut fb = match Framebuffer::open(&config) {
//!     Ok(fb) => fb,
//!     Err(_) => return,
//! };
//!
//! // Paint the first row red, then read it back as RGB24
//! let width = fb.width() as usize;
//! let row = [255u8, 0, 0].repeat(width);
//! let _ = fb.pack(width, 0, &row);
//!
//! let mut rgb = vec![0u8; width * 3];
//! let _ = fb.unpack(width, 0, &mut rgb);
//!
//! let _ = fb.close();
//! ```

/// Bulk native ⇄ RGB24 conversion
pub mod codec;
/// Open configuration types and builder
pub mod config;
/// Framebuffer handle
pub mod device;
/// Error types for the crate
pub mod error;
/// Native pixel layouts
pub mod format;
/// fbdev ioctl and memory mapping
pub mod sys;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

pub use config::{Builder, Config, Geometry};
pub use device::Framebuffer;
pub use error::{BuilderError, Error};
pub use format::{ChannelField, ChannelOffsets, PixelLayout};
pub use sys::Mapping;
