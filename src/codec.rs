//! Bulk conversion between native pixel memory and RGB24
//!
//! These functions work on plain byte slices and know nothing about devices;
//! [`Framebuffer`](crate::device::Framebuffer) performs range checks and
//! hands them the right window of mapped memory.
//!
//! Both directions convert as many whole pixels as fit in *both* slices and
//! return that count.
//!
//! ## Example
//!
//! ```
//! use fbpix::{codec, ChannelOffsets, PixelLayout};
//!
//! let layout = PixelLayout::Rgb888(ChannelOffsets::new(16, 8, 0));
//! let mut native = [0u8; 6];
//! codec::pack(layout, &[1, 2, 3, 4, 5, 6], &mut native);
//! assert_eq!(native, [3, 2, 1, 6, 5, 4]);
//!
//! let mut rgb = [0u8; 6];
//! codec::unpack(layout, &native, &mut rgb);
//! assert_eq!(rgb, [1, 2, 3, 4, 5, 6]);
//! ```

use crate::format::PixelLayout;

/// Bytes per RGB24 pixel
pub const RGB_BYTES: usize = 3;

/// Convert native pixels in `native` to RGB24 in `rgb`
///
/// Returns the number of pixels converted.
pub fn unpack(layout: PixelLayout, native: &[u8], rgb: &mut [u8]) -> usize {
    let src = native.chunks_exact(layout.bytes_per_pixel());
    let dst = rgb.chunks_exact_mut(RGB_BYTES);
    let mut converted = 0;

    match layout {
        PixelLayout::Rgb565(_) => {
            for (s, d) in src.zip(dst) {
                let word = u16::from_ne_bytes([s[0], s[1]]);
                d.copy_from_slice(&layout.decode(word as u32));
                converted += 1;
            }
        }
        PixelLayout::Rgb888(_) => {
            for (s, d) in src.zip(dst) {
                let word = u32::from_le_bytes([s[0], s[1], s[2], 0]);
                d.copy_from_slice(&layout.decode(word));
                converted += 1;
            }
        }
        PixelLayout::Xrgb8888(_) => {
            for (s, d) in src.zip(dst) {
                let word = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&layout.decode(word));
                converted += 1;
            }
        }
    }

    converted
}

/// Convert RGB24 pixels in `rgb` to native pixels in `native`
///
/// Returns the number of pixels converted.
pub fn pack(layout: PixelLayout, rgb: &[u8], native: &mut [u8]) -> usize {
    let src = rgb.chunks_exact(RGB_BYTES);
    let dst = native.chunks_exact_mut(layout.bytes_per_pixel());
    let mut converted = 0;

    match layout {
        PixelLayout::Rgb565(_) => {
            for (s, d) in src.zip(dst) {
                let word = layout.encode([s[0], s[1], s[2]]) as u16;
                d.copy_from_slice(&word.to_ne_bytes());
                converted += 1;
            }
        }
        PixelLayout::Rgb888(_) => {
            for (s, d) in src.zip(dst) {
                let word = layout.encode([s[0], s[1], s[2]]);
                d.copy_from_slice(&word.to_le_bytes()[..3]);
                converted += 1;
            }
        }
        PixelLayout::Xrgb8888(_) => {
            for (s, d) in src.zip(dst) {
                let word = layout.encode([s[0], s[1], s[2]]);
                d.copy_from_slice(&word.to_ne_bytes());
                converted += 1;
            }
        }
    }

    converted
}
