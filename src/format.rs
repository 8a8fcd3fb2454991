//! Native pixel layouts
//!
//! This module defines the [`PixelLayout`] enum for the three native encodings
//! a framebuffer may use, and the per-word conversion to and from RGB24.
//!
//! ## Supported Layouts
//!
//! | Layout       | Bytes | Depth | Channel widths | Word order     |
//! |--------------|-------|-------|----------------|----------------|
//! | `Rgb565`     | 2     | 16    | 5/6/5          | host           |
//! | `Rgb888`     | 3     | 24    | 8/8/8          | little-endian  |
//! | `Xrgb8888`   | 4     | 32    | 8/8/8 + pad    | host           |
//!
//! Channel positions within the word come from the device and are carried in
//! [`ChannelOffsets`].
//!
//! ## Example
//!
//! ```
//! use fbpix::{ChannelField, PixelLayout};
//!
//! let layout = PixelLayout::classify(
//!     16,
//!     ChannelField::new(11, 5),
//!     ChannelField::new(5, 6),
//!     ChannelField::new(0, 5),
//! )
//! .unwrap();
//!
//! assert_eq!(layout.bytes_per_pixel(), 2);
//! assert_eq!(layout.decode(0xF800), [248, 0, 0]);
//! assert_eq!(layout.encode([248, 0, 0]), 0xF800);
//! ```

use crate::error::Error;

/// Position and width of one color channel inside a native pixel word
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelField {
    /// Bit offset of the channel's least significant bit
    pub offset: u32,
    /// Channel width in bits
    pub length: u32,
}

impl ChannelField {
    /// Create a channel field
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }
}

/// Bit offsets of the red, green and blue channels within a native word
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelOffsets {
    /// Red channel shift
    pub red: u32,
    /// Green channel shift
    pub green: u32,
    /// Blue channel shift
    pub blue: u32,
}

impl ChannelOffsets {
    /// Create channel offsets
    pub const fn new(red: u32, green: u32, blue: u32) -> Self {
        Self { red, green, blue }
    }
}

/// Native pixel layout of a framebuffer
///
/// Closed set; the variant decides bytes per pixel and channel widths, the
/// payload decides where each channel sits. Every channel must lie inside the
/// native word, which [`PixelLayout::classify`] guarantees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 16-bit packed, 5-bit red, 6-bit green, 5-bit blue
    Rgb565(ChannelOffsets),
    /// 24-bit, 8 bits per channel, stored little-endian
    Rgb888(ChannelOffsets),
    /// 32-bit, 8 bits per channel plus 8 bits of alpha/padding
    Xrgb8888(ChannelOffsets),
}

impl PixelLayout {
    /// Classify a device's reported mode
    ///
    /// Accepts exactly:
    /// - 32 bpp with 8/8/8 channels → [`PixelLayout::Xrgb8888`]
    /// - 24 bpp with 8/8/8 channels → [`PixelLayout::Rgb888`]
    /// - 16 bpp with 5/6/5 channels → [`PixelLayout::Rgb565`]
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` for any other depth/width
    /// combination, or when a channel does not fit inside the pixel word.
    pub fn classify(
        bits_per_pixel: u32,
        red: ChannelField,
        green: ChannelField,
        blue: ChannelField,
    ) -> Result<Self, Error> {
        let unsupported = Error::UnsupportedFormat {
            bits_per_pixel,
            red: red.length,
            green: green.length,
            blue: blue.length,
        };

        let widths = (red.length, green.length, blue.length);
        let offsets = ChannelOffsets::new(red.offset, green.offset, blue.offset);
        let layout = match (bits_per_pixel, widths) {
            (32, (8, 8, 8)) => Self::Xrgb8888(offsets),
            (24, (8, 8, 8)) => Self::Rgb888(offsets),
            (16, (5, 6, 5)) => Self::Rgb565(offsets),
            _ => return Err(unsupported),
        };

        let fits = [red, green, blue]
            .iter()
            .all(|field| field.offset.saturating_add(field.length) <= bits_per_pixel);
        if !fits {
            return Err(unsupported);
        }

        Ok(layout)
    }

    /// Bytes occupied by one native pixel (2, 3 or 4)
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb565(_) => 2,
            Self::Rgb888(_) => 3,
            Self::Xrgb8888(_) => 4,
        }
    }

    /// Bits per native pixel (16, 24 or 32)
    pub const fn bits_per_pixel(self) -> u32 {
        self.bytes_per_pixel() as u32 * 8
    }

    /// Channel shifts
    pub const fn offsets(self) -> ChannelOffsets {
        match self {
            Self::Rgb565(offsets) | Self::Rgb888(offsets) | Self::Xrgb8888(offsets) => offsets,
        }
    }

    /// Red, green and blue channel widths in bits
    pub const fn channel_lengths(self) -> (u32, u32, u32) {
        match self {
            Self::Rgb565(_) => (5, 6, 5),
            Self::Rgb888(_) | Self::Xrgb8888(_) => (8, 8, 8),
        }
    }

    /// Bits of the native word not covered by any color channel
    ///
    /// Zero for `Rgb565` and `Rgb888`; the padding byte for `Xrgb8888`.
    pub fn padding_mask(self) -> u32 {
        let (r, g, b) = self.channel_lengths();
        let offsets = self.offsets();
        let used = (mask(r) << offsets.red) | (mask(g) << offsets.green) | (mask(b) << offsets.blue);
        match self {
            Self::Xrgb8888(_) => !used,
            Self::Rgb565(_) | Self::Rgb888(_) => 0,
        }
    }

    /// Convert one native pixel word to RGB24
    ///
    /// Each channel is shifted down, masked to its width so neighbouring
    /// channels cannot leak in, then scaled to 8 bits.
    pub fn decode(self, word: u32) -> [u8; 3] {
        let (r, g, b) = self.channel_lengths();
        let offsets = self.offsets();
        [
            extract(word, offsets.red, r),
            extract(word, offsets.green, g),
            extract(word, offsets.blue, b),
        ]
    }

    /// Convert one RGB24 pixel to a native pixel word
    ///
    /// Channels are truncated to their native width. For `Xrgb8888` the
    /// padding bits are set, so written pixels are always fully opaque.
    pub fn encode(self, rgb: [u8; 3]) -> u32 {
        let (r, g, b) = self.channel_lengths();
        let offsets = self.offsets();
        insert(rgb[0], offsets.red, r)
            | insert(rgb[1], offsets.green, g)
            | insert(rgb[2], offsets.blue, b)
            | self.padding_mask()
    }
}

const fn mask(length: u32) -> u32 {
    (1 << length) - 1
}

fn extract(word: u32, offset: u32, length: u32) -> u8 {
    (((word >> offset) & mask(length)) << (8 - length)) as u8
}

fn insert(value: u8, offset: u32, length: u32) -> u32 {
    ((value as u32) >> (8 - length)) << offset
}
