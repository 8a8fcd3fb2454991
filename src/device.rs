//! Framebuffer handle and pixel I/O

use std::path::Path;

use log::{debug, trace, warn};

use crate::codec::{self, RGB_BYTES};
use crate::config::{Config, Geometry};
use crate::error::Error;
use crate::format::PixelLayout;
use crate::sys::{self, Mapping, VarScreenInfo};

type DeviceResult<T = ()> = core::result::Result<T, Error>;

/// An open framebuffer
///
/// Owns the geometry, the native [`PixelLayout`] and the backing memory. For a
/// real device the backing store is a [`Mapping`] of device memory, so every
/// [`pack`](Self::pack) is visible on screen without any flush.
///
/// ## Type Parameters
///
/// * `B` - Backing store; [`Mapping`] for devices, anything implementing
///   `AsRef<[u8]>`/`AsMut<[u8]>` (e.g. `Vec<u8>`) for off-screen use
///
/// ## Example
///
/// ```
/// use fbpix::{ChannelOffsets, Framebuffer, Geometry, PixelLayout};
///
/// let geometry = match Geometry::new(4, 4) {
///     Ok(geometry) => geometry,
///     Err(_) => return,
/// };
/// let layout = PixelLayout::Rgb565(ChannelOffsets::new(11, 5, 0));
/// let mut fb = match Framebuffer::from_parts(geometry, layout, vec![0u8; 32]) {
///     Ok(fb) => fb,
///     Err(_) => return,
/// };
///
/// let _ = fb.pack(1, 0, &[255, 0, 0]);
/// let mut rgb = [0u8; 3];
/// let _ = fb.unpack(1, 0, &mut rgb);
/// assert_eq!(rgb, [248, 0, 0]);
/// ```
pub struct Framebuffer<B = Mapping> {
    /// Pixel dimensions
    geometry: Geometry,
    /// Native pixel encoding
    layout: PixelLayout,
    /// Exactly `geometry.buffer_size(layout.bytes_per_pixel())` bytes
    buffer: B,
}

impl Framebuffer<Mapping> {
    /// Open the device at `path` with default configuration
    pub fn open_path(path: impl AsRef<Path>) -> DeviceResult<Self> {
        Self::open(&Config::for_device(path))
    }

    /// Open a framebuffer device, detect its layout and map its memory
    ///
    /// # Errors
    ///
    /// - `Error::DeviceUnavailable` if the device cannot be opened read/write
    /// - `Error::QueryFailed` if the video mode cannot be read
    /// - `Error::UnsupportedFormat` if the layout is not RGB565/RGB888/XRGB8888
    /// - `Error::InvalidGeometry` if the reported virtual resolution is empty
    /// - `Error::MappingFailed` if device memory cannot be mapped
    ///
    /// The device descriptor is closed before returning on every path.
    pub fn open(config: &Config) -> DeviceResult<Self> {
        let path = config.device.as_path();
        let fb = Self::open_inner(path)
            .inspect_err(|err| warn!("failed to open {}: {err}", path.display()))?;
        debug!(
            "opened {}: {}x{} {:?}",
            path.display(),
            fb.geometry.width,
            fb.geometry.height,
            fb.layout
        );
        Ok(fb)
    }

    fn open_inner(path: &Path) -> DeviceResult<Self> {
        let file = sys::open_device(path)?;
        let info = sys::query_mode(&file)?;

        let layout = PixelLayout::classify(
            info.bits_per_pixel,
            info.red.field(),
            info.green.field(),
            info.blue.field(),
        )?;

        let geometry = mode_geometry(&info)?;
        let buffer = Mapping::new(&file, geometry.buffer_size(layout.bytes_per_pixel()))?;
        // The mapping outlives the descriptor.
        drop(file);

        Ok(Self {
            geometry,
            layout,
            buffer,
        })
    }

    /// Unmap device memory
    ///
    /// Consumes the handle so the memory can no longer be reached. Dropping
    /// the handle releases it too, but can only log a failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReleaseFailed` if `munmap` fails.
    pub fn close(self) -> DeviceResult {
        let len = self.buffer.len();
        self.buffer
            .unmap()
            .map_err(|source| Error::ReleaseFailed { source })?;
        debug!("released {len} bytes of framebuffer memory");
        Ok(())
    }
}

impl<B> Framebuffer<B>
where
    B: AsRef<[u8]>,
{
    /// Pair a backing store with a geometry and layout
    ///
    /// # Errors
    ///
    /// - `Error::InvalidGeometry` if `geometry` would not pass [`Geometry::new`]
    /// - `Error::BufferSizeMismatch` unless `buffer` is exactly
    ///   `geometry.buffer_size(layout.bytes_per_pixel())` bytes
    pub fn from_parts(geometry: Geometry, layout: PixelLayout, buffer: B) -> DeviceResult<Self> {
        let geometry = validate(geometry.width, geometry.height)?;
        let expected = geometry.buffer_size(layout.bytes_per_pixel());
        let provided = buffer.as_ref().len();
        if provided != expected {
            return Err(Error::BufferSizeMismatch { expected, provided });
        }
        Ok(Self {
            geometry,
            layout,
            buffer,
        })
    }

    /// Pixel dimensions
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    /// Native pixel layout
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Bytes per native pixel (2, 3 or 4)
    pub fn bytes_per_pixel(&self) -> usize {
        self.layout.bytes_per_pixel()
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.geometry.pixel_count()
    }

    /// Raw native bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Give back the backing store
    pub fn into_inner(self) -> B {
        self.buffer
    }

    /// Byte range of `count` pixels from `offset`, checked against the
    /// framebuffer and against an RGB buffer of `rgb_len` bytes
    fn span(&self, count: usize, offset: usize, rgb_len: usize) -> DeviceResult<(usize, usize)> {
        let capacity = self.pixel_count();
        if offset.checked_add(count).is_none_or(|end| end > capacity) {
            return Err(Error::OutOfRange {
                offset,
                count,
                capacity,
            });
        }
        let required = count * RGB_BYTES;
        if rgb_len < required {
            return Err(Error::BufferTooSmall {
                required,
                provided: rgb_len,
            });
        }
        let bpp = self.bytes_per_pixel();
        Ok((offset * bpp, (offset + count) * bpp))
    }

    /// Read `count` pixels starting at linear `offset` as RGB24 into `rgb`
    ///
    /// # Errors
    ///
    /// - `Error::OutOfRange` if `offset + count` exceeds the pixel count
    /// - `Error::BufferTooSmall` if `rgb` is shorter than `count * 3`
    ///
    /// On error `rgb` is left untouched.
    pub fn unpack(&self, count: usize, offset: usize, rgb: &mut [u8]) -> DeviceResult {
        let (start, end) = self.span(count, offset, rgb.len())?;
        trace!("unpack {count} pixels at {offset}");
        codec::unpack(self.layout, &self.buffer.as_ref()[start..end], rgb);
        Ok(())
    }

    /// Read the pixel at `(x, y)` as RGB24
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfRange` if the coordinate lies outside the framebuffer.
    pub fn read_pixel(&self, x: u32, y: u32) -> DeviceResult<[u8; 3]> {
        let offset = self.coordinate(x, y)?;
        let mut rgb = [0u8; RGB_BYTES];
        self.unpack(1, offset, &mut rgb)?;
        Ok(rgb)
    }

    /// Read every pixel as RGB24
    pub fn snapshot(&self) -> Vec<u8> {
        let mut rgb = vec![0u8; self.pixel_count() * RGB_BYTES];
        codec::unpack(self.layout, self.buffer.as_ref(), &mut rgb);
        rgb
    }

    fn coordinate(&self, x: u32, y: u32) -> DeviceResult<usize> {
        self.geometry.offset(x, y).ok_or(Error::OutOfRange {
            offset: (y as usize)
                .saturating_mul(self.geometry.width as usize)
                .saturating_add(x as usize),
            count: 1,
            capacity: self.pixel_count(),
        })
    }
}

impl<B> Framebuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Write `count` RGB24 pixels from `rgb` starting at linear `offset`
    ///
    /// # Errors
    ///
    /// - `Error::OutOfRange` if `offset + count` exceeds the pixel count
    /// - `Error::BufferTooSmall` if `rgb` is shorter than `count * 3`
    ///
    /// On error the framebuffer is left untouched.
    pub fn pack(&mut self, count: usize, offset: usize, rgb: &[u8]) -> DeviceResult {
        let (start, end) = self.span(count, offset, rgb.len())?;
        trace!("pack {count} pixels at {offset}");
        codec::pack(self.layout, rgb, &mut self.buffer.as_mut()[start..end]);
        Ok(())
    }

    /// Write one RGB24 pixel at `(x, y)`
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfRange` if the coordinate lies outside the framebuffer.
    pub fn write_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) -> DeviceResult {
        let offset = self.coordinate(x, y)?;
        self.pack(1, offset, &rgb)
    }

    /// Write one RGB24 pixel at a linear offset already known to be in range
    #[cfg_attr(not(feature = "graphics"), allow(dead_code))]
    pub(crate) fn store(&mut self, offset: usize, rgb: [u8; 3]) {
        let bpp = self.bytes_per_pixel();
        let start = offset * bpp;
        if let Some(native) = self.buffer.as_mut().get_mut(start..start + bpp) {
            codec::pack(self.layout, &rgb, native);
        }
    }

    /// Set every pixel to `rgb`
    pub fn fill(&mut self, rgb: [u8; 3]) {
        let bpp = self.bytes_per_pixel();
        let mut native = [0u8; 4];
        codec::pack(self.layout, &rgb, &mut native[..bpp]);
        for pixel in self.buffer.as_mut().chunks_exact_mut(bpp) {
            pixel.copy_from_slice(&native[..bpp]);
        }
    }
}

fn validate(width: u32, height: u32) -> DeviceResult<Geometry> {
    Geometry::new(width, height).map_err(|_| Error::InvalidGeometry { width, height })
}

/// Geometry of device memory for a video mode
///
/// Rows in fbdev memory are `xres_virtual` pixels long and the mapping starts
/// at the top of the virtual area, so only the virtual resolution describes
/// it. The visible resolution and panning offsets are ignored.
fn mode_geometry(info: &VarScreenInfo) -> DeviceResult<Geometry> {
    validate(info.xres_virtual, info.yres_virtual)
}

impl<B> core::fmt::Debug for Framebuffer<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("geometry", &self.geometry)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ChannelOffsets;

    const RGB565: PixelLayout = PixelLayout::Rgb565(ChannelOffsets::new(11, 5, 0));
    const RGB888: PixelLayout = PixelLayout::Rgb888(ChannelOffsets::new(16, 8, 0));
    const XRGB8888: PixelLayout = PixelLayout::Xrgb8888(ChannelOffsets::new(16, 8, 0));

    fn test_framebuffer(layout: PixelLayout) -> Framebuffer<Vec<u8>> {
        let geometry = Geometry::new(4, 4).unwrap();
        let buffer = vec![0u8; geometry.buffer_size(layout.bytes_per_pixel())];
        Framebuffer::from_parts(geometry, layout, buffer).unwrap()
    }

    #[test]
    fn test_from_parts_checks_buffer_size() {
        let geometry = Geometry::new(4, 4).unwrap();
        let result = Framebuffer::from_parts(geometry, RGB888, vec![0u8; 47]);
        assert!(matches!(
            result,
            Err(Error::BufferSizeMismatch {
                expected: 48,
                provided: 47
            })
        ));
    }

    #[test]
    fn test_from_parts_rejects_unvalidated_geometry() {
        let geometry = Geometry {
            width: u32::MAX,
            height: u32::MAX,
        };
        let result = Framebuffer::from_parts(geometry, XRGB8888, vec![0u8; 4]);
        assert!(matches!(
            result,
            Err(Error::InvalidGeometry {
                width: u32::MAX,
                height: u32::MAX
            })
        ));

        let empty = Geometry {
            width: 0,
            height: 4,
        };
        let result = Framebuffer::from_parts(empty, RGB565, Vec::new());
        assert!(matches!(result, Err(Error::InvalidGeometry { width: 0, .. })));
    }

    #[test]
    fn test_mode_geometry_uses_virtual_resolution() {
        let info = VarScreenInfo {
            xres: 800,
            yres: 600,
            xres_virtual: 1024,
            yres_virtual: 1200,
            yoffset: 600,
            ..VarScreenInfo::default()
        };
        let geometry = mode_geometry(&info).unwrap();
        assert_eq!(geometry, Geometry::new(1024, 1200).unwrap());
        // Row 1 starts one full virtual row into device memory.
        assert_eq!(geometry.offset(0, 1), Some(1024));
    }

    #[test]
    fn test_mode_geometry_rejects_empty_mode() {
        let info = VarScreenInfo {
            xres: 800,
            yres: 600,
            ..VarScreenInfo::default()
        };
        assert!(matches!(
            mode_geometry(&info),
            Err(Error::InvalidGeometry {
                width: 0,
                height: 0
            })
        ));
    }

    #[test]
    fn test_store_writes_one_native_pixel() {
        let mut fb = test_framebuffer(RGB888);
        fb.store(5, [1, 2, 3]);
        assert_eq!(fb.read_pixel(1, 1).unwrap(), [1, 2, 3]);
        assert_eq!(fb.as_bytes().iter().filter(|&&b| b != 0).count(), 3);
    }

    #[test]
    fn test_accessors() {
        let fb = test_framebuffer(XRGB8888);
        assert_eq!(fb.width(), 4);
        assert_eq!(fb.height(), 4);
        assert_eq!(fb.bytes_per_pixel(), 4);
        assert_eq!(fb.pixel_count(), 16);
        assert_eq!(fb.as_bytes().len(), 64);
        assert_eq!(fb.layout(), XRGB8888);
    }

    #[test]
    fn test_unpack_rgb565_red_word() {
        let mut bytes = test_framebuffer(RGB565).into_inner();
        bytes[..2].copy_from_slice(&0xF800u16.to_ne_bytes());
        let fb = Framebuffer::from_parts(Geometry::new(4, 4).unwrap(), RGB565, bytes).unwrap();

        let mut rgb = [0xAAu8; 3];
        fb.unpack(1, 0, &mut rgb).unwrap();
        assert_eq!(rgb, [248, 0, 0]);
    }

    #[test]
    fn test_pack_xrgb8888_at_offset_zero() {
        let mut fb = test_framebuffer(XRGB8888);
        fb.pack(1, 0, &[10, 20, 30]).unwrap();
        let bytes = fb.as_bytes();
        let word = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(word & 0x00FF_FFFF, (10 << 16) | (20 << 8) | 30);
        assert_eq!(word >> 24, 0xFF);
        assert!(bytes[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_run_ending_exactly_at_capacity_succeeds() {
        let mut fb = test_framebuffer(RGB888);
        let rgb = [7u8; 12];
        fb.pack(4, 12, &rgb).unwrap();

        let mut out = [0u8; 12];
        fb.unpack(4, 12, &mut out).unwrap();
        assert_eq!(out, rgb);

        let mut all = [0u8; 48];
        fb.unpack(16, 0, &mut all).unwrap();
    }

    #[test]
    fn test_out_of_range_leaves_output_untouched() {
        for layout in [RGB565, RGB888, XRGB8888] {
            let fb = test_framebuffer(layout);
            let mut rgb = [0xAAu8; 6];
            let result = fb.unpack(2, 15, &mut rgb);
            assert!(matches!(
                result,
                Err(Error::OutOfRange {
                    offset: 15,
                    count: 2,
                    capacity: 16
                })
            ));
            assert_eq!(rgb, [0xAA; 6]);
        }
    }

    #[test]
    fn test_out_of_range_leaves_framebuffer_untouched() {
        for layout in [RGB565, RGB888, XRGB8888] {
            let mut fb = test_framebuffer(layout);
            let result = fb.pack(17, 0, &[0xFF; 51]);
            assert!(matches!(result, Err(Error::OutOfRange { .. })));
            let result = fb.pack(1, 16, &[0xFF; 3]);
            assert!(matches!(result, Err(Error::OutOfRange { .. })));
            assert!(fb.as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_offset_overflow_is_out_of_range() {
        let fb = test_framebuffer(RGB565);
        let mut rgb = [0u8; 3];
        let result = fb.unpack(1, usize::MAX, &mut rgb);
        assert!(matches!(result, Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_short_rgb_buffer_is_rejected() {
        let mut fb = test_framebuffer(RGB888);
        let result = fb.pack(2, 0, &[1, 2, 3]);
        assert!(matches!(
            result,
            Err(Error::BufferTooSmall {
                required: 6,
                provided: 3
            })
        ));
        assert!(fb.as_bytes().iter().all(|&b| b == 0));

        let mut rgb = [0u8; 5];
        let result = fb.unpack(2, 0, &mut rgb);
        assert!(matches!(result, Err(Error::BufferTooSmall { .. })));
    }

    #[test]
    fn test_zero_count_is_a_no_op() {
        let mut fb = test_framebuffer(RGB565);
        fb.pack(0, 16, &[0u8; 0]).unwrap();
        fb.unpack(0, 16, &mut [0u8; 0]).unwrap();
    }

    #[test]
    fn test_channel_isolation_per_layout() {
        let cases = [
            (RGB565, [0xFF, 0, 0], [248, 0, 0]),
            (RGB565, [0, 0xFF, 0], [0, 252, 0]),
            (RGB565, [0, 0, 0xFF], [0, 0, 248]),
            (RGB888, [0xFF, 0, 0], [255, 0, 0]),
            (RGB888, [0, 0xFF, 0], [0, 255, 0]),
            (RGB888, [0, 0, 0xFF], [0, 0, 255]),
            (XRGB8888, [0xFF, 0, 0], [255, 0, 0]),
            (XRGB8888, [0, 0xFF, 0], [0, 255, 0]),
            (XRGB8888, [0, 0, 0xFF], [0, 0, 255]),
        ];
        for (layout, input, expected) in cases {
            let mut fb = test_framebuffer(layout);
            fb.write_pixel(2, 1, input).unwrap();
            assert_eq!(fb.read_pixel(2, 1).unwrap(), expected, "{layout:?}");
            assert_eq!(fb.read_pixel(1, 1).unwrap(), [0, 0, 0]);
        }
    }

    #[test]
    fn test_quantized_rgb_round_trips() {
        let mut fb = test_framebuffer(RGB565);
        let rgb: Vec<u8> = (0..16u8)
            .flat_map(|i| [i * 8, i * 16, 248 - i * 8])
            .collect();
        fb.pack(16, 0, &rgb).unwrap();
        assert_eq!(fb.snapshot(), rgb);
    }

    #[test]
    fn test_pixel_coordinates_out_of_range() {
        let mut fb = test_framebuffer(RGB888);
        assert!(matches!(
            fb.read_pixel(4, 0),
            Err(Error::OutOfRange { count: 1, .. })
        ));
        assert!(matches!(
            fb.write_pixel(0, 4, [1, 2, 3]),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_fill_and_snapshot() {
        let mut fb = test_framebuffer(XRGB8888);
        fb.fill([1, 2, 3]);
        let snapshot = fb.snapshot();
        assert_eq!(snapshot.len(), 48);
        assert!(snapshot.chunks_exact(3).all(|px| px == [1, 2, 3]));
        assert!(fb.as_bytes().chunks_exact(4).all(|px| {
            u32::from_ne_bytes([px[0], px[1], px[2], px[3]]) == 0xFF01_0203
        }));
    }

    #[test]
    fn test_open_missing_device() {
        let result = Framebuffer::open_path("/nonexistent/fbpix/fb0");
        assert!(matches!(result, Err(Error::DeviceUnavailable { .. })));
    }

    #[test]
    fn test_open_non_framebuffer_fails_query() {
        let path = std::env::temp_dir().join(format!("fbpix-{}-notfb", std::process::id()));
        std::fs::write(&path, [0u8; 64]).unwrap();
        let result = Framebuffer::open_path(&path);
        assert!(matches!(result, Err(Error::QueryFailed { .. })));
        std::fs::remove_file(path).unwrap();
    }
}
