//! Graphics support via embedded-graphics
//!
//! [`Framebuffer`] implements the
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) trait with
//! [`Rgb888`] as its color type, so anything from the embedded-graphics
//! ecosystem can render straight into device memory. Colors are converted to
//! the native layout on write; pixels outside the framebuffer are skipped.
//!
//! ## Example
//!
//! ```
//! use embedded_graphics::{
//!     pixelcolor::Rgb888,
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use fbpix::{ChannelOffsets, Framebuffer, Geometry, PixelLayout};
//!
//! let geometry = match Geometry::new(8, 8) {
//!     Ok(geometry) => geometry,
//!     Err(_) => return,
//! };
//! let layout = PixelLayout::Xrgb8888(ChannelOffsets::new(16, 8, 0));
//! let mut fb = match Framebuffer::from_parts(geometry, layout, vec![0u8; 256]) {
//!     Ok(fb) => fb,
//!     Err(_) => return,
//! };
//!
//! let _ = Rectangle::new(Point::new(2, 2), Size::new(4, 4))
//!     .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
//!     .draw(&mut fb);
//!
//! assert_eq!(fb.read_pixel(3, 3).ok(), Some([255, 0, 0]));
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::{Rgb888, RgbColor},
    prelude::Pixel,
};

use crate::device::Framebuffer;

impl<B> OriginDimensions for Framebuffer<B>
where
    B: AsRef<[u8]>,
{
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl<B> DrawTarget for Framebuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let geometry = self.geometry();

        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            let Some(offset) = geometry.offset(x as u32, y as u32) else {
                continue;
            };
            self.store(offset, [color.r(), color.g(), color.b()]);
        }

        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill([color.r(), color.g(), color.b()]);
        Ok(())
    }
}
