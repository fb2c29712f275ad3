//! Output pixel storage.

use bytemuck::{Pod, Zeroable};
use ember_core::Color;

/// Linear float RGBA pixel, laid out for direct upload or byte casting.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Opaque pixel from an RGB colour.
    pub fn from_color(c: Color) -> Self {
        Self {
            r: c.x,
            g: c.y,
            b: c.z,
            a: 1.0,
        }
    }

    pub fn color(&self) -> Color {
        Color::new(self.r, self.g, self.b)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b),
            to_byte(self.a),
        ]
    }
}

#[inline]
fn to_byte(x: f32) -> u8 {
    (255.0 * x.clamp(0.0, 1.0)) as u8
}

/// Clamp to `[0, 1]` then apply gamma 2.
#[inline]
pub fn post_process(c: Color) -> Color {
    let c = c.clamp(Color::ZERO, Color::ONE);
    Color::new(c.x.sqrt(), c.y.sqrt(), c.z.sqrt())
}

/// Row-major image storage. Rendered scanline `i` (0 is the bottom of the
/// image) is stored in row `height - i - 1`, so `pixels()` starts with the
/// top row. Dropping the buffer frees it.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Opaque black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y` (top-down).
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Rgba) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = pixel;
        }
    }

    /// Write a rendered scanline. Scanline 0 is the bottom of the image.
    pub(crate) fn write_scanline(&mut self, scanline: u32, colors: &[Color]) {
        if scanline >= self.height {
            return;
        }
        let row = self.height - scanline - 1;
        for (x, c) in colors.iter().take(self.width as usize).enumerate() {
            self.set(x as u32, row, Rgba::from_color(*c));
        }
    }

    /// Raw float bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// 8-bit RGBA bytes, top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba8()).collect()
    }

    /// Mean colour over all pixels.
    pub fn average(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        let sum: Color = self.pixels.iter().map(Rgba::color).sum();
        sum / self.pixels.len() as f32
    }

    /// Hand the pixel storage to the caller.
    pub fn release(self) -> Vec<Rgba> {
        self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanlines_are_flipped() {
        let mut buf = PixelBuffer::new(2, 3);
        buf.write_scanline(0, &[Color::ONE, Color::ONE]);
        assert_eq!(buf.get(0, 2), Some(Rgba::from_color(Color::ONE)));
        assert_eq!(buf.get(0, 0), Some(Rgba::BLACK));
        assert_eq!(buf.get(2, 0), None);
    }

    #[test]
    fn test_pixels_start_with_top_row() {
        let mut buf = PixelBuffer::new(2, 3);
        let top = Color::new(0.0, 0.0, 1.0);
        let bottom = Color::new(1.0, 0.0, 0.0);
        buf.write_scanline(2, &[top, top]);
        buf.write_scanline(0, &[bottom, bottom]);

        let pixels = buf.pixels();
        assert_eq!(pixels[0].color(), top);
        assert_eq!(pixels[pixels.len() - 1].color(), bottom);
    }

    #[test]
    fn test_post_process() {
        let c = post_process(Color::new(0.25, 4.0, -1.0));
        assert_eq!(c, Color::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn test_byte_views() {
        let mut buf = PixelBuffer::new(2, 1);
        buf.set(1, 0, Rgba::from_color(Color::new(1.0, 0.5, 0.0)));
        assert_eq!(buf.as_bytes().len(), 2 * 16);
        assert_eq!(buf.to_rgba8(), vec![0, 0, 0, 255, 255, 127, 0, 255]);
        let pixels = buf.release();
        assert_eq!(pixels.len(), 2);
    }
}
