//! Image primitives and utilities.
//!
//! The project uses a lightweight owned RGB image type (`OwnedImage`) that is
//! cheap to crop and resize. Most code borrows a view (`Image<'a>`) instead of
//! copying pixels, and converts to an owned image only when it has to resample.

use anyhow::{Context, Result, ensure};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = if width == 0 { 0 } else { bytes.len() / width / 4 };
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Build an image of `width × height` from a per-pixel function.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Decode an encoded image (PNG, WebP, ...). Transparent pixels are composited onto black.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode image")?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let data = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                let a = a as u16;
                let blend = |c: u8| ((c as u16 * a) / 255) as u8;
                Color::new(blend(r), blend(g), blend(b))
            })
            .collect();

        Ok(Self { width, height, data })
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_encoded(&bytes).with_context(|| format!("load {}", path.display()))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resample to exactly `width × height`.
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) with Catmull-Rom filtering.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self> {
        ensure!(self.width > 0 && self.height > 0, "cannot resize an empty image");
        ensure!(width > 0 && height > 0, "cannot resize to an empty image");
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }

        let src = fast_image_resize::images::Image::from_vec_u8(
            self.width,
            self.height,
            self.as_image().get_bytes(),
            fast_image_resize::PixelType::U8x3,
        )
        .context("fast_image_resize: source image")?;
        let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Convolution(fast_image_resize::FilterType::CatmullRom),
        );
        fast_image_resize::Resizer::new()
            .resize(&src, &mut dst, &options)
            .context("fast_image_resize: resize")?;

        let data = dst
            .into_vec()
            .chunks_exact(3)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();

        Ok(Self { width, height, data })
    }

    pub fn map_pixels(&mut self, f: impl Fn(&mut Color)) {
        for v in &mut self.data {
            f(v);
        }
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image(&self) -> Image<'_> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[(x + y * self.width) as usize].luma()])
        })
    }

    pub fn pixels(&self) -> &[Color] {
        &self.data
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy, Debug)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                data.push(*self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    /// Tightly packed RGB bytes, row-major.
    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                bytes.extend_from_slice(&[clr.r, clr.g, clr.b]);
            }
        }
        bytes
    }

    /// Create an arbitrary subimage (relative coordinates), clamped to this view.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    pub fn average_color(&self) -> Color {
        if self.is_empty() {
            return Color::BLACK;
        }

        let mut r = 0u64;
        let mut g = 0u64;
        let mut b = 0u64;

        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                r += clr.r as u64;
                g += clr.g as u64;
                b += clr.b as u64;
            }
        }

        let count = self.width() as u64 * self.height() as u64;
        Color {
            r: (r / count) as u8,
            g: (g / count) as u8,
            b: (b / count) as u8,
        }
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> OwnedImage {
        OwnedImage::from_fn(w, h, |x, y| Color::new((x * 10) as u8, (y * 10) as u8, 50))
    }

    #[test]
    fn sub_image_is_clamped_to_bounds() {
        let img = gradient(10, 8);
        let view = img.as_image().sub_image(6, 5, 100, 100);
        assert_eq!((view.width(), view.height()), (4, 3));
        assert_eq!(view.to_owned_image().pixels()[0], Color::new(60, 50, 50));

        let empty = img.as_image().sub_image(20, 20, 5, 5);
        assert!(empty.is_empty());
        assert_eq!(empty.average_color(), Color::BLACK);
    }

    #[test]
    fn rgba_round_trips_through_bytes() {
        let rgba = [1, 2, 3, 255, 4, 5, 6, 0, 7, 8, 9, 255, 10, 11, 12, 255];
        let img = OwnedImage::from_rgba(2, &rgba);
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.as_image().get_bytes(), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn average_color_of_uniform_view() {
        let img = OwnedImage::from_fn(4, 4, |_, _| Color::new(10, 20, 30));
        assert_eq!(img.as_image().average_color(), Color::new(10, 20, 30));
    }

    #[test]
    fn resize_produces_requested_size() {
        let img = gradient(20, 10);
        let out = img.resized(8, 8).unwrap();
        assert_eq!((out.width(), out.height()), (8, 8));
        assert_eq!(out.pixels().len(), 64);
        assert!(OwnedImage::from_fn(0, 0, |_, _| Color::BLACK).resized(4, 4).is_err());
    }

    #[test]
    fn decodes_png_bytes() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 50, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let img = OwnedImage::from_encoded(&png).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.pixels()[5], Color::new(200, 100, 50));
    }
}
