//! In memory rasters exchanged with the outside world.

use derive_more::derive::Deref;

use crate::error::{Error, Result};

/// Row major RGBA8 raster, four bytes per pixel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// A transparent black raster
    pub fn new(width: u32, height: u32) -> Self {
        RgbaImage {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(RgbaImage {
            width,
            height,
            pixels,
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// # Panics
    ///
    /// Panics if the coordinate is outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i..i + 4].copy_from_slice(&rgba);
        }
    }

    /// Copy out a rectangle. Parts outside this raster come out transparent black.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
        let mut out = RgbaImage::new(width, height);
        out.blit_from(self, x, y);
        out
    }

    /// Draw `src` with its top left corner at `(x, y)`, clipped to this raster
    pub fn blit(&mut self, src: &RgbaImage, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let columns = src.width.min(self.width - x) as usize;
        for row in 0..src.height.min(self.height - y) {
            let from = src.index(0, row);
            let to = self.index(x, y + row);
            self.pixels[to..to + columns * 4].copy_from_slice(&src.pixels[from..from + columns * 4]);
        }
    }

    /// Fill this raster from the rectangle of `src` starting at `(x, y)`
    fn blit_from(&mut self, src: &RgbaImage, x: u32, y: u32) {
        if x >= src.width || y >= src.height {
            return;
        }
        let columns = self.width.min(src.width - x) as usize;
        for row in 0..self.height.min(src.height - y) {
            let from = src.index(x, y + row);
            let to = self.index(0, row);
            self.pixels[to..to + columns * 4].copy_from_slice(&src.pixels[from..from + columns * 4]);
        }
    }
}

/// A 256 entry palette of RGBA8 colors
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct Palette(Vec<[u8; 4]>);

impl Palette {
    pub const ENTRIES: usize = 256;

    /// Interpret stored B, G, R, A quadruples.
    ///
    /// Missing entries are transparent black. Returns the palette and the number of
    /// entries actually present in `data`.
    pub fn from_bgra(data: &[u8]) -> (Palette, usize) {
        let mut entries = data
            .chunks_exact(4)
            .take(Self::ENTRIES)
            .map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
            .collect::<Vec<_>>();
        let present = entries.len();
        entries.resize(Self::ENTRIES, [0; 4]);
        (Palette(entries), present)
    }

    /// Stored B, G, R, A form of the palette
    pub fn to_bgra(&self) -> Vec<u8> {
        self.0
            .iter()
            .flat_map(|[r, g, b, a]| [*b, *g, *r, *a])
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Error;
    use crate::image::{Palette, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.set_pixel(x, y, [x as u8, y as u8, 0, 0xFF]);
            }
        }
        image
    }

    #[test]
    fn crop_inside() {
        let image = gradient(8, 8);
        let cropped = image.crop(2, 3, 2, 2);

        assert_eq!((cropped.width, cropped.height), (2, 2));
        assert_eq!(cropped.pixel(0, 0), [2, 3, 0, 0xFF]);
        assert_eq!(cropped.pixel(1, 1), [3, 4, 0, 0xFF]);
    }

    #[test]
    fn crop_past_edge() {
        let image = gradient(4, 4);
        let cropped = image.crop(3, 3, 2, 2);

        assert_eq!(cropped.pixel(0, 0), [3, 3, 0, 0xFF]);
        assert_eq!(cropped.pixel(1, 0), [0, 0, 0, 0]);
        assert_eq!(cropped.pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_clips() {
        let mut canvas = RgbaImage::new(4, 4);
        canvas.blit(&gradient(3, 3), 2, 2);

        assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 0xFF]);
        assert_eq!(canvas.pixel(3, 3), [1, 1, 0, 0xFF]);
        assert_eq!(canvas.pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn raw_size_checked() {
        assert!(matches!(
            RgbaImage::from_raw(2, 2, vec![0; 15]),
            Err(Error::BufferSize {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn short_palette() {
        let (palette, present) = Palette::from_bgra(&[0x01, 0x02, 0x03, 0x04, 0xFF]);

        assert_eq!(present, 1);
        assert_eq!(palette.len(), Palette::ENTRIES);
        assert_eq!(palette[0], [0x03, 0x02, 0x01, 0x04]);
        assert_eq!(palette[255], [0; 4]);
        assert_eq!(&palette.to_bgra()[..4], &[0x01, 0x02, 0x03, 0x04]);
    }
}
