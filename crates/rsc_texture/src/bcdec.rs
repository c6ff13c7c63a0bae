//! Block decompression backed by `bcdec_rs`

use tracing::debug;

use crate::codec::BlockDecompressor;
use crate::format::PixelFormat;

/// Decompresses every block compressed format with `bcdec_rs`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Bcdec;

/// Decode one block into 16 RGBA8 pixels, row major
fn decode_block(format: PixelFormat, block: &[u8]) -> Option<[u8; 64]> {
    let mut rgba = [0u8; 64];
    match format {
        PixelFormat::Bc1 => bcdec_rs::bc1(block, &mut rgba, 16),
        PixelFormat::Bc2 => bcdec_rs::bc2(block, &mut rgba, 16),
        PixelFormat::Bc3 => bcdec_rs::bc3(block, &mut rgba, 16),
        PixelFormat::Bc4 => {
            let mut red = [0u8; 16];
            bcdec_rs::bc4(block, &mut red, 4, false);
            for (pixel, r) in rgba.chunks_exact_mut(4).zip(red) {
                pixel.copy_from_slice(&[r, 0, 0, 0xFF]);
            }
        }
        PixelFormat::Bc5 => {
            let mut red_green = [0u8; 32];
            bcdec_rs::bc5(block, &mut red_green, 8, false);
            for (pixel, rg) in rgba.chunks_exact_mut(4).zip(red_green.chunks_exact(2)) {
                pixel.copy_from_slice(&[rg[0], rg[1], 0, 0xFF]);
            }
        }
        _ => return None,
    }
    Some(rgba)
}

impl BlockDecompressor for Bcdec {
    fn decompress(
        &self,
        format: PixelFormat,
        blocks: &[u8],
        width: u32,
        height: u32,
    ) -> Option<Vec<u8>> {
        let (columns, rows) = ((width / 4) as usize, (height / 4) as usize);
        let unit = format.unit_size();
        if blocks.len() < columns * rows * unit {
            debug!(len = blocks.len(), columns, rows, "not enough block data");
            return None;
        }

        let stride = width as usize * 4;
        let mut pixels = vec![0u8; stride * height as usize];
        for (i, block) in blocks.chunks_exact(unit).take(columns * rows).enumerate() {
            let rgba = decode_block(format, block)?;
            let (bx, by) = (i % columns, i / columns);
            for (row, texels) in rgba.chunks_exact(16).enumerate() {
                let start = (by * 4 + row) * stride + bx * 16;
                pixels[start..start + 16].copy_from_slice(texels);
            }
        }
        Some(pixels)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rsc_container::{ResourceInfo, ResourceNode, TextureMeta};

    use crate::bcdec::Bcdec;
    use crate::codec::{decode_with, BlockDecompressor};
    use crate::error::Result;
    use crate::format::PixelFormat;
    use crate::swizzle::UnitGrid;

    const RED: [u8; 8] = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];
    const GREEN: [u8; 8] = [0xE0, 0x07, 0xE0, 0x07, 0, 0, 0, 0];
    const BLUE: [u8; 8] = [0x1F, 0x00, 0x1F, 0x00, 0, 0, 0, 0];
    const WHITE: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];

    fn texture(format: PixelFormat, width: u16, height: u16, swizzle: u8) -> TextureMeta {
        TextureMeta {
            format: format.code(),
            width,
            height,
            swizzle,
            ..Default::default()
        }
    }

    fn resource(data: Vec<u8>) -> ResourceNode {
        let mut resource = ResourceNode::new("texture");
        resource.push_entry(ResourceInfo::default(), data);
        resource
    }

    #[test]
    fn solid_bc1_block() {
        let pixels = Bcdec.decompress(PixelFormat::Bc1, &RED, 4, 4);
        assert_eq!(pixels, Some([0xFF, 0, 0, 0xFF].repeat(16)));
    }

    #[test]
    fn short_blocks_are_rejected() {
        assert_eq!(Bcdec.decompress(PixelFormat::Bc1, &RED, 8, 4), None);
        assert_eq!(Bcdec.decompress(PixelFormat::Argb8888, &[0; 16], 4, 4), None);
    }

    #[test]
    fn blocks_are_placed_row_major() {
        let blocks = [RED, GREEN, BLUE, WHITE].concat();
        let pixels = Bcdec
            .decompress(PixelFormat::Bc1, &blocks, 8, 8)
            .unwrap_or_default();

        let at = |x: usize, y: usize| &pixels[(y * 8 + x) * 4..][..4];
        assert_eq!(at(0, 0), [0xFF, 0, 0, 0xFF]);
        assert_eq!(at(7, 3), [0, 0xFF, 0, 0xFF]);
        assert_eq!(at(3, 4), [0, 0, 0xFF, 0xFF]);
        assert_eq!(at(4, 7), [0xFF; 4]);
    }

    #[test]
    fn single_channel_block_through_codec() -> Result<()> {
        let block = vec![0x80, 0x80, 0, 0, 0, 0, 0, 0];
        let decoded = decode_with(
            &texture(PixelFormat::Bc4, 4, 4, 1),
            &resource(block),
            Some(&Bcdec),
        )?;

        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.image.pixel(2, 1), [0x80, 0x80, 0x80, 0xFF]);

        Ok(())
    }

    #[test]
    fn morton_tiled_blocks() -> Result<()> {
        // 2x2 blocks inside one 8x8 unit tile, stored in Morton order
        let grid = UnitGrid::new(PixelFormat::Bc1, 8, 8);
        let mut tiled = vec![0; grid.tiled_len()];
        tiled[..32].copy_from_slice(&[RED, GREEN, BLUE, WHITE].concat());

        let decoded = decode_with(
            &texture(PixelFormat::Bc1, 8, 8, 0),
            &resource(tiled),
            Some(&Bcdec),
        )?;

        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.image.pixel(1, 1), [0xFF, 0, 0, 0xFF]);
        assert_eq!(decoded.image.pixel(5, 2), [0, 0xFF, 0, 0xFF]);
        assert_eq!(decoded.image.pixel(2, 6), [0, 0, 0xFF, 0xFF]);
        assert_eq!(decoded.image.pixel(7, 7), [0xFF; 4]);

        Ok(())
    }

    #[test]
    fn pow2_blocks_are_cropped() -> Result<()> {
        // 6x5 display stored as 8x8
        let mut meta = texture(PixelFormat::Bc1, 6, 5, 1);
        meta.flags = TextureMeta::FLAG_POW2;
        meta.scanline = 16;

        let blocks = [RED, GREEN, BLUE, WHITE].concat();
        let decoded = decode_with(&meta, &resource(blocks), Some(&Bcdec))?;

        assert_eq!((decoded.image.width, decoded.image.height), (6, 5));
        assert_eq!(decoded.image.pixel(5, 0), [0, 0xFF, 0, 0xFF]);
        assert_eq!(decoded.image.pixel(5, 4), [0xFF; 4]);

        Ok(())
    }
}
