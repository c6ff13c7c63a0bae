//! PNG files as [`RgbaImage`] rasters

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use miette::{miette, Context, IntoDiagnostic, Result};
use rsc_texture::RgbaImage;

/// Open `path` for writing, refusing to replace an existing file unless `overwrite`
pub fn create(path: &Path, overwrite: bool) -> Result<File> {
    let file = if overwrite {
        File::create(path)
    } else {
        File::create_new(path)
    };
    file.into_diagnostic()
        .context(format!("creating {}", path.display()))
}

/// Read a PNG of any color type and bit depth as 8 bit RGBA
pub fn read_png(path: &Path) -> Result<RgbaImage> {
    let file = File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))?;

    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .into_diagnostic()
        .context(format!("decoding {}", path.display()))?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buffer)
        .into_diagnostic()
        .context(format!("decoding {}", path.display()))?;
    buffer.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgba => buffer,
        png::ColorType::Rgb => buffer
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0xFF])
            .collect(),
        png::ColorType::GrayscaleAlpha => buffer
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buffer.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        other => {
            return Err(miette!(
                "unsupported color type {other:?} in {}",
                path.display()
            ))
        }
    };

    RgbaImage::from_raw(info.width, info.height, pixels)
        .context(format!("path: {}", path.display()))
}

/// Write `image` as an 8 bit RGBA PNG
pub fn write_png(path: &Path, image: &RgbaImage, overwrite: bool) -> Result<()> {
    let file = create(path, overwrite)?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    let mut writer = encoder
        .write_header()
        .into_diagnostic()
        .context(format!("writing {}", path.display()))?;
    writer
        .write_image_data(&image.pixels)
        .into_diagnostic()
        .context(format!("writing {}", path.display()))?;
    writer
        .finish()
        .into_diagnostic()
        .context(format!("writing {}", path.display()))
}
