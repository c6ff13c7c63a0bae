use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rsc_container::{ContainerFile, LoadOptions, ResourceInfo, ResourceNode, TextureMeta};
use rsc_texture::{
    decode, encode,
    format::{decode_texels, encode_texels},
    replace, texture_nodes, PixelFormat, RgbaImage, TextureNode, TextureWarning,
};

fn pixels(width: u32, height: u32) -> impl Strategy<Value = RgbaImage> {
    prop::collection::vec(any::<u8>(), (width * height * 4) as usize)
        .prop_map(move |pixels| RgbaImage::from_raw(width, height, pixels).unwrap())
}

fn images() -> impl Strategy<Value = RgbaImage> {
    (1u32..=33, 1u32..=33).prop_flat_map(|(w, h)| pixels(w, h))
}

proptest! {
    #[test]
    fn argb_round_trip(image in images()) {
        let (meta, resource) = encode(&image, "image").unwrap();
        let decoded = decode(&meta, &resource).unwrap();

        prop_assert!(decoded.warnings.is_empty());
        prop_assert_eq!(decoded.image, image);
    }

    #[test]
    fn sixteen_bit_round_trip(
        raw in prop::collection::vec(any::<u16>(), 1..256),
        format in prop::sample::select(vec![
            PixelFormat::Bgr565,
            PixelFormat::Bgra5551,
            PixelFormat::Bgra4444,
        ]),
    ) {
        let raw = raw.into_iter().flat_map(u16::to_le_bytes).collect::<Vec<_>>();
        let mut rgba = vec![0u8; raw.len() * 2];
        decode_texels(format, &raw, None, &mut rgba).unwrap();

        prop_assert_eq!(encode_texels(format, &rgba).unwrap(), raw);
    }
}

#[test]
fn replace_through_disk() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("hud");

    let mut container = ContainerFile::new();
    container.push(TextureNode::build("health", &RgbaImage::new(4, 4))?);
    container.push(TextureNode::build("ammo", &RgbaImage::new(2, 2))?);
    container.save(&stem)?;

    let mut loaded = ContainerFile::load(&stem, LoadOptions::default())?;
    let replacement = RgbaImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8])?;
    replace(&mut loaded, "ammo", &replacement)?;
    loaded.save(&stem)?;

    let reloaded = ContainerFile::load(&stem, LoadOptions::default())?;
    let decoded = texture_nodes(&reloaded)
        .map(|t| {
            let name = t.name().unwrap_or_default().to_string();
            t.decode().map(|d| (name, d.image))
        })
        .collect::<rsc_texture::error::Result<Vec<_>>>()?;

    assert_eq!(
        decoded,
        vec![
            ("health".to_string(), RgbaImage::new(4, 4)),
            ("ammo".to_string(), replacement),
        ]
    );

    Ok(())
}

#[test]
fn palette_texture_missing_entry() -> Result<()> {
    let mut resource = ResourceNode::new("indexed");
    resource.push_entry(ResourceInfo::default(), vec![0; 4]);
    let meta = TextureMeta {
        format: PixelFormat::Indexed8.code(),
        width: 2,
        height: 2,
        palette: 1,
        palette_id: 5,
        swizzle: 1,
        ..Default::default()
    };

    let decoded = decode(&meta, &resource)?;
    assert_eq!(decoded.warnings, vec![TextureWarning::MissingPalette(5)]);
    assert_eq!(decoded.image.pixel(0, 0), [0, 0, 0, 0xFF]);

    Ok(())
}
