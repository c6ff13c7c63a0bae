use std::path::Path;

use clap::{CommandFactory, Parser};
use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use rsc::commands::Commands;
use rsc_container::{
    BlockNode, ContainerFile, ContainerHeader, LoadOptions, Payload, ResourceInfo, ResourceNode,
    TextureMeta,
};
use rsc_font::{fonts, FontPacker, FontResource, GlyphImage, Kerning};
use rsc_texture::{texture_nodes, PixelFormat, RgbaImage, TextureNode};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn run_cli(args: &[&str]) -> Result<()> {
    let cli = Cli::try_parse_from(std::iter::once("rsc").chain(args.iter().copied()))
        .into_diagnostic()?;
    cli.command.handle()
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            image.set_pixel(x, y, [(x * 16) as u8, (y * 16) as u8, 0x80, 0xFF]);
        }
    }
    image
}

fn font() -> Result<FontResource> {
    let glyphs = [('A', 5, 7), ('B', 6, 7), ('C', 4, 3)]
        .into_iter()
        .map(|(c, w, h)| GlyphImage {
            codepoint: c as u32,
            kerning: Kerning {
                left: 1,
                right: -1,
                vertical: (c as u8 - b'@') as i8,
            },
            image: gradient(w, h),
        })
        .collect::<Vec<_>>();
    Ok(FontPacker::builder().name("menu").build().pack(&glyphs)?)
}

fn write_sample(stem: &Path) -> Result<()> {
    let mut container = ContainerFile::new();
    container.push(BlockNode::new(Payload::Header(ContainerHeader {
        version: 1,
        ..Default::default()
    })));
    container.push(TextureNode::build("logo", &gradient(8, 4))?);
    container.push(font()?.into_node()?);
    Ok(container.save(stem)?)
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| miette::miette!("temporary path is not UTF-8"))
}

#[test]
fn extract_then_pack() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("ui.rsc");
    write_sample(&stem)?;
    let original = ContainerFile::load(&stem, LoadOptions::default())?;

    run_cli(&["extract", "--file", path_arg(&stem)?, "--debug-image", "--delete-original"])?;
    assert!(!stem.exists());

    let extracted = dir.path().join("ui.rsc.extracted");
    for file in ["logo.png", "menu/U+0041.png", "menu/U+0043.png", "menu/glyphs.json", "menu/debug.png"] {
        assert!(extracted.join(file).is_file(), "{file} missing");
    }
    assert!(!extracted.join("menu.atlas.png").exists());

    run_cli(&["pack", "--directory", path_arg(dir.path())?])?;
    let packed = ContainerFile::load(&stem, LoadOptions::default())?;

    assert_eq!(packed.resource_names(), original.resource_names());
    assert_eq!(packed.header().map(|h| h.version), Some(1));

    let logo = |c: &ContainerFile| -> Result<RgbaImage> {
        let texture = texture_nodes(c)
            .find(|t| t.name() == Some("logo"))
            .ok_or_else(|| miette::miette!("logo missing"))?;
        Ok(texture.decode()?.image)
    };
    assert_eq!(logo(&packed)?, logo(&original)?);

    let font_of = |c: &ContainerFile| -> Result<FontResource> {
        let node = fonts(c)
            .next()
            .ok_or_else(|| miette::miette!("font missing"))?;
        Ok(FontResource::from_node(node)?)
    };
    assert_eq!(font_of(&packed)?, font_of(&original)?);

    Ok(())
}

#[test]
fn extract_refuses_existing_output() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("ui.rsc");
    write_sample(&stem)?;

    run_cli(&["extract", "--file", path_arg(&stem)?])?;
    assert!(run_cli(&["extract", "--file", path_arg(&stem)?]).is_err());
    run_cli(&["extract", "--file", path_arg(&stem)?, "--overwrite"])?;

    Ok(())
}

#[test]
fn replace_texture() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("ui.rsc");
    write_sample(&stem)?;

    let png = dir.path().join("new.png");
    rsc::raster::write_png(&png, &gradient(2, 2), false)?;

    run_cli(&["replace", "--file", path_arg(&stem)?, "--resource", "logo", "--image", path_arg(&png)?])?;
    let replaced = ContainerFile::load(&stem, LoadOptions::default())?;
    let logo = texture_nodes(&replaced)
        .find(|t| t.name() == Some("logo"))
        .ok_or_else(|| miette::miette!("logo missing"))?;
    assert_eq!((logo.meta.width, logo.meta.height), (2, 2));

    assert!(run_cli(&[
        "replace",
        "--file",
        path_arg(&stem)?,
        "--resource",
        "missing",
        "--image",
        path_arg(&png)?
    ])
    .is_err());

    Ok(())
}

#[test]
fn batch_isolates_failures() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    write_sample(&dir.path().join("good.rsc"))?;
    std::fs::write(dir.path().join("bad.rsc"), b"not a container").into_diagnostic()?;

    assert!(run_cli(&["extract", "--directory", path_arg(dir.path())?, "--extension", "rsc"]).is_err());
    assert!(dir.path().join("good.rsc.extracted/logo.png").is_file());

    run_cli(&["name", "--file", path_arg(&dir.path().join("good.rsc"))?])?;

    Ok(())
}

/// A 4x4 BC1 texture of one solid red block
fn bc1_texture(name: &str) -> BlockNode {
    let meta = TextureMeta {
        format: PixelFormat::Bc1.code(),
        width: 4,
        height: 4,
        swizzle: 1,
        scanline: 8,
        ..Default::default()
    };
    let mut resource = ResourceNode::new(name);
    resource.push_entry(
        ResourceInfo([4, 4, 8, PixelFormat::Bc1.code(), 0, 0, 0, 0]),
        vec![0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0],
    );
    BlockNode::new(Payload::Texture(meta))
        .with_children(vec![BlockNode::new(Payload::Resource(resource))])
}

#[test]
fn compressed_texture_is_decompressed() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("ui.rsc");
    let mut container = ContainerFile::new();
    container.push(bc1_texture("red"));
    container.save(&stem)?;

    run_cli(&["extract", "--file", path_arg(&stem)?])?;
    let image = rsc::raster::read_png(&dir.path().join("ui.rsc.extracted/red.png"))?;
    assert_eq!((image.width, image.height), (4, 4));
    assert_eq!(image.pixels, [0xFF, 0, 0, 0xFF].repeat(16));

    Ok(())
}

#[test]
fn bad_resource_name_is_isolated() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("ui.rsc");
    let mut container = ContainerFile::new();
    container.push(TextureNode::build("a/b", &gradient(2, 2))?);
    container.push(TextureNode::build("good", &gradient(2, 2))?);
    container.save(&stem)?;

    assert!(run_cli(&["extract", "--file", path_arg(&stem)?]).is_err());
    let extracted = dir.path().join("ui.rsc.extracted");
    assert!(extracted.join("good.png").is_file());
    assert!(!extracted.join("a").exists());

    Ok(())
}

#[test]
fn pack_help_names_dropped_fields() {
    let command = Cli::command();
    let help = command
        .find_subcommand("pack")
        .and_then(|pack| pack.get_long_about())
        .map(|about| about.to_string())
        .unwrap_or_default();
    assert!(help.contains("version 1 header"));
    assert!(help.contains("are not kept"));
}

#[test]
fn target_is_required() {
    assert!(Cli::try_parse_from(["rsc", "name"]).is_err());
    assert!(Cli::try_parse_from(["rsc", "name", "--cwd", "--file", "a"]).is_err());
}
