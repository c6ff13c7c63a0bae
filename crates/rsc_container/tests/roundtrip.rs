use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use rsc_container::{
    error::Error, BlockNode, ContainerFile, ContainerHeader, LoadOptions, Payload, ResourceInfo,
    ResourceNode, Store, Tag, TextureMeta,
};
use tracing_test::traced_test;

fn texture(name: &str, pixels: Vec<u8>) -> BlockNode {
    let mut resource = ResourceNode::new(name);
    resource.push_entry(
        ResourceInfo([4, 4, pixels.len() as u32, 0, 0, 0, 0, 0]),
        pixels,
    );

    BlockNode::new(Payload::Texture(TextureMeta {
        width: 4,
        height: 4,
        swizzle: 1,
        scanline: 16,
        unknown: [0xDEAD, 0, 0xBEEF],
        ..Default::default()
    }))
    .with_flags(0x0000_0100)
    .with_children(vec![BlockNode::new(Payload::Resource(resource))])
}

fn sample() -> ContainerFile {
    let mut font = ResourceNode::new("ui_font");
    font.names.push("ui_font_alias".into());
    font.data = b"FNTG".to_vec();
    font.adjust_size = true;

    ContainerFile {
        nodes: vec![
            BlockNode::new(Payload::Header(ContainerHeader {
                version: 7,
                unknown: 0x1234,
                ..Default::default()
            })),
            texture("logo", (0..64).collect()),
            texture("cursor", vec![0xFF; 64]),
            BlockNode::new(Payload::Resource(font))
                .with_children(vec![BlockNode::unknown(Tag(*b"XTRA"), vec![1, 2, 3, 4])]),
        ],
    }
}

#[test]
fn save_and_load() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("menu");

    let container = sample();
    container.save(&stem)?;

    assert!(Store::Index.path(&stem).exists());
    assert!(Store::Bulk.path(&stem).exists());
    assert_eq!(
        std::fs::metadata(Store::Bulk.path(&stem)).into_diagnostic()?.len(),
        128
    );

    let loaded = ContainerFile::load(&stem, LoadOptions::default())?;
    assert_eq!(
        loaded.resource_names(),
        vec!["logo", "cursor", "ui_font"]
    );
    assert_eq!(loaded.nodes.len(), container.nodes.len());
    assert_eq!(loaded.nodes[1..], container.nodes[1..]);

    let header = loaded.header().unwrap();
    assert_eq!((header.version, header.unknown), (7, 0x1234));
    assert_eq!(header.bulk_size, 128);

    // Saving the loaded tree again must give byte identical stores
    let again = dir.path().join("menu_again");
    loaded.save(&again)?;
    for store in [Store::Structure, Store::Index, Store::Bulk] {
        assert_eq!(
            std::fs::read(store.path(&stem)).into_diagnostic()?,
            std::fs::read(store.path(&again)).into_diagnostic()?,
            "{store} store differs"
        );
    }

    Ok(())
}

#[test]
fn save_removes_stale_stores() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("menu");
    sample().save(&stem)?;

    let bare = ContainerFile {
        nodes: vec![BlockNode::unknown(Tag(*b"MISC"), vec![])],
    };
    bare.save(&stem)?;

    assert!(!Store::Index.path(&stem).exists());
    assert!(!Store::Bulk.path(&stem).exists());
    assert_eq!(ContainerFile::load(&stem, LoadOptions::default())?, bare);

    Ok(())
}

#[test]
fn missing_bulk_strict() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("menu");
    sample().save(&stem)?;
    std::fs::remove_file(Store::Bulk.path(&stem)).into_diagnostic()?;

    let result = ContainerFile::load(&stem, LoadOptions::builder().strict(true).build());
    assert!(matches!(
        result,
        Err(Error::MissingStore {
            store: Store::Bulk,
            ..
        })
    ));

    Ok(())
}

#[traced_test]
#[test]
fn missing_bulk_tolerant() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let stem = dir.path().join("menu");
    sample().save(&stem)?;
    std::fs::remove_file(Store::Bulk.path(&stem)).into_diagnostic()?;

    let loaded = ContainerFile::load(&stem, LoadOptions::default())?;
    let logo = loaded.find_resource("logo")?;
    assert_eq!(logo.infos.len(), 1);
    assert!(logo.segments[0].is_empty());
    assert_eq!(loaded.find_resource("ui_font")?.data, b"FNTG");
    assert!(logs_contain("store is referenced but missing"));

    Ok(())
}

#[test]
fn missing_structure() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;

    let result = ContainerFile::load(dir.path().join("absent"), LoadOptions::default());
    assert!(matches!(result, Err(Error::IOError(_))));

    Ok(())
}
