//! The three physical byte stores behind a container and pointer resolution into them.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bon::Builder;
use derive_more::derive::Display;
use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::patch::PatchBuffer;

/// Identifies one of the stores making up a container
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Store {
    /// The block tree, always present
    #[display("structure")]
    Structure,

    /// Resource name strings
    #[display("secondary-index")]
    Index,

    /// External payload segments
    #[display("bulk")]
    Bulk,
}

impl Store {
    /// Suffix appended to the path stem for this store's file
    pub fn suffix(self) -> &'static str {
        match self {
            Store::Structure => "",
            Store::Index => "i",
            Store::Bulk => "v",
        }
    }

    /// Path of this store's file for a given stem
    pub fn path(self, stem: impl AsRef<Path>) -> PathBuf {
        let mut path = OsString::from(stem.as_ref().as_os_str());
        path.push(self.suffix());
        PathBuf::from(path)
    }
}

/// Options controlling how a container is loaded
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct LoadOptions {
    /// Fail with [`Error::MissingStore`] when an absent optional store is referenced
    #[builder(default)]
    pub strict: bool,
}

/// The raw bytes of every store of a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stores {
    structure: Vec<u8>,
    index: Option<Vec<u8>>,
    bulk: Option<Vec<u8>>,
    stem: Option<PathBuf>,
}

impl Stores {
    pub fn new(structure: Vec<u8>, index: Option<Vec<u8>>, bulk: Option<Vec<u8>>) -> Self {
        Stores {
            structure,
            index,
            bulk,
            stem: None,
        }
    }

    /// Read every store sharing `stem`. Only the structure store is required.
    #[instrument(skip_all, fields(stem = %stem.as_ref().display()), err)]
    pub fn read(stem: impl AsRef<Path>) -> Result<Self> {
        let stem = stem.as_ref();
        Ok(Stores {
            structure: fs::read(stem)?,
            index: read_optional(&Store::Index.path(stem))?,
            bulk: read_optional(&Store::Bulk.path(stem))?,
            stem: Some(stem.to_path_buf()),
        })
    }

    /// Write every store to files sharing `stem`.
    ///
    /// An absent optional store removes any file left over from a previous save.
    #[instrument(skip_all, fields(stem = %stem.as_ref().display()), err)]
    pub fn write(&self, stem: impl AsRef<Path>) -> Result<()> {
        let stem = stem.as_ref();
        fs::write(stem, &self.structure)?;
        for (store, data) in [(Store::Index, &self.index), (Store::Bulk, &self.bulk)] {
            let path = store.path(stem);
            match data {
                Some(data) => fs::write(&path, data)?,
                None => match fs::remove_file(&path) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                },
            }
        }
        Ok(())
    }

    /// Bytes of a store, if present
    pub fn get(&self, store: Store) -> Option<&[u8]> {
        match store {
            Store::Structure => Some(&self.structure),
            Store::Index => self.index.as_deref(),
            Store::Bulk => self.bulk.as_deref(),
        }
    }

    /// Path stem the stores were read from
    pub fn stem(&self) -> Option<&Path> {
        self.stem.as_deref()
    }

    fn location(&self, store: Store) -> String {
        match &self.stem {
            Some(stem) => store.path(stem).display().to_string(),
            None => "<memory>".into(),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolves pointers found in the structure store against the other stores
pub(crate) struct Resolver<'a> {
    stores: &'a Stores,
    options: LoadOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(stores: &'a Stores, options: LoadOptions) -> Self {
        Resolver { stores, options }
    }

    /// The data of a store which is about to be dereferenced.
    ///
    /// In tolerant mode an absent store yields `None` after logging a warning.
    fn referenced(&self, store: Store) -> Result<Option<&'a [u8]>> {
        match self.stores.get(store) {
            Some(data) => Ok(Some(data)),
            None if self.options.strict => Err(Error::MissingStore {
                store,
                location: self.stores.location(store),
            }),
            None => {
                warn!(%store, "store is referenced but missing, continuing with empty data");
                Ok(None)
            }
        }
    }

    /// Bytes `offset..offset + length` of a store
    pub fn resolve(&self, store: Store, offset: u32, length: u32) -> Result<&'a [u8]> {
        if length == 0 {
            return Ok(&[]);
        }
        let Some(data) = self.referenced(store)? else {
            return Ok(&[]);
        };

        let start = offset as usize;
        let end = start + length as usize;
        data.get(start..end).ok_or_else(|| {
            Error::format(
                offset as u64,
                format!(
                    "{store} segment of {length:#x} bytes exceeds store length {:#x}",
                    data.len()
                ),
            )
        })
    }

    /// `count` NUL terminated strings starting at `offset`
    pub fn strings(&self, store: Store, offset: u32, count: u32) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let Some(data) = self.referenced(store)? else {
            return Ok(Vec::new());
        };

        let mut rest = data.get(offset as usize..).ok_or_else(|| {
            Error::format(offset as u64, format!("{store} offset exceeds store length"))
        })?;
        let mut position = offset as usize;

        let mut result = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let Some(end) = rest.iter().position(|b| *b == 0) else {
                return Err(Error::format(
                    position as u64,
                    format!("unterminated string in {store} store"),
                ));
            };
            result.push(String::from_utf8(rest[..end].to_vec())?);
            rest = &rest[end + 1..];
            position += end + 1;
        }
        Ok(result)
    }
}

/// Accumulates the output stores while a container is serialized
#[derive(Debug, Default)]
pub(crate) struct StoreWriter {
    pub structure: PatchBuffer,
    index: Vec<u8>,
    bulk: Vec<u8>,
}

impl StoreWriter {
    /// Append `bytes` to a store and return their offset
    pub fn allocate(&mut self, store: Store, bytes: &[u8]) -> Result<u32> {
        let target = match store {
            Store::Structure => self.structure.bytes_mut(),
            Store::Index => &mut self.index,
            Store::Bulk => &mut self.bulk,
        };
        let offset = u32::try_from(target.len()).map_err(|_| Error::StoreOverflow(store))?;
        u32::try_from(target.len() + bytes.len()).map_err(|_| Error::StoreOverflow(store))?;
        target.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Current length of a store
    pub fn len(&self, store: Store) -> Result<u32> {
        let len = match store {
            Store::Structure => self.structure.len(),
            Store::Index => self.index.len(),
            Store::Bulk => self.bulk.len(),
        };
        u32::try_from(len).map_err(|_| Error::StoreOverflow(store))
    }

    /// Apply every patch and produce the final stores. Empty optional stores are omitted.
    pub fn finish(self) -> Result<Stores> {
        let structure = self.structure.finish()?;
        let optional = |data: Vec<u8>| if data.is_empty() { None } else { Some(data) };
        Ok(Stores::new(
            structure,
            optional(self.index),
            optional(self.bulk),
        ))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tracing_test::traced_test;

    use crate::error::{Error, Result};
    use crate::store::{LoadOptions, Resolver, Store, StoreWriter, Stores};

    #[test]
    fn store_paths() {
        let stem = Path::new("data/ui_font");
        assert_eq!(Store::Structure.path(stem), Path::new("data/ui_font"));
        assert_eq!(Store::Index.path(stem), Path::new("data/ui_fonti"));
        assert_eq!(Store::Bulk.path(stem), Path::new("data/ui_fontv"));
    }

    #[test]
    fn resolve_in_range() -> Result<()> {
        let stores = Stores::new(vec![], None, Some(vec![1, 2, 3, 4, 5]));
        let resolver = Resolver::new(&stores, LoadOptions::default());

        assert_eq!(resolver.resolve(Store::Bulk, 1, 3)?, &[2, 3, 4]);
        assert_eq!(resolver.resolve(Store::Bulk, 9, 0)?, &[] as &[u8]);

        Ok(())
    }

    #[test]
    fn resolve_out_of_range() {
        let stores = Stores::new(vec![], None, Some(vec![1, 2, 3]));
        let resolver = Resolver::new(&stores, LoadOptions::default());

        let result = resolver.resolve(Store::Bulk, 2, 4);
        assert!(matches!(result, Err(Error::Format { offset: 2, .. })));
    }

    #[test]
    fn resolve_missing_strict() {
        let stores = Stores::new(vec![], None, None);
        let resolver = Resolver::new(&stores, LoadOptions::builder().strict(true).build());

        let result = resolver.resolve(Store::Bulk, 0, 4);
        assert!(matches!(
            result,
            Err(Error::MissingStore {
                store: Store::Bulk,
                ..
            })
        ));
    }

    #[traced_test]
    #[test]
    fn resolve_missing_tolerant() -> Result<()> {
        let stores = Stores::new(vec![], None, None);
        let resolver = Resolver::new(&stores, LoadOptions::default());

        assert!(resolver.resolve(Store::Bulk, 0, 4)?.is_empty());
        assert!(resolver.strings(Store::Index, 0, 2)?.is_empty());
        assert!(logs_contain("store is referenced but missing"));

        Ok(())
    }

    #[test]
    fn read_strings() -> Result<()> {
        let stores = Stores::new(vec![], Some(b"skip\0font\0atlas\0".to_vec()), None);
        let resolver = Resolver::new(&stores, LoadOptions::default());

        assert_eq!(resolver.strings(Store::Index, 5, 2)?, vec!["font", "atlas"]);
        assert!(matches!(
            resolver.strings(Store::Index, 5, 3),
            Err(Error::Format { .. })
        ));

        Ok(())
    }

    #[test]
    fn allocate_returns_offsets() -> Result<()> {
        let mut writer = StoreWriter::default();
        assert_eq!(writer.allocate(Store::Bulk, &[1, 2, 3])?, 0);
        assert_eq!(writer.allocate(Store::Bulk, &[4])?, 3);
        assert_eq!(writer.allocate(Store::Index, b"a\0")?, 0);

        let stores = writer.finish()?;
        assert_eq!(stores.get(Store::Bulk), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(stores.get(Store::Index), Some(&b"a\0"[..]));

        Ok(())
    }
}
