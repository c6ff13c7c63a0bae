//! Growable byte buffer with deferred pointer fix-ups.
//!
//! Several header fields depend on data which is only known once the rest of the tree
//! has been written (payload lengths, store sizes). Rather than seeking back into an
//! output device, those fields are written as placeholders, remembered as a
//! [`PatchSite`] and filled in by [`PatchBuffer::finish`].

use std::io::{self, Write};

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::error::{Error, Result};

/// A reserved `u32` field awaiting its final value
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PatchSite(usize);

#[derive(Debug)]
struct Fixup {
    position: usize,
    label: &'static str,
    value: Option<u32>,
}

#[derive(Debug, Default)]
pub struct PatchBuffer {
    data: Vec<u8>,
    fixups: Vec<Fixup>,
}

impl PatchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Write a placeholder `u32` and return the site to patch later
    pub fn reserve_u32(&mut self, label: &'static str) -> PatchSite {
        let site = PatchSite(self.fixups.len());
        self.fixups.push(Fixup {
            position: self.data.len(),
            label,
            value: None,
        });
        self.data.extend_from_slice(&[0; 4]);
        site
    }

    /// Record the final value of a reserved field
    pub fn resolve(&mut self, site: PatchSite, value: u32) {
        let fixup = &mut self.fixups[site.0];
        trace!(label = fixup.label, position = fixup.position, value, "resolved patch site");
        fixup.value = Some(value);
    }

    /// Apply every recorded fix-up and return the bytes
    pub fn finish(mut self) -> Result<Vec<u8>> {
        for fixup in &self.fixups {
            let value = fixup.value.ok_or(Error::PatchUnresolved(fixup.label))?;
            LittleEndian::write_u32(&mut self.data[fixup.position..fixup.position + 4], value);
        }
        Ok(self.data)
    }
}

impl Write for PatchBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
