//! Uniform view over the archive formats the scanner descends into.
//!
//! A [`Container`] is an opened archive: it knows its filename, can hash its
//! own raw bytes, and yields its non-directory entries exactly once, in the
//! archive's own order. Gzip never becomes a container — the decompressed
//! stream is reclassified and the inner archive (if any) is opened instead.

mod tar;
mod zip;

use std::io::Read;
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;

use crate::content::ContentReader;
use crate::detect::{detect, ArchiveKind};

pub use self::tar::TarContainer;
pub use self::zip::ZipContainer;

/// A single entry inside an open container. The reader is consumed at most
/// once and is only valid while the container is open.
pub struct ContentFile<'e> {
    is_dir: bool,
    size: i64,
    content: ContentReader<'e>,
}

impl<'e> ContentFile<'e> {
    pub fn new(
        name: String,
        is_dir: bool,
        size: i64,
        reader: Box<dyn Read + 'e>,
    ) -> std::io::Result<Self> {
        let content = ContentReader::new(name, size, reader)?;
        Ok(Self { is_dir, size, content })
    }

    pub fn name(&self) -> &str {
        self.content.filename()
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Uncompressed size, -1 when unknown.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn content_mut(&mut self) -> &mut ContentReader<'e> {
        &mut self.content
    }

    pub fn into_content(self) -> ContentReader<'e> {
        self.content
    }
}

/// Where a container's bytes live. A filesystem path gives the zip decoder
/// the random access it needs through a second file handle; a nested stream
/// forces a spill into a pooled buffer.
pub enum Backing<'p> {
    Path(&'p Path),
    Stream,
}

pub enum Container<'a> {
    Zip(ZipContainer<'a>),
    Tar(TarContainer<'a>),
}

impl<'a> Container<'a> {
    pub fn filename(&self) -> &str {
        match self {
            Container::Zip(c) => c.filename(),
            Container::Tar(c) => c.filename(),
        }
    }

    /// Hex SHA-256 of the container's own raw bytes (for gzip-wrapped
    /// archives, of the decompressed stream that was reclassified).
    pub fn hash(&mut self) -> Result<String> {
        match self {
            Container::Zip(c) => c.hash(),
            Container::Tar(c) => c.hash(),
        }
    }

    /// Visit every non-directory entry whose name passes `include`, in the
    /// container's own order. Errors returned by `visit` abort the walk;
    /// errors produced while decoding the archive itself surface as `Err`
    /// from this call.
    pub fn for_each_entry(
        &mut self,
        include: &dyn Fn(&str) -> bool,
        visit: &mut dyn FnMut(ContentFile<'_>) -> Result<()>,
    ) -> Result<()> {
        match self {
            Container::Zip(c) => c.for_each_entry(include, visit),
            Container::Tar(c) => c.for_each_entry(include, visit),
        }
    }
}

/// Open `content` as a container if its leading bytes say it is an archive.
///
/// Gzip is unwrapped in place: the decompressed stream is wrapped in a fresh
/// hashing reader (size unknown) and re-detected, so `x.tar.gz` comes back
/// as a tar container that still reports the outer filename.
pub fn open<'a>(content: ContentReader<'a>, backing: Backing<'_>) -> Result<Option<Container<'a>>> {
    match detect(content.header()) {
        None => Ok(None),
        Some(ArchiveKind::Gzip) => {
            let filename = content.filename().to_string();
            let decoder = GzDecoder::new(content);
            let inner = ContentReader::new(filename, -1, Box::new(decoder))?;
            open(inner, Backing::Stream)
        }
        Some(ArchiveKind::Tar) => Ok(Some(Container::Tar(TarContainer::new(content)))),
        Some(ArchiveKind::Zip) => Ok(Some(Container::Zip(ZipContainer::open(content, backing)?))),
    }
}
