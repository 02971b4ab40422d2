use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};

use super::{Backing, ContentFile};
use crate::content::ContentReader;
use crate::pool::{self, ByteView};

/// An opened zip (or jar — same format).
///
/// Zip's central directory lives at the end of the file, so the decoder
/// needs random access. A filesystem-backed zip gets that from a second
/// file handle; a zip nested inside another stream is spilled through the
/// hash tee into a pooled buffer first, which also completes its hash.
pub struct ZipContainer<'a> {
    filename: String,
    // `archive` must drop before `spill` so the spill buffer's last view is
    // released back to the pool.
    archive: zip::ZipArchive<ZipBacking>,
    spill: Option<ByteView>,
    content: ContentReader<'a>,
}

enum ZipBacking {
    File(File),
    Buf(ByteView),
}

impl Read for ZipBacking {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ZipBacking::File(f) => f.read(buf),
            ZipBacking::Buf(v) => v.read(buf),
        }
    }
}

impl Seek for ZipBacking {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ZipBacking::File(f) => f.seek(pos),
            ZipBacking::Buf(v) => v.seek(pos),
        }
    }
}

impl<'a> ZipContainer<'a> {
    pub fn open(mut content: ContentReader<'a>, backing: Backing<'_>) -> Result<Self> {
        let filename = content.filename().to_string();
        let (reader, spill) = match backing {
            Backing::Path(path) => (ZipBacking::File(open_for_seeking(path)?), None),
            Backing::Stream => {
                let mut buf = pool::acquire(content.size());
                content
                    .read_to_end(&mut buf)
                    .with_context(|| format!("buffering zip stream {filename}"))?;
                let view = ByteView::new(buf);
                (ZipBacking::Buf(view.share()), Some(view))
            }
        };
        let archive = zip::ZipArchive::new(reader)
            .with_context(|| format!("opening zip {filename}"))?;
        Ok(Self {
            filename,
            archive,
            spill,
            content,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Hash of the raw zip bytes. For a spilled zip the tee already saw the
    /// whole stream; for a file-backed zip the teed handle is drained now.
    pub fn hash(&mut self) -> Result<String> {
        Ok(self.content.hash()?)
    }

    pub fn for_each_entry(
        &mut self,
        include: &dyn Fn(&str) -> bool,
        visit: &mut dyn FnMut(ContentFile<'_>) -> Result<()>,
    ) -> Result<()> {
        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(index)
                .with_context(|| format!("reading zip entry {index} of {}", self.filename))?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if !include(&name) {
                continue;
            }
            let size = entry.size() as i64;
            let file = ContentFile::new(name, false, size, Box::new(entry))?;
            visit(file)?;
        }
        Ok(())
    }
}

fn open_for_seeking(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("reopening {} for random access", path.display()))
}
