use anyhow::{bail, Context, Result};

use super::ContentFile;
use crate::content::ContentReader;

/// An opened tar. Strictly forward-only: entries come out one at a time and
/// a prior entry cannot be revisited.
pub struct TarContainer<'a> {
    filename: String,
    state: TarState<'a>,
}

enum TarState<'a> {
    /// Entries not yet consumed.
    Ready(tar::Archive<ContentReader<'a>>),
    /// Entries consumed (or skipped by an early hash); the underlying reader
    /// is kept so the hash can still be completed from the tee.
    Drained(ContentReader<'a>),
    Spent,
}

impl<'a> TarContainer<'a> {
    pub fn new(content: ContentReader<'a>) -> Self {
        let filename = content.filename().to_string();
        Self {
            filename,
            state: TarState::Ready(tar::Archive::new(content)),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Hash of the raw stream. Tar shares one stream between iteration and
    /// hashing, so hashing before the entries were visited drains the stream
    /// and leaves nothing to iterate.
    pub fn hash(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.state, TarState::Spent) {
            TarState::Ready(archive) => {
                let mut content = archive.into_inner();
                let hash = content.hash()?;
                self.state = TarState::Drained(content);
                Ok(hash)
            }
            TarState::Drained(mut content) => {
                let hash = content.hash()?;
                self.state = TarState::Drained(content);
                Ok(hash)
            }
            TarState::Spent => bail!("tar stream {} already consumed", self.filename),
        }
    }

    pub fn for_each_entry(
        &mut self,
        include: &dyn Fn(&str) -> bool,
        visit: &mut dyn FnMut(ContentFile<'_>) -> Result<()>,
    ) -> Result<()> {
        let mut archive = match std::mem::replace(&mut self.state, TarState::Spent) {
            TarState::Ready(archive) => archive,
            // hash() already drained the stream; nothing left to yield.
            TarState::Drained(content) => {
                self.state = TarState::Drained(content);
                return Ok(());
            }
            TarState::Spent => return Ok(()),
        };
        let walk = (|| -> Result<()> {
            let entries = archive
                .entries()
                .with_context(|| format!("opening tar {}", self.filename))?;
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("reading tar entry from {}", self.filename))?;
                let header = entry.header();
                if !header.entry_type().is_file() {
                    continue;
                }
                let size = header.size().unwrap_or(0);
                if size == 0 {
                    continue;
                }
                let name = match entry.path() {
                    Ok(path) => path.to_string_lossy().into_owned(),
                    Err(_) => continue,
                };
                if !include(&name) {
                    continue;
                }
                let file = ContentFile::new(name, false, size as i64, Box::new(entry))?;
                visit(file)?;
            }
            Ok(())
        })();
        self.state = TarState::Drained(archive.into_inner());
        walk
    }
}
