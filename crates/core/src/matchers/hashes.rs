use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// An immutable set of hex SHA-256 strings loaded from an index file.
///
/// One record per line: the hash is the first whitespace-delimited token,
/// the rest of the line is ignored. Lines starting with `#` are comments.
#[derive(Debug)]
pub struct HashIndex {
    hashes: HashSet<String>,
}

impl HashIndex {
    pub fn parse(text: &str) -> Self {
        let mut hashes = HashSet::new();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            if let Some(token) = line.split_whitespace().next() {
                hashes.insert(token.to_ascii_lowercase());
            }
        }
        Self { hashes }
    }

    /// Load from `path` when given, falling back to the embedded defaults.
    pub fn from_file(path: Option<&Path>, defaults: &str) -> Result<Self> {
        match path {
            None => Ok(Self::parse(defaults)),
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading hash index {}", path.display()))?;
                Ok(Self::parse(&text))
            }
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
