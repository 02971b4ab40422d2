use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use crate::container::{self, Backing, Container, ContentFile};
use crate::content::ContentReader;
use crate::matchers::{ClassNameMatcher, GlobMatcher, HashIndex, JarNameMatcher};
use crate::result::{MatchType, ScanResult};
use crate::walker::Walker;

/// Produces `ClassName` / `ClassHash` evidence for a `.class` entry.
pub struct ClassScanner {
    names: ClassNameMatcher,
    hashes: HashIndex,
}

impl ClassScanner {
    pub fn new(names: ClassNameMatcher, hashes: HashIndex) -> Self {
        Self { names, hashes }
    }

    /// The hash comes from the entry's own tee, so the bytes are read once.
    fn scan(&self, name: &str, content: &mut ContentReader<'_>) -> Result<Vec<MatchType>> {
        let mut types = Vec::new();
        if self.names.is_match(basename(name)) {
            types.push(MatchType::ClassName);
        }
        let hash = content
            .hash()
            .with_context(|| format!("hashing class {name}"))?;
        if self.hashes.contains(&hash) {
            types.push(MatchType::ClassHash);
        }
        Ok(types)
    }
}

/// Produces `JarName` / `JarHash` evidence for a container whose filename
/// ends in `.jar`. Anything else gets neither signal.
pub struct JarScanner {
    names: JarNameMatcher,
    hashes: HashIndex,
}

impl JarScanner {
    pub fn new(names: JarNameMatcher, hashes: HashIndex) -> Self {
        Self { names, hashes }
    }

    fn scan(&self, container: &mut Container<'_>) -> Result<Vec<MatchType>> {
        if !container.filename().ends_with(".jar") {
            return Ok(Vec::new());
        }
        let mut types = Vec::new();
        if self
            .names
            .is_match(basename(container.filename()))
            .context("matching jar name")?
        {
            types.push(MatchType::JarName);
        }
        let hash = container.hash().context("hashing jar")?;
        if self.hashes.contains(&hash) {
            types.push(MatchType::JarHash);
        }
        Ok(types)
    }
}

/// The recursion engine: walks roots, descends through nested archives, and
/// aggregates evidence and failures into one [`ScanResult`].
pub struct Scanner {
    class_scanner: ClassScanner,
    jar_scanner: JarScanner,
    globs: GlobMatcher,
}

impl Scanner {
    pub fn new(class_scanner: ClassScanner, jar_scanner: JarScanner, globs: GlobMatcher) -> Self {
        Self {
            class_scanner,
            jar_scanner,
            globs,
        }
    }

    /// Scan every root. The result always holds whatever progress was made;
    /// the error slot carries the first root that could not be opened at
    /// all (per-entry problems are failure records instead).
    pub fn scan(&self, roots: &[String]) -> (ScanResult, Option<anyhow::Error>) {
        let mut result = ScanResult::new();
        let mut first_error = None;
        let mut walker = Walker::new(&self.globs, roots.len());
        for root in roots {
            let walked = walker.walk_root(root, &mut |file_id, path, progress| {
                if result.has_seen(file_id) {
                    return;
                }
                let mut child = ScanResult::new();
                if let Err(err) = self.scan_path(file_id, path, &mut child) {
                    child.add_failure(file_id, format!("{err:#}"));
                }
                result.merge(child);
                trace!(
                    files = progress.files_seen,
                    root = progress.current_root,
                    "walked {file_id}"
                );
            });
            if let Err(err) = walked {
                result.add_failure(root, format!("{err:#}"));
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        (result, first_error)
    }

    /// Scan one filesystem file.
    fn scan_path(&self, file_id: &str, path: &Path, result: &mut ScanResult) -> Result<()> {
        result.increment_total();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let size = file.metadata().map(|meta| meta.len() as i64).unwrap_or(-1);
        let mut content =
            ContentReader::new(filename.clone(), size, Box::new(BufReader::new(file)))?;

        if filename.ends_with(".class") {
            let types = self.class_scanner.scan(&filename, &mut content)?;
            if !types.is_empty() {
                result.add_match(file_id, &types);
                info!("+++ {file_id}");
            }
            return Ok(());
        }
        match container::open(content, Backing::Path(path))? {
            None => {
                trace!("### {file_id}");
                Ok(())
            }
            Some(mut container) => {
                self.scan_container(file_id, &mut container, result);
                Ok(())
            }
        }
    }

    /// Scan one entry of an open container. `Err` means this entry failed;
    /// the caller records it and moves to the next sibling.
    fn scan_entry(&self, file_id: &str, mut file: ContentFile<'_>, result: &mut ScanResult) -> Result<()> {
        if file.is_dir() {
            return Ok(());
        }
        result.increment_total();
        if file.name().ends_with(".class") {
            let name = file.name().to_string();
            let types = self.class_scanner.scan(&name, file.content_mut())?;
            if !types.is_empty() {
                result.add_match(file_id, &types);
                info!("+++ {file_id}");
            }
            return Ok(());
        }
        match container::open(file.into_content(), Backing::Stream)? {
            None => {
                trace!("### {file_id}");
                Ok(())
            }
            Some(mut container) => {
                self.scan_container(file_id, &mut container, result);
                Ok(())
            }
        }
    }

    /// The per-container step: collect the container's own jar evidence,
    /// then recurse into its entries, propagating `Content` upward whenever
    /// a subtree produced matches. All failures are recorded in `result`;
    /// iteration errors keep whatever matches were found before them.
    fn scan_container(&self, file_id: &str, container: &mut Container<'_>, result: &mut ScanResult) {
        match self.jar_scanner.scan(container) {
            Ok(types) => result.add_match(file_id, &types),
            Err(err) => result.add_failure(file_id, format!("{err:#}")),
        }

        let mut content_match = false;
        let include = |name: &str| {
            let included = self.globs.is_included(name);
            if !included {
                trace!("### {file_id} @ {name}");
            }
            included
        };
        let walked = container.for_each_entry(&include, &mut |file| {
            let child_id = format!("{file_id} @ {}", file.name());
            let mut child = ScanResult::new();
            if let Err(err) = self.scan_entry(&child_id, file, &mut child) {
                child.add_failure(&child_id, format!("{err:#}"));
            }
            if result.merge(child) {
                content_match = true;
                result.add_match(file_id, &[MatchType::Content]);
            }
            Ok(())
        });
        if let Err(err) = walked {
            result.add_failure(file_id, format!("{err:#}"));
        }

        if content_match {
            info!("+++ {file_id}");
        } else {
            debug!("--- {file_id}");
        }
    }
}

fn basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    #[test]
    fn basename_strips_archive_directories() {
        assert_eq!(basename("lib/log4j-core-2.14.1.jar"), "log4j-core-2.14.1.jar");
        assert_eq!(
            basename("org/apache/logging/log4j/core/lookup/JndiLookup.class"),
            "JndiLookup.class"
        );
        assert_eq!(basename("plain.jar"), "plain.jar");
    }

    // ── ClassScanner ──────────────────────────────────────────────────────

    const CLASS_BYTES: &[u8] = b"\xca\xfe\xba\xbe\x00\x00\x004fake bytecode";

    fn class_scanner(hashes: &str) -> ClassScanner {
        ClassScanner::new(
            ClassNameMatcher::new(&["JndiLookup".to_string()]).unwrap(),
            HashIndex::parse(hashes),
        )
    }

    fn content_over(name: &str, data: &'static [u8]) -> ContentReader<'static> {
        ContentReader::new(name, data.len() as i64, Box::new(data)).unwrap()
    }

    #[test]
    fn class_name_and_hash_evidence_co_occur() {
        let hash = hex::encode(Sha256::digest(CLASS_BYTES));
        let scanner = class_scanner(&hash);
        let mut content = content_over("a/b/JndiLookup.class", CLASS_BYTES);
        let types = scanner.scan("a/b/JndiLookup.class", &mut content).unwrap();
        assert_eq!(types, [MatchType::ClassName, MatchType::ClassHash]);
    }

    #[test]
    fn class_name_match_alone() {
        let scanner = class_scanner("");
        let mut content = content_over("JndiLookup.class", CLASS_BYTES);
        let types = scanner.scan("JndiLookup.class", &mut content).unwrap();
        assert_eq!(types, [MatchType::ClassName]);
    }

    #[test]
    fn class_hash_match_alone() {
        let hash = hex::encode(Sha256::digest(CLASS_BYTES));
        let scanner = class_scanner(&hash);
        let mut content = content_over("Renamed.class", CLASS_BYTES);
        let types = scanner.scan("Renamed.class", &mut content).unwrap();
        assert_eq!(types, [MatchType::ClassHash]);
    }

    #[test]
    fn unrelated_class_produces_no_evidence() {
        let scanner = class_scanner("");
        let mut content = content_over("Logger.class", CLASS_BYTES);
        let types = scanner.scan("Logger.class", &mut content).unwrap();
        assert!(types.is_empty());
    }
}
