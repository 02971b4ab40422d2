use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Include/exclude path filter applied to filesystem paths during the walk
/// and to entry names inside archives.
///
/// A path passes iff no exclude pattern matches and at least one include
/// pattern matches.
#[derive(Debug)]
pub struct GlobMatcher {
    includes: GlobSet,
    excludes: GlobSet,
    /// Directory forms of the exclude patterns, so the walker can prune an
    /// excluded directory instead of descending into it.
    prune: GlobSet,
}

impl GlobMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let includes = build_globset(include, "include")?;
        let excludes = build_globset(exclude, "exclude")?;

        // For patterns like **/node_modules/**, also match **/node_modules so
        // the directory entry itself can be skipped without walking it.
        let mut prune = GlobSetBuilder::new();
        for pattern in exclude {
            if let Some(dir_pattern) = pattern.strip_suffix("/**") {
                prune.add(
                    Glob::new(dir_pattern)
                        .with_context(|| format!("invalid exclude glob: {pattern}"))?,
                );
            }
        }
        let prune = prune.build()?;

        Ok(Self {
            includes,
            excludes,
            prune,
        })
    }

    pub fn is_included(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        !self.excludes.is_match(path) && self.includes.is_match(path)
    }

    /// Whether a directory should be pruned from the walk entirely.
    pub fn prunes_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.excludes.is_match(path) || self.prune.is_match(path)
    }
}

fn build_globset(patterns: &[String], what: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid {what} glob: {pattern}"))?);
    }
    Ok(builder.build()?)
}
