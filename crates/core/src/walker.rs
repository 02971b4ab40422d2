use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;
use walkdir::WalkDir;

use crate::matchers::GlobMatcher;

/// Running position of a walk, handed to the visit callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub files_seen: usize,
    pub current_root: usize,
    pub total_roots: usize,
}

/// Ordered, symlink-aware directory traversal.
///
/// Entries come out lexicographically within each directory. Files are
/// deduplicated by resolved (canonical) path, and the set is shared across
/// roots so overlapping roots visit each file once. Walk errors — permission
/// denied, dangling symlinks, symlink loops — are skipped silently.
pub struct Walker<'m> {
    globs: &'m GlobMatcher,
    seen: HashSet<PathBuf>,
    progress: Progress,
}

impl<'m> Walker<'m> {
    pub fn new(globs: &'m GlobMatcher, total_roots: usize) -> Self {
        Self {
            globs,
            seen: HashSet::new(),
            progress: Progress {
                total_roots,
                ..Progress::default()
            },
        }
    }

    /// Walk one root, invoking `visit` with `(file_id, resolved_path,
    /// progress)` for every included file.
    ///
    /// The file_id is the path relative to the root; symlinked files get the
    /// relative target appended in parentheses. An unreadable root is the
    /// only error this returns — everything below it degrades to skips.
    pub fn walk_root(
        &mut self,
        root: &str,
        visit: &mut dyn FnMut(&str, &Path, &Progress),
    ) -> Result<()> {
        self.progress.current_root += 1;
        let root_path =
            fs::canonicalize(root).with_context(|| format!("resolving root {root}"))?;

        let mut entries = WalkDir::new(&root_path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();
        loop {
            let entry = match entries.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    trace!("skipping walk error under {root}: {err}");
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                if self.globs.prunes_dir(path) {
                    trace!("pruning excluded directory {}", path.display());
                    entries.skip_current_dir();
                    continue;
                }
                let resolved = match fs::canonicalize(path) {
                    Ok(resolved) => resolved,
                    Err(_) => {
                        entries.skip_current_dir();
                        continue;
                    }
                };
                if !self.seen.insert(resolved) {
                    // Already walked through another root or symlink.
                    entries.skip_current_dir();
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.globs.is_included(path) {
                continue;
            }
            let resolved = match fs::canonicalize(path) {
                Ok(resolved) => resolved,
                Err(err) => {
                    trace!("skipping unresolvable {}: {err}", path.display());
                    continue;
                }
            };
            if !self.seen.insert(resolved.clone()) {
                continue;
            }

            let rel = path.strip_prefix(&root_path).unwrap_or(path);
            let mut file_id = if rel.as_os_str().is_empty() {
                // The root itself is a file.
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            } else {
                rel.display().to_string()
            };
            if entry.path_is_symlink() {
                if let Some(target) = pathdiff::diff_paths(&resolved, path) {
                    file_id = format!("{file_id} ({})", target.display());
                }
            }

            self.progress.files_seen += 1;
            visit(&file_id, &resolved, &self.progress);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(contents).unwrap();
    }

    fn collect_ids(walker: &mut Walker<'_>, root: &Path) -> Vec<String> {
        let mut ids = Vec::new();
        walker
            .walk_root(root.to_str().unwrap(), &mut |file_id, _, _| {
                ids.push(file_id.to_string());
            })
            .unwrap();
        ids
    }

    #[test]
    fn entries_come_out_in_lexicographic_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("b.txt"), b"b");
        write_file(&dir.path().join("a.txt"), b"a");
        write_file(&dir.path().join("sub/c.txt"), b"c");

        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 1);
        assert_eq!(collect_ids(&mut walker, dir.path()), ["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[test]
    fn excluded_directories_are_never_entered() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("keep.txt"), b"k");
        write_file(&dir.path().join("node_modules/pkg/index.js"), b"x");

        let globs = GlobMatcher::new(
            &["**/**".to_string()],
            &["**/node_modules/**".to_string()],
        )
        .unwrap();
        let mut walker = Walker::new(&globs, 1);
        assert_eq!(collect_ids(&mut walker, dir.path()), ["keep.txt"]);
    }

    #[test]
    fn overlapping_roots_visit_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("only.txt"), b"1");

        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 2);
        assert_eq!(collect_ids(&mut walker, dir.path()), ["only.txt"]);
        assert_eq!(collect_ids(&mut walker, dir.path()), Vec::<String>::new());
    }

    #[test]
    fn missing_root_is_an_error() {
        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 1);
        let outcome = walker.walk_root("/definitely/not/here", &mut |_, _, _| {});
        assert!(outcome.is_err());
    }

    #[test]
    fn root_may_be_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("solo.jar");
        write_file(&file, b"data");

        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 1);
        assert_eq!(collect_ids(&mut walker, &file), ["solo.jar"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_annotated_and_target_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("sub/real.txt"), b"real");
        std::os::unix::fs::symlink(dir.path().join("sub/real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 1);
        let ids = collect_ids(&mut walker, dir.path());
        // link.txt sorts first, claims the file; the real path is then a
        // repeat of the same resolved file and is skipped.
        assert_eq!(ids, ["link.txt (../sub/real.txt)"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("ok.txt"), b"ok");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let globs = GlobMatcher::new(&["**/**".to_string()], &[]).unwrap();
        let mut walker = Walker::new(&globs, 1);
        let ids = collect_ids(&mut walker, dir.path());
        assert_eq!(ids, ["ok.txt"]);
    }
}
