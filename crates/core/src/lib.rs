//! Recursive content-inspection engine for finding vulnerable Java
//! archives.
//!
//! Given a set of roots, the scanner walks the filesystem, descends
//! transparently through nested zip/jar, tar and gzip layers, and matches
//! four independent signals on the way: jar filename + version range, jar
//! SHA-256, class filename, and class SHA-256. Evidence is aggregated per
//! archival path (file ids like `app.jar @ lib/log4j-core-2.14.1.jar`),
//! with a synthetic `Content` signal propagated to every ancestor of a hit.

pub mod container;
pub mod content;
pub mod defaults;
pub mod detect;
pub mod matchers;
pub mod pool;
mod result;
pub mod scanner;
pub mod walker;

pub use matchers::{ClassNameMatcher, GlobMatcher, HashIndex, JarNameMatcher};
pub use result::{MatchType, ScanFailure, ScanFileMatch, ScanResult};
pub use scanner::{ClassScanner, JarScanner, Scanner};
