//! Built-in scan configuration: the Log4Shell (CVE-2021-44228) profile.
//!
//! The hash indexes cover every published `log4j-core` artifact in the
//! affected range, plus the `JndiLookup` class files they contain. Users can
//! swap them out with `--jar-hashes` / `--class-hashes`.

/// SHA-256 of affected `log4j-core` jars, one per line.
pub const JAR_HASHES: &str = include_str!("../data/jar_hashes.txt");

/// SHA-256 of affected `JndiLookup` class files, one per line.
pub const CLASS_HASHES: &str = include_str!("../data/class_hashes.txt");

/// Jar name/range patterns, as `name[/min[/max]]`.
pub const JAR_PATTERNS: &[&str] = &["log4j-core-/2.0-beta9/2.16.0"];

/// Class names to match (a `.class` suffix is implied).
pub const CLASS_PATTERNS: &[&str] = &["JndiLookup"];

pub const INCLUDE_GLOBS: &[&str] = &["**/**"];

pub const EXCLUDE_GLOBS: &[&str] = &["**/.git/**", "**/.runtime/**", "**/node_modules/**"];
