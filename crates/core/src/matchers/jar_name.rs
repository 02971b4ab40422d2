use anyhow::{ensure, Context, Result};
use semver::Version;

/// Matches jar basenames of the form `<prefix><version>.<ext>` against an
/// ordered list of patterns parsed from `name[/min[/max]]` strings.
///
/// The prefix gets an implicit trailing `-` so `log4j-core` and `log4j-core-`
/// are the same pattern. A pattern with neither bound is rejected up front:
/// a bare name can never match, which is a configuration mistake.
#[derive(Debug)]
pub struct JarNameMatcher {
    patterns: Vec<JarNamePattern>,
}

#[derive(Debug)]
struct JarNamePattern {
    prefix: String,
    min: Option<Version>,
    max: Option<Version>,
}

impl JarNameMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut parsed = Vec::with_capacity(patterns.len());
        for raw in patterns {
            parsed.push(JarNamePattern::parse(raw)?);
        }
        Ok(Self { patterns: parsed })
    }

    /// Whether `basename` names a version inside any pattern's range.
    ///
    /// A basename that matches a prefix but carries an unparsable version is
    /// an error; callers record it as a per-entry failure and move on.
    pub fn is_match(&self, basename: &str) -> Result<bool> {
        for pattern in &self.patterns {
            if pattern.is_match(basename)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl JarNamePattern {
    fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, '/');
        let name = parts.next().unwrap_or_default();
        ensure!(!name.is_empty(), "empty jar name in pattern {raw:?}");
        let mut prefix = name.to_string();
        if !prefix.ends_with('-') {
            prefix.push('-');
        }
        let min = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(parse_version)
            .transpose()
            .with_context(|| format!("invalid minimum version in {raw:?}"))?;
        let max = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(parse_version)
            .transpose()
            .with_context(|| format!("invalid maximum version in {raw:?}"))?;
        ensure!(
            min.is_some() || max.is_some(),
            "jar pattern {raw:?} has no version bounds and can never match"
        );
        Ok(Self { prefix, min, max })
    }

    fn is_match(&self, basename: &str) -> Result<bool> {
        if !basename.starts_with(&self.prefix) {
            return Ok(false);
        }
        let core = match basename.rfind('.') {
            Some(pos) => &basename[..pos],
            None => basename,
        };
        let Some(raw) = core.get(self.prefix.len()..) else {
            return Ok(false);
        };
        let version = parse_version(raw)
            .with_context(|| format!("invalid version {raw:?} in jar name {basename:?}"))?;
        let above_min = self.min.as_ref().map_or(true, |min| version >= *min);
        let below_max = self.max.as_ref().map_or(true, |max| version <= *max);
        Ok(above_min && below_max)
    }
}

/// Parse a version leniently: real-world jar versions drop components
/// (`2.0-beta9`, `2`) that strict semver rejects, so the core is padded to
/// `MAJOR.MINOR.PATCH` before parsing.
pub fn parse_version(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    if let Ok(version) = Version::parse(raw) {
        return Ok(version);
    }
    Version::parse(&normalize(raw)).with_context(|| format!("unparsable version {raw:?}"))
}

fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let (core, rest) = match raw.find(['-', '+']) {
        Some(pos) => raw.split_at(pos),
        None => (raw, ""),
    };
    let mut padded = core.to_string();
    for _ in core.matches('.').count()..2 {
        padded.push_str(".0");
    }
    format!("{padded}{rest}")
}
