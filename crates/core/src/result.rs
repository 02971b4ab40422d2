use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Evidence kinds. The first four are leaf signals; `Content` is synthetic
/// and means "some descendant matched by direct evidence".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchType {
    JarName,
    JarHash,
    ClassName,
    ClassHash,
    Content,
}

impl MatchType {
    pub const ALL: [MatchType; 5] = [
        MatchType::ClassName,
        MatchType::ClassHash,
        MatchType::JarName,
        MatchType::JarHash,
        MatchType::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::JarName => "JAR_NAME",
            MatchType::JarHash => "JAR_HASH",
            MatchType::ClassName => "CLASS_NAME",
            MatchType::ClassHash => "CLASS_HASH",
            MatchType::Content => "CONTENT",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported hit: a FileId and its evidence, labels sorted for stable
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFileMatch {
    pub file_id: String,
    pub match_types: Vec<MatchType>,
}

impl fmt::Display for ScanFileMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.match_types.iter().map(MatchType::as_str).collect();
        write!(f, "({}) {}", labels.join(" "), self.file_id)
    }
}

/// A recorded per-entry failure: the FileId and its deduplicated messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub file_id: String,
    pub messages: Vec<String>,
}

/// Aggregated outcome of a scan (or of one subtree, before merging).
///
/// Keyed by FileId; BTree maps keep reporting deterministic without a sort
/// pass at the end.
#[derive(Debug, Default)]
pub struct ScanResult {
    matches: BTreeMap<String, BTreeSet<MatchType>>,
    failures: BTreeMap<String, BTreeSet<String>>,
    total_files_scanned: usize,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_match(&mut self, file_id: &str, types: &[MatchType]) {
        if types.is_empty() {
            return;
        }
        self.matches
            .entry(file_id.to_string())
            .or_default()
            .extend(types.iter().copied());
    }

    pub fn add_failure(&mut self, file_id: &str, message: impl Into<String>) {
        self.failures
            .entry(file_id.to_string())
            .or_default()
            .insert(message.into());
    }

    pub fn increment_total(&mut self) {
        self.total_files_scanned += 1;
    }

    /// Whether a match has already been recorded for this FileId.
    pub fn has_seen(&self, file_id: &str) -> bool {
        self.matches.contains_key(file_id)
    }

    /// Fold `other` into `self`. Returns true when the child had any
    /// matches, which is what decides `Content` propagation at the caller.
    pub fn merge(&mut self, other: ScanResult) -> bool {
        let had_matches = !other.matches.is_empty();
        self.total_files_scanned += other.total_files_scanned;
        for (file_id, types) in other.matches {
            self.matches.entry(file_id).or_default().extend(types);
        }
        for (file_id, messages) in other.failures {
            self.failures.entry(file_id).or_default().extend(messages);
        }
        had_matches
    }

    /// Reported hits, sorted by FileId. FileIds whose evidence is exactly
    /// `{Content}` are suppressed: propagation alone is not a finding.
    pub fn matches(&self) -> Vec<ScanFileMatch> {
        self.matches
            .iter()
            .filter(|(_, types)| {
                !(types.len() == 1 && types.contains(&MatchType::Content))
            })
            .map(|(file_id, types)| {
                let mut match_types: Vec<MatchType> = types.iter().copied().collect();
                match_types.sort_by_key(|t| t.as_str());
                ScanFileMatch {
                    file_id: file_id.clone(),
                    match_types,
                }
            })
            .collect()
    }

    /// Recorded failures, sorted by FileId, messages deduplicated.
    pub fn failures(&self) -> Vec<ScanFailure> {
        self.failures
            .iter()
            .map(|(file_id, messages)| ScanFailure {
                file_id: file_id.clone(),
                messages: messages.iter().cloned().collect(),
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn total_files_scanned(&self) -> usize {
        self.total_files_scanned
    }

    /// Every FileId with recorded evidence, content-only ones included.
    pub fn total_files_matched(&self) -> usize {
        self.matches.len()
    }

    /// How many FileIds carry the given evidence kind, content-only ones
    /// included.
    pub fn match_count_by_type(&self, match_type: MatchType) -> usize {
        self.matches
            .values()
            .filter(|types| types.contains(&match_type))
            .count()
    }
}
