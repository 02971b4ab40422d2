use anyhow::{Context, Result};
use globset::Glob;

/// Glob-matches class-file basenames. Patterns get a `.class` suffix
/// appended when missing, so `JndiLookup` and `JndiLookup.class` are the
/// same pattern.
#[derive(Debug)]
pub struct ClassNameMatcher {
    patterns: Vec<globset::GlobMatcher>,
}

impl ClassNameMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let mut glob = pattern.clone();
            if !glob.ends_with(".class") {
                glob.push_str(".class");
            }
            compiled.push(
                Glob::new(&glob)
                    .with_context(|| format!("invalid class pattern: {pattern}"))?
                    .compile_matcher(),
            );
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_match(&self, basename: &str) -> bool {
        self.patterns.iter().any(|m| m.is_match(basename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> ClassNameMatcher {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        ClassNameMatcher::new(&patterns).unwrap()
    }

    #[test]
    fn bare_name_gets_class_suffix() {
        let m = matcher(&["JndiLookup"]);
        assert!(m.is_match("JndiLookup.class"));
        assert!(!m.is_match("JndiLookup.java"));
        assert!(!m.is_match("JndiManager.class"));
    }

    #[test]
    fn explicit_suffix_is_kept() {
        let m = matcher(&["JndiLookup.class"]);
        assert!(m.is_match("JndiLookup.class"));
    }

    #[test]
    fn glob_patterns_work() {
        let m = matcher(&["Jndi*"]);
        assert!(m.is_match("JndiLookup.class"));
        assert!(m.is_match("JndiManager.class"));
        assert!(!m.is_match("Logger.class"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(ClassNameMatcher::new(&["Jndi{".to_string()]).is_err());
    }
}
