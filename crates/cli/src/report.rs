use std::io::{self, Write};

use jarsweep_core::{MatchType, ScanResult};

/// Render the final report: totals, per-signal counts, the sorted list of
/// affected files, and any scan failures.
pub fn render(out: &mut impl Write, result: &ScanResult) -> io::Result<()> {
    writeln!(out, "Total Files Scanned: {}", result.total_files_scanned())?;
    writeln!(out, "Total Matched Files: {}", result.total_files_matched())?;
    writeln!(out, "    Class Name Matches: {}", result.match_count_by_type(MatchType::ClassName))?;
    writeln!(out, "    Class Hash Matches: {}", result.match_count_by_type(MatchType::ClassHash))?;
    writeln!(out, "    Jar Name Matches: {}", result.match_count_by_type(MatchType::JarName))?;
    writeln!(out, "    Jar Hash Matches: {}", result.match_count_by_type(MatchType::JarHash))?;
    writeln!(out, "    Content Matches: {}", result.match_count_by_type(MatchType::Content))?;

    writeln!(out, "Affected Files:")?;
    let matches = result.matches();
    if matches.is_empty() {
        writeln!(out, "    NONE")?;
    } else {
        for m in &matches {
            writeln!(out, "    {m}")?;
        }
    }

    let failures = result.failures();
    if !failures.is_empty() {
        writeln!(out, "Scan Failures:")?;
        for failure in &failures {
            for message in &failure.messages {
                writeln!(out, "    {}: {}", failure.file_id, message)?;
            }
        }
    }
    Ok(())
}

/// Exit code contract: 0 clean, 2 matches, 4 failures, 6 both. Code 1
/// (configuration or startup error) is decided by the caller.
pub fn exit_code(result: &ScanResult) -> i32 {
    let mut code = 0;
    if !result.matches().is_empty() {
        code |= 2;
    }
    if result.has_failures() {
        code |= 4;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(result: &ScanResult) -> String {
        let mut out = Vec::new();
        render(&mut out, result).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn clean_scan_exits_zero_and_prints_none() {
        let mut result = ScanResult::new();
        result.increment_total();
        assert_eq!(exit_code(&result), 0);
        let text = render_to_string(&result);
        assert!(text.contains("Total Files Scanned: 1"));
        assert!(text.contains("    NONE"));
    }

    #[test]
    fn matches_exit_two() {
        let mut result = ScanResult::new();
        result.add_match("a.jar", &[MatchType::JarName]);
        assert_eq!(exit_code(&result), 2);
        let text = render_to_string(&result);
        assert!(text.contains("    (JAR_NAME) a.jar"));
        assert!(text.contains("    Jar Name Matches: 1"));
    }

    #[test]
    fn failures_exit_four() {
        let mut result = ScanResult::new();
        result.add_failure("bad.jar", "unable to open zip");
        assert_eq!(exit_code(&result), 4);
        let text = render_to_string(&result);
        assert!(text.contains("Scan Failures:"));
        assert!(text.contains("    bad.jar: unable to open zip"));
    }

    #[test]
    fn matches_and_failures_exit_six() {
        let mut result = ScanResult::new();
        result.add_match("a.jar", &[MatchType::JarHash]);
        result.add_failure("bad.jar", "truncated");
        assert_eq!(exit_code(&result), 6);
    }

    #[test]
    fn content_only_matches_do_not_set_the_match_bit() {
        let mut result = ScanResult::new();
        result.add_match("outer.zip", &[MatchType::Content]);
        // Suppressed from the report, so nothing "affected" was found —
        // but the content counter still shows it.
        assert_eq!(exit_code(&result), 0);
        let text = render_to_string(&result);
        assert!(text.contains("    Content Matches: 1"));
        assert!(text.contains("    NONE"));
    }
}
