mod report;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jarsweep_core::{
    defaults, ClassNameMatcher, ClassScanner, GlobMatcher, HashIndex, JarNameMatcher, JarScanner,
    Scanner,
};

#[derive(Parser)]
#[command(
    name = "jarsweep",
    version,
    about = "Recursively scans a filesystem for Java archives affected by a known vulnerability",
    long_about = "jarsweep recursively scans a filesystem for jars and classes whose name, \
version or SHA-256 indicates they can be exploited, descending into nested \
jar, zip, tar and gzip archives along the way."
)]
struct Args {
    /// Root directory to scan (repeatable; default: current directory)
    #[arg(short, long)]
    root: Vec<String>,

    /// Jar name and semver range to match, as name[/min[/max]]
    /// (default: log4j-core-/2.0-beta9/2.16.0)
    #[arg(long)]
    jars: Vec<String>,

    /// File of SHA-256 hashes of jars to match (default: embedded index)
    #[arg(long)]
    jar_hashes: Option<PathBuf>,

    /// Class names to match (repeatable; default: JndiLookup)
    #[arg(long)]
    classes: Vec<String>,

    /// File of SHA-256 hashes of classes to match (default: embedded index)
    #[arg(long)]
    class_hashes: Option<PathBuf>,

    /// Globs selecting paths to include in the scan (default: **/**)
    #[arg(long)]
    include_globs: Vec<String>,

    /// Globs selecting paths to exclude from the scan
    /// (default: **/.git/**, **/.runtime/**, **/node_modules/**)
    #[arg(long)]
    exclude_globs: Vec<String>,

    /// Verbose logging (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("warn,jarsweep={level},jarsweep_core={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("jarsweep: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<u8> {
    let scanner = build_scanner(&args)?;

    let roots = if args.root.is_empty() {
        let cwd = std::env::current_dir().context("resolving current directory")?;
        vec![cwd.display().to_string()]
    } else {
        args.root.clone()
    };

    for root in &roots {
        tracing::info!("scanning {root}");
    }
    let (result, fatal) = scanner.scan(&roots);

    let stdout = io::stdout();
    report::render(&mut stdout.lock(), &result).context("writing report")?;

    if let Some(err) = fatal {
        eprintln!("jarsweep: {err:#}");
        return Ok(1);
    }
    Ok(report::exit_code(&result) as u8)
}

/// Assemble the matchers from flags and defaults. Any error here is a
/// configuration error and exits 1 before the scan starts.
fn build_scanner(args: &Args) -> Result<Scanner> {
    let classes = defaulted(&args.classes, defaults::CLASS_PATTERNS);
    let class_scanner = ClassScanner::new(
        ClassNameMatcher::new(&classes)?,
        HashIndex::from_file(args.class_hashes.as_deref(), defaults::CLASS_HASHES)
            .context("loading class hashes")?,
    );

    let jars = defaulted(&args.jars, defaults::JAR_PATTERNS);
    let jar_scanner = JarScanner::new(
        JarNameMatcher::new(&jars).context("loading jar patterns")?,
        HashIndex::from_file(args.jar_hashes.as_deref(), defaults::JAR_HASHES)
            .context("loading jar hashes")?,
    );

    let include = defaulted(&args.include_globs, defaults::INCLUDE_GLOBS);
    let exclude = defaulted(&args.exclude_globs, defaults::EXCLUDE_GLOBS);
    let globs = GlobMatcher::new(&include, &exclude)?;

    Ok(Scanner::new(class_scanner, jar_scanner, globs))
}

fn defaulted(given: &[String], fallback: &[&str]) -> Vec<String> {
    if given.is_empty() {
        fallback.iter().map(|s| s.to_string()).collect()
    } else {
        given.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_when_flags_are_absent() {
        assert_eq!(
            defaulted(&[], defaults::CLASS_PATTERNS),
            vec!["JndiLookup".to_string()]
        );
        let given = vec!["Custom".to_string()];
        assert_eq!(defaulted(&given, defaults::CLASS_PATTERNS), given);
    }

    #[test]
    fn default_configuration_builds() {
        let args = Args::parse_from(["jarsweep"]);
        assert!(build_scanner(&args).is_ok());
    }

    #[test]
    fn jar_pattern_without_bounds_is_rejected() {
        let args = Args::parse_from(["jarsweep", "--jars", "log4j-core-"]);
        assert!(build_scanner(&args).is_err());
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let args = Args::parse_from(["jarsweep", "--include-globs", "a{"]);
        assert!(build_scanner(&args).is_err());
    }
}
