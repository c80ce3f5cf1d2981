//! Coverage report aggregation.
//!
//! The runner's coverage JSON summarizes which packages have tests and
//! how the run went. File and function coverage are derived from the
//! source tree: a source file counts as tested when a sibling
//! `<stem>_test.vx` exists.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

use crate::runner::{SKIP_DIRS, TestSummary};

/// The top-level coverage report.
#[derive(Debug, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Report creation time, RFC 3339.
    pub timestamp: String,
    /// Aggregate file/function coverage.
    pub overall_coverage: OverallCoverage,
    /// Per-package breakdown.
    pub packages: Vec<PackageCoverage>,
    /// Test-run tallies.
    pub summary: RunSummary,
}

/// Aggregate coverage figures.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverallCoverage {
    /// Percentage of source files with a sibling test file.
    pub file_coverage: f64,
    /// Percentage of functions living in tested files.
    pub function_coverage: f64,
    /// Source files with tests.
    pub tested_files: u32,
    /// All source files.
    pub total_files: u32,
    /// Functions in tested files.
    pub tested_functions: u32,
    /// All functions.
    pub total_functions: u32,
}

/// Coverage for one package (directory).
#[derive(Debug, Serialize, Deserialize)]
pub struct PackageCoverage {
    /// Package path relative to the scanned root.
    pub package: String,
    /// Percentage of the package's source files with tests.
    pub coverage: f64,
    /// Source file names.
    pub source_files: Vec<String>,
    /// Test file names.
    pub test_files: Vec<String>,
    /// Number of source files.
    pub file_count: u32,
    /// Number of test files.
    pub test_count: u32,
}

/// Tallies from the test run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// All discovered tests.
    pub total: u32,
    /// Passing tests.
    pub passed: u32,
    /// Failing tests (any failure classification).
    pub failed: u32,
    /// Skipped tests.
    pub skipped: u32,
    /// Total wall-clock seconds.
    pub duration_seconds: f64,
}

impl CoverageReport {
    /// Builds a report by scanning the source tree and folding in the
    /// run's tallies.
    #[must_use]
    pub fn scan(root: &Path, summary: &TestSummary) -> Self {
        let mut packages: BTreeMap<String, (Vec<String>, Vec<String>)> = BTreeMap::new();

        let walker = WalkBuilder::new(root)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(|entry| {
                let name = entry.file_name().to_str().unwrap_or("");
                !SKIP_DIRS.contains(&name)
            })
            .build();

        for entry in walker.flatten() {
            let path = entry.into_path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".vx") {
                continue;
            }
            let package = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.display().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string());

            let slot = packages.entry(package).or_default();
            if name.ends_with("_test.vx") {
                slot.1.push(name.to_string());
            } else {
                slot.0.push(name.to_string());
            }
        }

        let mut package_reports = Vec::new();
        let mut total_files = 0u32;
        let mut tested_files = 0u32;
        let mut total_functions = 0u32;
        let mut tested_functions = 0u32;

        for (package, (mut sources, mut tests)) in packages {
            sources.sort();
            tests.sort();

            let mut pkg_tested = 0u32;
            for source in &sources {
                let stem = source.trim_end_matches(".vx");
                let has_test = tests.iter().any(|t| t == &format!("{stem}_test.vx"));
                let functions = count_functions(root, &package, source);
                total_functions += functions;
                if has_test {
                    pkg_tested += 1;
                    tested_functions += functions;
                }
            }

            let file_count = u32::try_from(sources.len()).unwrap_or(u32::MAX);
            let test_count = u32::try_from(tests.len()).unwrap_or(u32::MAX);
            total_files += file_count;
            tested_files += pkg_tested;

            package_reports.push(PackageCoverage {
                coverage: percentage(pkg_tested, file_count),
                package,
                source_files: sources,
                test_files: tests,
                file_count,
                test_count,
            });
        }

        Self {
            timestamp: rfc3339_now(),
            overall_coverage: OverallCoverage {
                file_coverage: percentage(tested_files, total_files),
                function_coverage: percentage(tested_functions, total_functions),
                tested_files,
                total_files,
                tested_functions,
                total_functions,
            },
            packages: package_reports,
            summary: RunSummary {
                total: u32::try_from(summary.outcomes.len()).unwrap_or(u32::MAX),
                passed: u32::try_from(summary.passed()).unwrap_or(u32::MAX),
                failed: u32::try_from(summary.failed()).unwrap_or(u32::MAX),
                skipped: u32::try_from(summary.skipped()).unwrap_or(u32::MAX),
                duration_seconds: summary.duration.as_secs_f64(),
            },
        }
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Counts `defn` forms in a source file (0 if unreadable).
fn count_functions(root: &Path, package: &str, file: &str) -> u32 {
    let path = if package == "." {
        root.join(file)
    } else {
        root.join(package).join(file)
    };
    let Ok(text) = std::fs::read_to_string(path) else {
        return 0;
    };
    u32::try_from(text.matches("(defn ").count()).unwrap_or(u32::MAX)
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// The current time as an RFC 3339 UTC timestamp.
#[must_use]
pub fn rfc3339_now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    rfc3339_from_unix(secs)
}

/// Converts unix seconds to an RFC 3339 UTC timestamp.
#[must_use]
pub fn rfc3339_from_unix(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (hour, minute, second) = (rem / 3600, (rem % 3600) / 60, rem % 60);

    // Civil-from-days conversion (proleptic Gregorian calendar)
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}
