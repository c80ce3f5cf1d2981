//! The test runner.
//!
//! Discovers `*_test.vx` files, validates their shape, compiles each one
//! through the full pipeline, builds and executes the resulting binary
//! under a deadline, and aggregates the results. Per-test build
//! sandboxes are temp directories removed on completion regardless of
//! outcome.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use ignore::WalkBuilder;

use vex_foundation::{Diagnostic, DiagnosticCode, Error, Result};
use vex_language::{Ast, parse};
use vex_resolver::collect_imports;

use crate::transpiler::{Transpiled, TranspileError, Transpiler, TranspilerConfig, write_go_project};

/// Directory names never walked during discovery.
pub const SKIP_DIRS: &[&str] = &["node_modules", "bin", "gen", "vendor", "coverage"];

/// Top-level heads allowed in a test file.
const ALLOWED_TEST_HEADS: &[&str] = &["import", "macro", "deftest", "simple-deftest"];

/// Configuration for a test run.
#[derive(Clone, Debug)]
pub struct TestRunnerConfig {
    /// Directory to discover tests under.
    pub dir: PathBuf,
    /// Per-test deadline covering build and execution.
    pub timeout: Duration,
    /// Collect coverage while running.
    pub coverage: bool,
    /// Where to write the coverage JSON report.
    pub coverage_out: Option<PathBuf>,
    /// Stop scheduling new tests after the first failure.
    pub fail_fast: bool,
    /// Only run files whose name contains this substring.
    pub pattern: Option<String>,
    /// Print per-test progress to stderr.
    pub verbose: bool,
}

impl TestRunnerConfig {
    /// Creates a config with a 30 second per-test deadline.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: Duration::from_secs(30),
            coverage: false,
            coverage_out: None,
            fail_fast: false,
            pattern: None,
            verbose: false,
        }
    }
}

/// Classification of one test file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestStatus {
    /// Binary ran and exited zero.
    Pass,
    /// Binary ran and exited non-zero.
    Fail,
    /// Deadline expired; the process was killed.
    Timeout,
    /// The host toolchain failed to build the generated Go.
    BuildError,
    /// The Vex pipeline rejected the file.
    TranspileError,
    /// Not run (pattern filter or fail-fast).
    Skipped,
}

impl TestStatus {
    /// Returns true if this status counts as a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Fail | Self::Timeout | Self::BuildError | Self::TranspileError
        )
    }

    /// Uppercase label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Timeout => "TIMEOUT",
            Self::BuildError => "BUILD_ERROR",
            Self::TranspileError => "TRANSPILE_ERROR",
            Self::Skipped => "SKIP",
        }
    }
}

/// The result of one test file.
#[derive(Clone, Debug)]
pub struct TestOutcome {
    /// The test file.
    pub file: PathBuf,
    /// Classification.
    pub status: TestStatus,
    /// Wall-clock time spent on this file.
    pub duration: Duration,
    /// Failure output or diagnostics, when any.
    pub detail: Option<String>,
}

/// Aggregated results of a run.
#[derive(Debug, Default)]
pub struct TestSummary {
    /// Per-file outcomes in discovery order.
    pub outcomes: Vec<TestOutcome>,
    /// Total wall-clock time.
    pub duration: Duration,
}

impl TestSummary {
    /// Number of passing tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(TestStatus::Pass)
    }

    /// Number of failing tests (any failure classification).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_failure())
            .count()
    }

    /// Number of skipped tests.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, status: TestStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Renders a human-readable report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            out.push_str(&format!(
                "{:>15}  {} ({:.2}s)\n",
                outcome.status.label(),
                outcome.file.display(),
                outcome.duration.as_secs_f64()
            ));
            if let Some(detail) = &outcome.detail {
                if outcome.status.is_failure() {
                    for line in detail.lines() {
                        out.push_str(&format!("                 {line}\n"));
                    }
                }
            }
        }
        out.push_str(&format!(
            "\n{} passed, {} failed, {} skipped in {:.2}s\n",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.duration.as_secs_f64()
        ));
        out
    }
}

/// Drives per-file compilation and execution.
pub struct TestRunner {
    config: TestRunnerConfig,
}

impl TestRunner {
    /// Creates a runner with the given configuration.
    #[must_use]
    pub fn new(config: TestRunnerConfig) -> Self {
        Self { config }
    }

    /// Walks the configured directory for `*_test.vx` files, skipping
    /// hidden directories and the well-known build/output directories.
    #[must_use]
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkBuilder::new(&self.config.dir)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(|entry| {
                let name = entry.file_name().to_str().unwrap_or("");
                !SKIP_DIRS.contains(&name)
            })
            .build()
            .flatten()
            .map(ignore::DirEntry::into_path)
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with("_test.vx"))
            })
            .collect();
        files.sort();
        files
    }

    /// Runs every discovered test, honoring pattern filtering and
    /// fail-fast without corrupting the tally.
    pub fn run(&self) -> TestSummary {
        let started = Instant::now();
        let mut summary = TestSummary::default();
        let mut failed_already = false;

        for file in self.discover() {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            if let Some(pattern) = &self.config.pattern {
                if !name.contains(pattern.as_str()) {
                    summary.outcomes.push(skipped(&file, "filtered by pattern"));
                    continue;
                }
            }
            if self.config.fail_fast && failed_already {
                summary.outcomes.push(skipped(&file, "fail-fast"));
                continue;
            }

            if self.config.verbose {
                eprintln!("\x1b[2mvex test: {}\x1b[0m", file.display());
            }
            let outcome = self.run_one(&file);
            failed_already = failed_already || outcome.status.is_failure();
            summary.outcomes.push(outcome);
        }

        summary.duration = started.elapsed();
        summary
    }

    /// Compiles, builds, and executes one test file.
    fn run_one(&self, file: &Path) -> TestOutcome {
        let started = Instant::now();
        let done = |status, detail: Option<String>| TestOutcome {
            file: file.to_path_buf(),
            status,
            duration: started.elapsed(),
            detail,
        };

        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => return done(TestStatus::TranspileError, Some(e.to_string())),
        };

        let forms = match parse(&source) {
            Ok(forms) => forms,
            Err(e) => return done(TestStatus::TranspileError, Some(e.to_string())),
        };
        if let Some(diagnostic) = validate_test_shape(&forms, &file.display().to_string()) {
            return done(TestStatus::TranspileError, Some(diagnostic.render()));
        }

        let augmented = with_bootstrap_imports(&source, &forms);
        let transpiler = Transpiler::new(TranspilerConfig::new(file));
        let transpiled = match transpiler.transpile_source(&augmented) {
            Ok(transpiled) => transpiled,
            Err(TranspileError::Diagnostics(sink)) => {
                return done(TestStatus::TranspileError, Some(sink.format()));
            }
            Err(TranspileError::Infrastructure(err)) => {
                return done(TestStatus::TranspileError, Some(err.to_string()));
            }
        };

        match self.build_and_execute(file, &transpiled) {
            Ok((status, detail)) => done(status, detail),
            Err(e) => done(TestStatus::BuildError, Some(e.to_string())),
        }
    }

    /// Builds the generated Go in a temp sandbox and runs the binary.
    fn build_and_execute(
        &self,
        file: &Path,
        transpiled: &Transpiled,
    ) -> Result<(TestStatus, Option<String>)> {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("test")
            .replace('_', "-");

        let sandbox = tempfile::TempDir::new()?;
        write_go_project(sandbox.path(), transpiled, &format!("vex-test-{stem}"))?;

        if !transpiled.modules.is_empty() {
            let mut tidy = Command::new("go");
            tidy.arg("mod").arg("tidy").current_dir(sandbox.path());
            let tidied = run_with_deadline(&mut tidy, sandbox.path(), self.config.timeout)?;
            if tidied.timed_out {
                return Ok((TestStatus::Timeout, Some("go mod tidy timed out".into())));
            }
            if !tidied.success {
                return Ok((TestStatus::BuildError, Some(tidied.stderr)));
            }
        }

        let binary = sandbox.path().join("test_bin");
        let mut build = Command::new("go");
        build.arg("build");
        if self.config.coverage {
            build.arg("-cover");
        }
        build
            .arg("-o")
            .arg(&binary)
            .arg(".")
            .current_dir(sandbox.path());

        let built = run_with_deadline(&mut build, sandbox.path(), self.config.timeout)?;
        if built.timed_out {
            return Ok((TestStatus::Timeout, Some("go build timed out".into())));
        }
        if !built.success {
            return Ok((TestStatus::BuildError, Some(built.stderr)));
        }

        let cover_dir = sandbox.path().join("covdata");
        let mut run = Command::new(&binary);
        run.current_dir(sandbox.path());
        if self.config.coverage {
            fs::create_dir_all(&cover_dir)?;
            run.env("GOCOVERDIR", &cover_dir);
        }

        let executed = run_with_deadline(&mut run, sandbox.path(), self.config.timeout)?;
        if executed.timed_out {
            return Ok((TestStatus::Timeout, None));
        }
        if !executed.success {
            let mut detail = executed.stdout;
            detail.push_str(&executed.stderr);
            return Ok((TestStatus::Fail, Some(detail)));
        }

        // Convert the coverage counters to a percentage line
        let detail = if self.config.coverage {
            let mut percent = Command::new("go");
            percent
                .arg("tool")
                .arg("covdata")
                .arg("percent")
                .arg("-i")
                .arg(&cover_dir)
                .current_dir(sandbox.path());
            run_with_deadline(&mut percent, sandbox.path(), self.config.timeout)
                .ok()
                .filter(|r| r.success)
                .map(|r| r.stdout.trim().to_string())
        } else {
            None
        };

        Ok((TestStatus::Pass, detail))
    }
}

/// Returns true if the host Go toolchain responds.
#[must_use]
pub fn go_available() -> bool {
    Command::new("go")
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Checks that only import, macro, and deftest forms appear at top level.
fn validate_test_shape(forms: &[Ast], file: &str) -> Option<Diagnostic> {
    for form in forms {
        let head = form.head_symbol().unwrap_or("");
        if !ALLOWED_TEST_HEADS.contains(&head) {
            let span = form.span();
            return Some(
                Diagnostic::error(
                    DiagnosticCode::TstNonDeftest,
                    file,
                    span.line,
                    span.column,
                    format!(
                        "test files may only contain import, macro, and deftest forms, found '{}'",
                        if head.is_empty() { form.type_name() } else { head }
                    ),
                )
                .with_suggestion("wrap the form in a (deftest \"name\" ...) body"),
            );
        }
    }
    None
}

/// Prepends the bootstrap imports (`fmt`, `test`) unless already present.
fn with_bootstrap_imports(source: &str, forms: &[Ast]) -> String {
    let imported = collect_imports(forms);
    let missing: Vec<&str> = ["fmt", "test"]
        .into_iter()
        .filter(|needed| !imported.iter().any(|i| i == needed))
        .collect();
    if missing.is_empty() {
        return source.to_string();
    }
    let quoted: Vec<String> = missing.iter().map(|m| format!("\"{m}\"")).collect();
    format!("(import [{}])\n{source}", quoted.join(" "))
}

fn skipped(file: &Path, reason: &str) -> TestOutcome {
    TestOutcome {
        file: file.to_path_buf(),
        status: TestStatus::Skipped,
        duration: Duration::ZERO,
        detail: Some(reason.to_string()),
    }
}

/// Captured output of a deadline-bounded subprocess.
struct DeadlineOutput {
    success: bool,
    timed_out: bool,
    stdout: String,
    stderr: String,
}

/// Runs a command with stdout/stderr captured to files, killing the
/// process when the deadline expires.
fn run_with_deadline(
    command: &mut Command,
    sandbox: &Path,
    timeout: Duration,
) -> Result<DeadlineOutput> {
    let stdout_path = sandbox.join("stdout.log");
    let stderr_path = sandbox.join("stderr.log");
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(File::create(&stdout_path)?))
        .stderr(Stdio::from(File::create(&stderr_path)?));

    let mut child = command.spawn().map_err(|e| {
        Error::toolchain(format!("failed to spawn {:?}: {e}", command.get_program()))
    })?;

    let started = Instant::now();
    let timed_out = loop {
        match child.try_wait()? {
            Some(_) => break false,
            None if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                break true;
            }
            None => std::thread::sleep(Duration::from_millis(25)),
        }
    };

    let success = if timed_out {
        false
    } else {
        child.wait()?.success()
    };

    Ok(DeadlineOutput {
        success,
        timed_out,
        stdout: fs::read_to_string(&stdout_path).unwrap_or_default(),
        stderr: fs::read_to_string(&stderr_path).unwrap_or_default(),
    })
}
