//! Vex CLI entry point.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use std::time::Duration;

use vex_runtime::{
    CoverageReport, TestRunner, TestRunnerConfig, TranspileError, Transpiler, TranspilerConfig,
    generated_module_name, write_go_project,
};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Some(verb) = args.get(1) else {
        print_help();
        return Ok(ExitCode::FAILURE);
    };

    match verb.as_str() {
        "transpile" => cmd_transpile(&args[2..]),
        "run" => cmd_run(&args[2..]),
        "build" => cmd_build(&args[2..]),
        "test" => cmd_test(&args[2..]),
        "-h" | "--help" | "help" => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        "-V" | "--version" | "version" => {
            println!("vex {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        other => Err(format!("unknown command: {other}").into()),
    }
}

/// Flags shared by the compile-shaped verbs.
#[derive(Default)]
struct CompileFlags {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
}

fn parse_compile_flags(args: &[String]) -> Result<CompileFlags, Box<dyn std::error::Error>> {
    let mut flags = CompileFlags::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-input" => {
                i += 1;
                flags.input = Some(PathBuf::from(required_value(args, i, "-input")?));
            }
            "-output" => {
                i += 1;
                flags.output = Some(PathBuf::from(required_value(args, i, "-output")?));
            }
            "-verbose" => flags.verbose = true,
            other => return Err(format!("unknown option: {other}").into()),
        }
        i += 1;
    }
    Ok(flags)
}

fn required_value<'a>(
    args: &'a [String],
    i: usize,
    flag: &str,
) -> Result<&'a str, Box<dyn std::error::Error>> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn transpile_input(flags: &CompileFlags) -> Result<Option<vex_runtime::Transpiled>, Box<dyn std::error::Error>> {
    let Some(input) = &flags.input else {
        return Err("-input is required".into());
    };
    let config = TranspilerConfig::new(input)
        .with_output(flags.output.clone())
        .with_verbose(flags.verbose);

    match Transpiler::new(config).transpile() {
        Ok(transpiled) => {
            for warning in transpiled.warnings.sorted() {
                eprintln!("{warning}");
            }
            Ok(Some(transpiled))
        }
        Err(TranspileError::Diagnostics(sink)) => {
            eprintln!("{}", sink.format());
            Ok(None)
        }
        Err(TranspileError::Infrastructure(err)) => Err(err.into()),
    }
}

fn cmd_transpile(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let flags = parse_compile_flags(args)?;
    let Some(transpiled) = transpile_input(&flags)? else {
        return Ok(ExitCode::FAILURE);
    };

    match &flags.output {
        Some(path) => fs::write(path, &transpiled.go_source)?,
        None => print!("{}", transpiled.go_source),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let flags = parse_compile_flags(args)?;
    let Some(transpiled) = transpile_input(&flags)? else {
        return Ok(ExitCode::FAILURE);
    };

    let project = tempfile::TempDir::new()?;
    write_go_project(project.path(), &transpiled, &generated_module_name())?;
    tidy_if_needed(project.path(), !transpiled.modules.is_empty())?;

    let status = Command::new("go")
        .arg("run")
        .arg(".")
        .current_dir(project.path())
        .status()?;
    Ok(exit_from_status(status.success()))
}

fn cmd_build(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let flags = parse_compile_flags(args)?;
    let Some(transpiled) = transpile_input(&flags)? else {
        return Ok(ExitCode::FAILURE);
    };

    let binary = flags.output.clone().unwrap_or_else(|| {
        let stem = flags
            .input
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("main");
        PathBuf::from(stem)
    });
    let binary = if binary.is_absolute() {
        binary
    } else {
        env::current_dir()?.join(binary)
    };

    let project = tempfile::TempDir::new()?;
    write_go_project(project.path(), &transpiled, &generated_module_name())?;
    tidy_if_needed(project.path(), !transpiled.modules.is_empty())?;

    let status = Command::new("go")
        .arg("build")
        .arg("-o")
        .arg(&binary)
        .arg(".")
        .current_dir(project.path())
        .status()?;
    Ok(exit_from_status(status.success()))
}

fn cmd_test(args: &[String]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = TestRunnerConfig::new(".");
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-dir" => {
                i += 1;
                config.dir = PathBuf::from(required_value(args, i, "-dir")?);
            }
            "-coverage" => config.coverage = true,
            "-coverage-out" => {
                i += 1;
                config.coverage_out = Some(PathBuf::from(required_value(args, i, "-coverage-out")?));
            }
            "-failfast" => config.fail_fast = true,
            "-pattern" => {
                i += 1;
                config.pattern = Some(required_value(args, i, "-pattern")?.to_string());
            }
            "-timeout" => {
                i += 1;
                config.timeout = parse_duration(required_value(args, i, "-timeout")?)?;
            }
            "-verbose" => config.verbose = true,
            other => return Err(format!("unknown option: {other}").into()),
        }
        i += 1;
    }

    let coverage = config.coverage;
    let coverage_out = config.coverage_out.clone();
    let scan_root = config.dir.clone();

    let runner = TestRunner::new(config);
    let summary = runner.run();
    print!("{}", summary.render());

    if coverage {
        let report = CoverageReport::scan(&scan_root, &summary);
        let json = report.to_json()?;
        match coverage_out {
            Some(path) => fs::write(path, json)?,
            None => println!("{json}"),
        }
    }

    Ok(exit_from_status(summary.all_passed()))
}

fn tidy_if_needed(dir: &std::path::Path, needed: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !needed {
        return Ok(());
    }
    let status = Command::new("go")
        .arg("mod")
        .arg("tidy")
        .current_dir(dir)
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err("go mod tidy failed".into())
    }
}

/// Parses `30s`, `1m30s`, `500ms`, or bare seconds.
fn parse_duration(text: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let text = text.trim();
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    if let Some(ms) = text.strip_suffix("ms") {
        return Ok(Duration::from_millis(ms.parse()?));
    }
    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("invalid duration: {text}"))?;
        let (digits, tail) = rest.split_at(split);
        let value: u64 = digits.parse()?;
        if let Some(after) = tail.strip_prefix('m') {
            if let Some(after_ms) = after.strip_prefix('s') {
                total += Duration::from_millis(value);
                rest = after_ms;
            } else {
                total += Duration::from_secs(value * 60);
                rest = after;
            }
        } else if let Some(after) = tail.strip_prefix('s') {
            total += Duration::from_secs(value);
            rest = after;
        } else if let Some(after) = tail.strip_prefix('h') {
            total += Duration::from_secs(value * 3600);
            rest = after;
        } else {
            return Err(format!("invalid duration: {text}").into());
        }
    }
    Ok(total)
}

fn exit_from_status(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_help() {
    println!(
        "vex - an s-expression language compiled to Go

Usage:
  vex transpile -input <file.vx> [-output <file.go>] [-verbose]
  vex run       -input <file.vx> [-verbose]
  vex build     -input <file.vx> [-output <binary>] [-verbose]
  vex test      [-dir <path>] [-coverage] [-coverage-out <file>] [-failfast]
                [-pattern <substr>] [-timeout <duration>] [-verbose]

Environment:
  VEX_STDLIB_PATH   override the stdlib package lookup root"
    );
}
