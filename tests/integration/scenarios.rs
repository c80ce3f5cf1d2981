//! The end-to-end scenarios, from source text to generated Go (and,
//! when a Go toolchain is installed, to program output).

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use vex_runtime::{
    TranspileError, Transpiler, TranspilerConfig, go_available, write_go_project,
};

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
}

fn transpile_at(tmp: &TempDir, entry_rel: &str) -> Result<vex_runtime::Transpiled, TranspileError> {
    Transpiler::new(TranspilerConfig::new(tmp.path().join(entry_rel))).transpile()
}

fn diagnostics(err: TranspileError) -> String {
    match err {
        TranspileError::Diagnostics(sink) => sink.format(),
        TranspileError::Infrastructure(other) => panic!("expected diagnostics, got {other}"),
    }
}

/// Runs the generated program and returns stdout (skipped silently when
/// no Go toolchain is installed).
fn run_go(transpiled: &vex_runtime::Transpiled) -> Option<String> {
    if !go_available() {
        return None;
    }
    let project = TempDir::new().unwrap();
    write_go_project(project.path(), transpiled, "vex-scenario").unwrap();
    let output = Command::new("go")
        .arg("run")
        .arg(".")
        .current_dir(project.path())
        .output()
        .expect("go run failed to start");
    assert!(
        output.status.success(),
        "go run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[test]
fn scenario_hello_world() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module hello\n");
    write_file(
        &tmp.path().join("main.vx"),
        "(import \"fmt\")\n(fmt/Println \"hi\")\n",
    );

    let transpiled = transpile_at(&tmp, "main.vx").unwrap();
    assert!(transpiled.go_source.contains("import \"fmt\""));
    assert!(transpiled.go_source.contains("fmt.Println(\"hi\")"));

    if let Some(stdout) = run_go(&transpiled) {
        assert_eq!(stdout, "hi\n");
    }
}

#[test]
fn scenario_typed_function() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module typed\n");
    write_file(
        &tmp.path().join("main.vx"),
        "(defn add [x: int y: int] -> int (+ x y))\n(add 2 3)\n",
    );

    let transpiled = transpile_at(&tmp, "main.vx").unwrap();
    assert!(
        transpiled
            .go_source
            .contains("func(x int, y int) int { return x + y }")
    );

    // Calling with a string argument fails at the argument's column
    write_file(
        &tmp.path().join("bad.vx"),
        "(defn add [x: int y: int] -> int (+ x y))\n(add 2 \"x\")\n",
    );
    let rendered = diagnostics(transpile_at(&tmp, "bad.vx").unwrap_err());
    assert!(rendered.contains("[VEX-TYP-ARG]"), "{rendered}");
    assert!(rendered.contains(":2:8:"), "{rendered}");
}

#[test]
fn scenario_polymorphic_id() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module poly\n");
    write_file(
        &tmp.path().join("main.vx"),
        "(defn id [x: a] -> a x)\n(id 1)\n(id \"s\")\n",
    );

    assert!(transpile_at(&tmp, "main.vx").is_ok());
}

#[test]
fn scenario_if_mismatch() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module iff\n");
    write_file(&tmp.path().join("main.vx"), "(if true 1 \"x\")\n");

    let rendered = diagnostics(transpile_at(&tmp, "main.vx").unwrap_err());
    assert!(rendered.contains("[VEX-TYP-IF-MISMATCH]"), "{rendered}");
    assert!(
        rendered.contains("Expected: type(then) == type(else); Got: then=number, else=string"),
        "{rendered}"
    );
}

#[test]
fn scenario_nominal_record_conflict() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module nominal\n");
    write_file(
        &tmp.path().join("main.vx"),
        "(record A [x: number])\n(record B [x: number])\n(if true (A [x: 1]) (B [x: 2]))\n",
    );

    let rendered = diagnostics(transpile_at(&tmp, "main.vx").unwrap_err());
    assert!(rendered.contains("[VEX-REC-NOMINAL]"), "{rendered}");
}

#[test]
fn scenario_cross_package_export() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join("vex.pkg"), "module cross\n");
    write_file(
        &tmp.path().join("b/lib.vx"),
        "(export [add])\n(defn add [x: int y: int] -> int (+ x y))\n(defn hidden [x: int] -> int x)\n",
    );
    write_file(
        &tmp.path().join("a/lib.vx"),
        "(import \"b\")\n(export [sum-three])\n(defn sum-three [x: int y: int z: int] -> int (b/add x (b/add y z)))\n",
    );
    write_file(
        &tmp.path().join("main.vx"),
        "(import [\"a\" \"fmt\"])\n(fmt/Println (a/sum-three 1 2 3))\n",
    );

    let transpiled = transpile_at(&tmp, "main.vx").unwrap();
    assert!(transpiled.go_source.contains("sum_three(1, 2, 3)"));

    if let Some(stdout) = run_go(&transpiled) {
        assert_eq!(stdout, "6\n");
    }

    // Calling a non-exported symbol from another package always fails
    write_file(
        &tmp.path().join("sneaky.vx"),
        "(import \"b\")\n(b/hidden 1)\n",
    );
    let rendered = diagnostics(transpile_at(&tmp, "sneaky.vx").unwrap_err());
    assert!(rendered.contains("[VEX-PKG-NOT-EXPORTED]"), "{rendered}");
}
