//! Package discovery, ordering, and export extraction on real
//! directory trees.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use vex_foundation::{ErrorKind, Type};
use vex_resolver::{MODULE_MARKER, Resolver, find_module_root, read_module_name};

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
}

fn module() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp.path().join(MODULE_MARKER), "module demo\n");
    tmp
}

#[test]
fn module_root_found_from_nested_entry() {
    let tmp = module();
    let entry = tmp.path().join("cmd/tool/main.vx");
    write_file(&entry, "(def x 1)\n");

    assert_eq!(find_module_root(&entry), tmp.path());
    assert_eq!(read_module_name(tmp.path()).unwrap(), "demo");
}

#[test]
fn combined_source_is_deterministic() {
    let tmp = module();
    write_file(
        &tmp.path().join("alpha/lib.vx"),
        "(export [a])\n(defn a [] -> int 1)\n",
    );
    write_file(
        &tmp.path().join("beta/lib.vx"),
        "(export [b])\n(defn b [] -> int 2)\n",
    );
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import [\"beta\" \"alpha\"])\n(+ (alpha/a) (beta/b))\n");

    let first = Resolver::new().resolve(&entry).unwrap();
    let second = Resolver::new().resolve(&entry).unwrap();
    assert_eq!(first.combined_source, second.combined_source);
    // Lexicographic order among independent packages
    assert_eq!(first.order, vec!["alpha", "beta"]);
}

#[test]
fn dependencies_precede_dependents() {
    let tmp = module();
    write_file(
        &tmp.path().join("zz-base/lib.vx"),
        "(export [one])\n(defn one [] -> int 1)\n",
    );
    write_file(
        &tmp.path().join("aa-top/lib.vx"),
        "(import \"zz-base\")\n(export [two])\n(defn two [] -> int (+ (zz-base/one) 1))\n",
    );
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import \"aa-top\")\n(aa-top/two)\n");

    let unit = Resolver::new().resolve(&entry).unwrap();
    // Dependency order beats lexicographic order
    assert_eq!(unit.order, vec!["zz-base", "aa-top"]);
}

#[test]
fn exported_schemes_are_recorded() {
    let tmp = module();
    write_file(
        &tmp.path().join("mathx/lib.vx"),
        "(export [add])\n(defn add [x: int y: int] -> int (+ x y))\n(defn helper [x: int] -> int x)\n",
    );
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import \"mathx\")\n(mathx/add 1 2)\n");

    let unit = Resolver::new().resolve(&entry).unwrap();
    let schemes = &unit.packages.schemes["mathx"];
    assert_eq!(
        schemes["add"].ty,
        Type::fun(vec![Type::int(), Type::int()], Type::int())
    );
    assert!(!schemes.contains_key("helper"));
}

#[test]
fn packages_parse_once_even_when_imported_twice() {
    let tmp = module();
    write_file(
        &tmp.path().join("shared/lib.vx"),
        "(export [s])\n(defn s [] -> int 0)\n",
    );
    write_file(
        &tmp.path().join("one/lib.vx"),
        "(import \"shared\")\n(export [f])\n(defn f [] -> int (shared/s))\n",
    );
    write_file(
        &tmp.path().join("two/lib.vx"),
        "(import \"shared\")\n(export [g])\n(defn g [] -> int (shared/s))\n",
    );
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import [\"one\" \"two\"])\n(+ (one/f) (two/g))\n");

    let unit = Resolver::new().resolve(&entry).unwrap();
    let occurrences = unit
        .combined_source
        .matches(";; --- package shared ---")
        .count();
    assert_eq!(occurrences, 1);
}

#[test]
fn cycles_and_self_imports_fail() {
    let tmp = module();
    write_file(&tmp.path().join("x/lib.vx"), "(import \"y\")\n(export [fx])\n(defn fx [] -> int 1)\n");
    write_file(&tmp.path().join("y/lib.vx"), "(import \"x\")\n(export [fy])\n(defn fy [] -> int 2)\n");
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import \"x\")\n(x/fx)\n");

    let err = Resolver::new().resolve(&entry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PackageCycle { .. }));

    let tmp = module();
    write_file(
        &tmp.path().join("me/lib.vx"),
        "(import \"me\")\n(export [f])\n(defn f [] -> int 1)\n",
    );
    let entry = tmp.path().join("main.vx");
    write_file(&entry, "(import \"me\")\n(me/f)\n");
    let err = Resolver::new().resolve(&entry).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SelfImport { .. }));
}

#[test]
fn external_imports_are_left_to_the_host() {
    let tmp = module();
    let entry = tmp.path().join("main.vx");
    write_file(
        &entry,
        "(import [\"fmt\" \"github.com/google/uuid\"])\n(fmt/Println (uuid/NewString))\n",
    );

    let unit = Resolver::new().resolve(&entry).unwrap();
    assert!(unit.order.is_empty());
    assert!(unit.ignored_imports.is_empty());
}

#[test]
fn entry_test_files_include_package_tests() {
    let tmp = module();
    write_file(
        &tmp.path().join("mathx/lib.vx"),
        "(export [add])\n(defn add [x: int y: int] -> int (+ x y))\n",
    );
    write_file(
        &tmp.path().join("mathx/lib_test.vx"),
        "(deftest \"adds\" (= (add 1 2) 3))\n",
    );

    let regular_entry = tmp.path().join("main.vx");
    write_file(&regular_entry, "(import \"mathx\")\n(mathx/add 1 2)\n");
    let unit = Resolver::new().resolve(&regular_entry).unwrap();
    assert!(!unit.combined_source.contains("deftest"));

    let test_entry = tmp.path().join("main_test.vx");
    write_file(&test_entry, "(import \"mathx\")\n(deftest \"uses\" (= (mathx/add 1 2) 3))\n");
    let unit = Resolver::new().resolve(&test_entry).unwrap();
    assert!(unit.combined_source.contains("lib_test") || unit.combined_source.contains("deftest"));
}
