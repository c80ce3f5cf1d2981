//! Third-party module detection and go.mod output.

use std::collections::BTreeSet;

use vex_codegen::{GoGenerator, is_third_party, render_go_mod};
use vex_language::parse;

#[test]
fn stdlib_versus_third_party_classification() {
    assert!(!is_third_party("fmt"));
    assert!(!is_third_party("os/exec"));
    assert!(is_third_party("github.com/lib/pq"));
    assert!(is_third_party("gopkg.in/yaml.v3"));
}

#[test]
fn detected_modules_default_to_latest() {
    let forms = parse(
        "(import [\"fmt\" \"github.com/google/uuid\" \"golang.org/x/sync/errgroup\"])\n(fmt/Println (uuid/NewString))",
    )
    .unwrap();
    let mut generator = GoGenerator::new();
    let go = generator.generate(&forms);

    let modules = generator.detected_modules();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules["github.com/google/uuid"], "latest");
    assert_eq!(modules["golang.org/x/sync/errgroup"], "latest");

    // Imports are emitted once each, sorted
    assert_eq!(go.matches("github.com/google/uuid").count(), 1);
}

#[test]
fn go_mod_lists_requirements() {
    let forms = parse("(import \"github.com/google/uuid\")\n(uuid/NewString)").unwrap();
    let mut generator = GoGenerator::new();
    generator.generate(&forms);

    let go_mod = render_go_mod("vex-project-1712000000", generator.detected_modules());
    assert!(go_mod.starts_with("module vex-project-1712000000\n"));
    assert!(go_mod.contains("go 1.21"));
    assert!(go_mod.contains("require ("));
    assert!(go_mod.contains("github.com/google/uuid latest"));
}

#[test]
fn local_packages_never_reach_go_mod() {
    let forms = parse("(import [\"mathx\" \"github.com/lib/pq\"])\n(mathx/add 1 2)").unwrap();
    let mut generator =
        GoGenerator::new().with_ignored_imports(BTreeSet::from(["mathx".to_string()]));
    let go = generator.generate(&forms);

    assert!(!go.contains("mathx"));
    assert_eq!(generator.detected_modules().len(), 1);
}

#[test]
fn duplicate_imports_are_coalesced() {
    let forms = parse(
        "(import \"fmt\")\n(import \"fmt\")\n(import [\"fmt\" \"strings\"])\n(fmt/Println (strings/ToUpper \"a\"))",
    )
    .unwrap();
    let mut generator = GoGenerator::new();
    let go = generator.generate(&forms);
    assert_eq!(go.matches("\"fmt\"").count(), 1);
    assert_eq!(go.matches("\"strings\"").count(), 1);
}
