//! Third-party module detection and `go.mod` rendering.
//!
//! Import paths with at least one `/` whose first segment looks like a
//! host name (contains a dot) are third-party modules. They are recorded
//! with version `latest` and resolved by the host toolchain.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Version recorded for detected third-party modules.
pub const LATEST: &str = "latest";

/// Returns true if an import path refers to a third-party module rather
/// than the host standard library.
#[must_use]
pub fn is_third_party(path: &str) -> bool {
    match path.split_once('/') {
        Some((host, _)) => host.contains('.'),
        None => false,
    }
}

/// Renders `go.mod` content for the generated project.
#[must_use]
pub fn render_go_mod(module_name: &str, modules: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {module_name}");
    let _ = writeln!(out);
    let _ = writeln!(out, "go 1.21");
    if !modules.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "require (");
        for (module, version) in modules {
            let _ = writeln!(out, "    {module} {version}");
        }
        let _ = writeln!(out, ")");
    }
    out
}
