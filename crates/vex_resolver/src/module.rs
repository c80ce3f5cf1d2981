//! Module root discovery.
//!
//! A Vex module is marked by a `vex.pkg` file at its root, containing a
//! single `module <name>` line. The root is found by upward search from
//! the entry file; without a marker, the entry's directory is the root.

use std::fs;
use std::path::{Path, PathBuf};

use vex_foundation::{Error, Result};

/// Name of the module marker file.
pub const MODULE_MARKER: &str = "vex.pkg";

/// Finds the module root for an entry file.
///
/// Walks ancestor directories looking for [`MODULE_MARKER`]; falls back
/// to the entry's own directory.
#[must_use]
pub fn find_module_root(entry: &Path) -> PathBuf {
    let start = entry.parent().unwrap_or_else(|| Path::new("."));
    for dir in start.ancestors() {
        if dir.join(MODULE_MARKER).is_file() {
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}

/// Reads the module name from the marker file at the given root.
pub fn read_module_name(root: &Path) -> Result<String> {
    let marker = root.join(MODULE_MARKER);
    let text = fs::read_to_string(&marker)?;
    let line = text.lines().next().unwrap_or("").trim();
    match line.strip_prefix("module ") {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(Error::resolution(format!(
            "malformed {MODULE_MARKER} at {}: expected 'module <name>'",
            marker.display()
        ))),
    }
}

/// Returns true if the directory is a local package: it exists and
/// contains at least one `.vx` file.
#[must_use]
pub fn is_local_package(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vx"))
    })
}
