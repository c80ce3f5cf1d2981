//! Package resolution.
//!
//! Given an entry `.vx` file, the resolver discovers every local package
//! it transitively imports, extracts exports and per-symbol type schemes
//! (via the analyzer in signature mode), orders the packages dependencies
//! first, and concatenates their sources with the entry file into one
//! compilation unit.
//!
//! Packages are parsed at most once; results are memoized by absolute
//! directory path. Cycles and self-imports are rejected.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use vex_analyzer::{Analyzer, Mode, PackageContext};
use vex_foundation::{DiagnosticSink, Error, ErrorKind, Result, Scheme};
use vex_language::{Ast, MacroExpander, parse, parse_with_recovery};

use crate::module::{find_module_root, is_local_package};

/// One resolved compilation unit.
#[derive(Debug)]
pub struct ResolvedUnit {
    /// All reachable package sources plus the entry file, dependencies
    /// first, separated by marker comments.
    pub combined_source: String,
    /// The entry file the unit was built from.
    pub entry: PathBuf,
    /// The module root directory.
    pub module_root: PathBuf,
    /// Import paths that refer to local packages; the code generator
    /// must not emit Go imports for these.
    pub ignored_imports: BTreeSet<String>,
    /// Exports and schemes per local package name, for the analyzer.
    pub packages: PackageContext,
    /// Local package names in concatenation order.
    pub order: Vec<String>,
}

/// A memoized per-package summary.
#[derive(Debug, Clone)]
struct PackageSummary {
    /// Raw source of every package file, concatenated.
    source: String,
    /// Exported symbol names.
    exports: BTreeSet<String>,
    /// Schemes for the exported symbols.
    schemes: HashMap<String, Scheme>,
}

/// The package resolver.
#[derive(Debug, Default)]
pub struct Resolver {
    /// Memoized packages by absolute directory path.
    cache: HashMap<PathBuf, PackageSummary>,
    /// Directories currently being loaded, for cycle detection.
    loading: Vec<PathBuf>,
    /// Fallback root for stdlib packages (`VEX_STDLIB_PATH`).
    stdlib_root: Option<PathBuf>,
}

impl Resolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stdlib fallback root searched after the module root.
    #[must_use]
    pub fn with_stdlib_root(mut self, root: Option<PathBuf>) -> Self {
        self.stdlib_root = root;
        self
    }

    /// Resolves the compilation unit rooted at `entry`.
    pub fn resolve(&mut self, entry: &Path) -> Result<ResolvedUnit> {
        let entry_source = fs::read_to_string(entry).map_err(|e| {
            Error::resolution(format!("cannot read entry {}: {e}", entry.display()))
        })?;
        self.resolve_source(entry, &entry_source)
    }

    /// Resolves a unit from in-memory entry source.
    ///
    /// The entry path still anchors module-root discovery; the test
    /// runner uses this to prepend bootstrap imports without touching
    /// the file on disk.
    pub fn resolve_source(&mut self, entry: &Path, entry_source: &str) -> Result<ResolvedUnit> {
        let module_root = find_module_root(entry);

        // Imports are collected best-effort; syntax errors in the entry
        // resurface with full positions when the unit itself is parsed.
        let mut scratch = DiagnosticSink::new();
        let entry_forms =
            parse_with_recovery(entry_source, &entry.display().to_string(), &mut scratch);
        let include_tests = entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_test.vx"));

        let mut order = Vec::new();
        let mut ignored = BTreeSet::new();
        for import in collect_imports(&entry_forms) {
            self.load_import(&import, &module_root, include_tests, &mut order, &mut ignored)?;
        }

        // Assemble: dependencies first, then the entry file. A unit with
        // no local packages keeps the entry text verbatim so diagnostic
        // positions match the file.
        let mut combined = String::new();
        let mut packages = PackageContext::default();
        for name in &order {
            let dir = self.package_dir(&module_root, name);
            let summary = &self.cache[&dir];
            combined.push_str(&format!(";; --- package {name} ---\n"));
            combined.push_str(&summary.source);
            if !combined.ends_with('\n') {
                combined.push('\n');
            }
            let short = short_name(name);
            packages.exports.insert(short.clone(), summary.exports.clone());
            packages.schemes.insert(short, summary.schemes.clone());
        }
        if combined.is_empty() {
            combined.push_str(entry_source);
        } else {
            combined.push_str(&format!(";; --- entry {} ---\n", entry.display()));
            combined.push_str(entry_source);
        }

        Ok(ResolvedUnit {
            combined_source: combined,
            entry: entry.to_path_buf(),
            module_root,
            ignored_imports: ignored,
            packages,
            order,
        })
    }

    /// Loads one import if it is local, recursing into its own imports.
    fn load_import(
        &mut self,
        import: &str,
        module_root: &Path,
        include_tests: bool,
        order: &mut Vec<String>,
        ignored: &mut BTreeSet<String>,
    ) -> Result<()> {
        let dir = self.package_dir(module_root, import);
        if !is_local_package(&dir) {
            // Host-language import; the code generator handles it
            return Ok(());
        }
        ignored.insert(import.to_string());

        if self.cache.contains_key(&dir) {
            return Ok(());
        }
        if let Some(pos) = self.loading.iter().position(|p| p == &dir) {
            let mut cycle: Vec<String> = self.loading[pos..]
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            cycle.push(dir.display().to_string());
            return Err(Error::new(ErrorKind::PackageCycle {
                cycle: cycle.join(" -> "),
            }));
        }

        self.loading.push(dir.clone());
        let result = self.load_package(import, &dir, module_root, include_tests, order, ignored);
        self.loading.pop();
        result
    }

    /// Parses, recurses, and summarizes one local package.
    fn load_package(
        &mut self,
        import: &str,
        dir: &Path,
        module_root: &Path,
        include_tests: bool,
        order: &mut Vec<String>,
        ignored: &mut BTreeSet<String>,
    ) -> Result<()> {
        let files = package_files(dir, include_tests)?;
        let mut source = String::new();
        let mut forms: Vec<Ast> = Vec::new();
        for path in &files {
            let text = fs::read_to_string(path).map_err(|e| {
                Error::resolution(format!("cannot read {}: {e}", path.display()))
            })?;
            forms.extend(parse(&text)?);
            source.push_str(&text);
            if !source.ends_with('\n') {
                source.push('\n');
            }
        }

        // Dependencies first, in sorted order for determinism
        for nested in collect_imports(&forms) {
            let nested_dir = self.package_dir(module_root, &nested);
            if nested_dir == dir {
                return Err(Error::new(ErrorKind::SelfImport {
                    path: nested.clone(),
                }));
            }
            self.load_import(&nested, module_root, include_tests, order, ignored)?;
        }

        // Signature pass: exports and schemes for exported symbols
        let expanded = MacroExpander::new().expand_all(&forms)?;
        let analysis = Analyzer::with_mode(dir.display().to_string(), Mode::Signature)
            .analyze(&expanded);

        let schemes = analysis
            .schemes
            .iter()
            .filter(|(name, _)| analysis.exports.contains(*name))
            .map(|(name, scheme)| (name.clone(), scheme.clone()))
            .collect();

        self.cache.insert(
            dir.to_path_buf(),
            PackageSummary {
                source,
                exports: analysis.exports,
                schemes,
            },
        );
        order.push(import.to_string());
        Ok(())
    }

    /// The directory an import path refers to: the module root first,
    /// then the stdlib fallback root.
    fn package_dir(&self, module_root: &Path, import: &str) -> PathBuf {
        let local = module_root.join(import);
        if is_local_package(&local) {
            return local;
        }
        if let Some(stdlib) = &self.stdlib_root {
            let candidate = stdlib.join(import);
            if is_local_package(&candidate) {
                return candidate;
            }
        }
        local
    }
}

/// Collects import paths from top-level `(import …)` forms.
#[must_use]
pub fn collect_imports(forms: &[Ast]) -> Vec<String> {
    let mut imports = Vec::new();
    for form in forms {
        if form.head_symbol() != Some("import") {
            continue;
        }
        let elements = form.as_list().unwrap_or_default();
        for arg in &elements[1..] {
            match arg {
                Ast::Str(path, _) => imports.push(path.clone()),
                Ast::Array(entries, _) => {
                    for entry in entries {
                        if let Some(path) = entry.as_str() {
                            imports.push(path.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }
    imports.sort();
    imports.dedup();
    imports
}

/// The short name used in call heads (`utils/mathx` is called as `mathx/…`).
fn short_name(import: &str) -> String {
    import.rsplit('/').next().unwrap_or(import).to_string()
}

/// Lists the `.vx` files of a package, sorted by file name.
fn package_files(dir: &Path, include_tests: bool) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::resolution(format!("cannot read package {}: {e}", dir.display())))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("vx")))
        .filter(|path| {
            include_tests
                || !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with("_test.vx"))
        })
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(Error::resolution(format!(
            "package {} contains no .vx files",
            dir.display()
        )));
    }
    Ok(files)
}
