//! Go source emission.
//!
//! Walks the analyzed tree and builds `package main` text: an imports
//! block, record structs, then every top-level form inside `func main()`.
//! Functions become Go closures; `if` in expression position becomes an
//! immediately-invoked closure; unused bindings are suppressed with
//! `_ =` so generated programs always build.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use vex_analyzer::RecordTable;
use vex_foundation::{Scheme, Type};
use vex_language::Ast;

use crate::gomod::{LATEST, is_third_party};
use crate::names::{go_field_name, go_ident};

/// Generates Go source from analyzed Vex forms.
pub struct GoGenerator {
    /// Declared records, for struct emission and constructors.
    records: RecordTable,
    /// Top-level schemes, for `var name T = …` emission.
    schemes: HashMap<String, Scheme>,
    /// Import paths that are local Vex packages (never emitted).
    ignored_imports: BTreeSet<String>,
    /// Short call names of the local packages.
    local_names: BTreeSet<String>,
    /// Go import paths used by the program.
    imports: BTreeSet<String>,
    /// Detected third-party modules with versions.
    modules: BTreeMap<String, String>,
}

impl Default for GoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoGenerator {
    /// Creates a generator with no analysis context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RecordTable::new(),
            schemes: HashMap::new(),
            ignored_imports: BTreeSet::new(),
            local_names: BTreeSet::new(),
            imports: BTreeSet::new(),
            modules: BTreeMap::new(),
        }
    }

    /// Supplies analyzer output: records and top-level schemes.
    #[must_use]
    pub fn with_analysis(mut self, records: RecordTable, schemes: HashMap<String, Scheme>) -> Self {
        self.records = records;
        self.schemes = schemes;
        self
    }

    /// Supplies the resolver's local import paths, which must not become
    /// Go imports.
    #[must_use]
    pub fn with_ignored_imports(mut self, ignored: BTreeSet<String>) -> Self {
        self.local_names = ignored
            .iter()
            .map(|path| path.rsplit('/').next().unwrap_or(path).to_string())
            .collect();
        self.ignored_imports = ignored;
        self
    }

    /// Third-party modules detected during generation.
    #[must_use]
    pub fn detected_modules(&self) -> &BTreeMap<String, String> {
        &self.modules
    }

    /// Generates the complete Go source file.
    pub fn generate(&mut self, forms: &[Ast]) -> String {
        let mut statements: Vec<String> = Vec::new();

        for form in forms {
            match form.head_symbol() {
                Some("import") => self.collect_import(form),
                Some("export" | "macro" | "record") => {}
                Some("def") => self.emit_def(form, &mut statements),
                _ => {
                    let expr = self.emit_expr(form, None);
                    if is_statement_expr(form) {
                        statements.push(expr);
                    } else {
                        statements.push(format!("_ = {expr}"));
                    }
                }
            }
        }

        self.assemble(&statements)
    }

    /// Assembles the final file: package clause, imports, structs, main.
    fn assemble(&self, statements: &[String]) -> String {
        let mut out = String::from("package main\n\n");

        if self.imports.len() == 1 {
            let only = self.imports.iter().next().expect("len checked");
            let _ = writeln!(out, "import \"{only}\"\n");
        } else if !self.imports.is_empty() {
            out.push_str("import (\n");
            for path in &self.imports {
                let _ = writeln!(out, "\t\"{path}\"");
            }
            out.push_str(")\n\n");
        }

        // Record declarations become structs, in declaration order
        for decl in self.records.in_order() {
            let _ = writeln!(out, "type {} struct {{", go_ident(&decl.name));
            for (field, ty) in &decl.fields {
                let _ = writeln!(out, "\t{} {}", go_field_name(field), go_type(ty));
            }
            out.push_str("}\n\n");
        }

        out.push_str("func main() {\n");
        for stmt in statements {
            for line in stmt.lines() {
                let _ = writeln!(out, "\t{line}");
            }
        }
        out.push_str("}\n");
        out
    }

    /// Collects `(import …)` paths into the Go import set.
    fn collect_import(&mut self, form: &Ast) {
        let elements = form.as_list().unwrap_or_default();
        for arg in &elements[1..] {
            match arg {
                Ast::Str(path, _) => self.add_import(path),
                Ast::Array(entries, _) => {
                    for entry in entries {
                        if let Some(path) = entry.as_str() {
                            self.add_import(path);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Adds one import path unless it refers to a local Vex package.
    fn add_import(&mut self, path: &str) {
        if self.ignored_imports.contains(path) {
            return;
        }
        // vex.* imports are stdlib bootstrap and never reach Go
        if path.starts_with("vex.") {
            return;
        }
        self.imports.insert(path.to_string());
        if is_third_party(path) {
            self.modules.insert(path.to_string(), LATEST.to_string());
        }
    }

    /// Emits a `(def name expr)` as statements.
    fn emit_def(&mut self, form: &Ast, statements: &mut Vec<String>) {
        let elements = form.as_list().unwrap_or_default();
        let (Some(name), Some(expr)) = (elements.get(1).and_then(Ast::as_symbol), elements.get(2))
        else {
            return;
        };
        let id = go_ident(name);

        if expr.head_symbol() == Some("fn") {
            // Two-step binding so recursive closures resolve
            let fn_type = self.closure_type(expr);
            let closure = self.emit_expr(expr, None);
            statements.push(format!("var {id} {fn_type}"));
            statements.push(format!("{id} = {closure}"));
        } else {
            let concrete = self.concrete_type_of(name);
            let rendered = self.emit_expr(expr, concrete.as_deref());
            match concrete {
                Some(ty) => statements.push(format!("var {id} {ty} = {rendered}")),
                None => statements.push(format!("{id} := {rendered}")),
            }
        }
        statements.push(format!("_ = {id}"));
    }

    /// The Go type to use in `var name T = …`, when it is concrete.
    ///
    /// Only scalar and record constants qualify; collection literals are
    /// emitted untyped, so their bindings use `:=`.
    fn concrete_type_of(&self, name: &str) -> Option<String> {
        let scheme = self.schemes.get(name)?;
        if scheme.is_polymorphic() {
            return None;
        }
        match &scheme.ty {
            Type::Con(con) if con != "any" => Some(go_type(&scheme.ty)),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// Emits an expression. `hint` carries a concrete Go result type for
    /// expression-position `if`/`do`/`let` closures.
    fn emit_expr(&mut self, ast: &Ast, hint: Option<&str>) -> String {
        match ast {
            Ast::Bool(b, _) => b.to_string(),
            Ast::Int(n, _) => n.to_string(),
            Ast::Float(n, _) => float_literal(*n),
            Ast::Str(s, _) => go_string(s),
            Ast::Symbol(name, _) => self.emit_symbol_ref(name),
            Ast::Array(elements, _) => {
                let items: Vec<String> =
                    elements.iter().map(|e| self.emit_expr(e, None)).collect();
                format!("[]interface{{}}{{{}}}", items.join(", "))
            }
            Ast::List(elements, _) => self.emit_list(elements, hint),
            Ast::Splice(inner, _) => self.emit_expr(inner, hint),
        }
    }

    fn emit_symbol_ref(&mut self, name: &str) -> String {
        if let Some((pkg, func)) = name.split_once('/') {
            let short = pkg.rsplit('/').next().unwrap_or(pkg);
            if self.local_names.contains(short) {
                // Local packages share the single generated file
                return go_ident(func);
            }
            // An explicit (import "…/pkg") form may already cover this
            let covered = self
                .imports
                .iter()
                .any(|p| p == pkg || p.rsplit('/').next() == Some(short));
            if !covered {
                self.add_import(pkg);
            }
            return format!("{short}.{func}");
        }
        go_ident(name)
    }

    fn emit_list(&mut self, elements: &[Ast], hint: Option<&str>) -> String {
        let Some(head) = elements.first() else {
            return "nil".to_string();
        };

        if let Some(name) = head.as_symbol() {
            let args = &elements[1..];
            match name {
                "fn" => return self.emit_closure(elements),
                "if" => return self.emit_if(args, hint),
                "do" => return self.emit_do(args, hint),
                "let" => return self.emit_let(args, hint),
                "map" => return self.emit_map(args),
                "+" | "-" | "*" | "/" => return self.emit_binary(name, args),
                ">" | "<" | ">=" | "<=" => return self.emit_binary(name, args),
                "=" => return self.emit_binary("==", args),
                "and" => return self.emit_binary("&&", args),
                "or" => return self.emit_binary("||", args),
                "not" => {
                    let inner = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("!({inner})");
                }
                "first" => return self.indexed(args, "[0]"),
                "rest" => return self.indexed(args, "[1:]"),
                "count" | "len" => {
                    let xs = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("len({xs})");
                }
                "empty?" => {
                    let xs = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("(len({xs}) == 0)");
                }
                "cons" => {
                    let x = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    let xs = args.get(1).map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("append([]interface{{}}{{{x}}}, {xs}...)");
                }
                "get" => {
                    let xs = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    let i = args.get(1).map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("{xs}[{i}]");
                }
                "slice" => {
                    let xs = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    let i = args.get(1).map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("{xs}[{i}:]");
                }
                "append" => {
                    let a = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
                    let b = args.get(1).map_or_else(String::new, |a| self.emit_expr(a, None));
                    return format!("append({a}, {b}...)");
                }
                _ => {}
            }

            if let Some(method) = name.strip_prefix('.') {
                return self.emit_method_call(method, args);
            }
            if self.records.is_record(name) {
                return self.emit_record_use(name, args);
            }
            // Instance field access `(u :field)`
            if args.len() == 1 {
                if let Some(field) = args[0].as_symbol().and_then(|s| s.strip_prefix(':')) {
                    return format!("{}.{}", go_ident(name), go_field_name(field));
                }
            }

            let callee = self.emit_symbol_ref(name);
            let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a, None)).collect();
            return format!("{callee}({})", rendered.join(", "));
        }

        // Computed callee
        let callee = self.emit_expr(head, None);
        let rendered: Vec<String> = elements[1..]
            .iter()
            .map(|a| self.emit_expr(a, None))
            .collect();
        format!("{callee}({})", rendered.join(", "))
    }

    /// `(fn [p: T …] -> R body…)` → Go closure literal.
    fn emit_closure(&mut self, elements: &[Ast]) -> String {
        let params = self.closure_params(elements);
        let ret = closure_return_type(elements);
        let body = self.closure_body(elements, &ret);
        format!("func({params}) {ret} {{ {body} }}")
    }

    /// The `func(…) R` type of a closure, for two-step `var` bindings.
    fn closure_type(&mut self, fn_form: &Ast) -> String {
        let elements = fn_form.as_list().unwrap_or_default();
        let params = self.closure_params(elements);
        let ret = closure_return_type(elements);
        format!("func({params}) {ret}")
    }

    fn closure_params(&mut self, elements: &[Ast]) -> String {
        let Some(params) = elements.get(1).and_then(Ast::as_array) else {
            return String::new();
        };
        let mut rendered = Vec::new();
        for pair in params.chunks(2) {
            let Some(raw) = pair[0].as_symbol() else {
                continue;
            };
            let name = go_ident(raw.trim_end_matches(':'));
            let ty = pair.get(1).map_or_else(|| "interface{}".to_string(), annotation_type);
            rendered.push(format!("{name} {ty}"));
        }
        rendered.join(", ")
    }

    /// Closure body: leading forms as statements, last form returned.
    fn closure_body(&mut self, elements: &[Ast], ret: &str) -> String {
        // Flatten a single (do …) wrapper into the statement sequence
        let body: Vec<&Ast> = match elements.get(4..) {
            Some([only]) if only.head_symbol() == Some("do") => {
                only.as_list().map_or_else(Vec::new, |l| l[1..].iter().collect())
            }
            Some(forms) => forms.iter().collect(),
            None => Vec::new(),
        };

        let mut parts = Vec::new();
        for (i, form) in body.iter().enumerate() {
            if i + 1 == body.len() {
                let hint = concrete_hint(ret);
                let expr = self.emit_expr(form, hint);
                parts.push(format!("return {expr}"));
            } else {
                parts.push(self.emit_statement(form));
            }
        }
        if parts.is_empty() {
            parts.push(format!("return {}", zero_value(ret)));
        }
        parts.join("; ")
    }

    /// A form in statement position inside a closure body.
    fn emit_statement(&mut self, form: &Ast) -> String {
        if form.head_symbol() == Some("def") {
            let elements = form.as_list().unwrap_or_default();
            if let (Some(name), Some(expr)) =
                (elements.get(1).and_then(Ast::as_symbol), elements.get(2))
            {
                let id = go_ident(name);
                let rendered = self.emit_expr(expr, None);
                return format!("{id} := {rendered}; _ = {id}");
            }
        }
        let expr = self.emit_expr(form, None);
        if is_statement_expr(form) {
            expr
        } else {
            format!("_ = {expr}")
        }
    }

    /// `(if c t e?)` → immediately-invoked closure for expression position.
    fn emit_if(&mut self, args: &[Ast], hint: Option<&str>) -> String {
        let result = hint.unwrap_or("interface{}");
        let cond = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
        let then = args
            .get(1)
            .map_or_else(|| zero_value(result), |a| self.emit_expr(a, concrete_hint(result)));
        let otherwise = args
            .get(2)
            .map_or_else(|| zero_value(result), |a| self.emit_expr(a, concrete_hint(result)));
        format!("func() {result} {{ if {cond} {{ return {then} }}; return {otherwise} }}()")
    }

    /// `(do e₁ … eₙ)` in expression position.
    fn emit_do(&mut self, args: &[Ast], hint: Option<&str>) -> String {
        match args {
            [] => "nil".to_string(),
            [only] => self.emit_expr(only, hint),
            _ => {
                let result = hint.unwrap_or("interface{}");
                let mut parts = Vec::new();
                for (i, form) in args.iter().enumerate() {
                    if i + 1 == args.len() {
                        let expr = self.emit_expr(form, concrete_hint(result));
                        parts.push(format!("return {expr}"));
                    } else {
                        parts.push(self.emit_statement(form));
                    }
                }
                format!("func() {result} {{ {} }}()", parts.join("; "))
            }
        }
    }

    /// `(let [n v …] body…)` in expression position.
    fn emit_let(&mut self, args: &[Ast], hint: Option<&str>) -> String {
        let result = hint.unwrap_or("interface{}");
        let mut parts = Vec::new();

        if let Some(bindings) = args.first().and_then(Ast::as_array) {
            for pair in bindings.chunks_exact(2) {
                if let Some(name) = pair[0].as_symbol() {
                    let id = go_ident(name);
                    let value = self.emit_expr(&pair[1], None);
                    parts.push(format!("{id} := {value}"));
                }
            }
        }

        let body = &args[1..];
        for (i, form) in body.iter().enumerate() {
            if i + 1 == body.len() {
                let expr = self.emit_expr(form, concrete_hint(result));
                parts.push(format!("return {expr}"));
            } else {
                parts.push(self.emit_statement(form));
            }
        }
        if body.is_empty() {
            parts.push(format!("return {}", zero_value(result)));
        }
        format!("func() {result} {{ {} }}()", parts.join("; "))
    }

    /// `(map [k v …])` → Go map literal.
    fn emit_map(&mut self, args: &[Ast]) -> String {
        let Some(entries) = args.first().and_then(Ast::as_array) else {
            return "map[interface{}]interface{}{}".to_string();
        };
        let mut rendered = Vec::new();
        for pair in entries.chunks_exact(2) {
            let key = match pair[0].as_symbol() {
                Some(sym) if sym.ends_with(':') => go_string(sym.trim_end_matches(':')),
                _ => self.emit_expr(&pair[0], None),
            };
            let value = self.emit_expr(&pair[1], None);
            rendered.push(format!("{key}: {value}"));
        }
        format!("map[interface{{}}]interface{{}}{{{}}}", rendered.join(", "))
    }

    /// Left-folded binary operator chain.
    fn emit_binary(&mut self, op: &str, args: &[Ast]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.emit_operand(a)).collect();
        rendered.join(&format!(" {op} "))
    }

    /// Operand emission: nested operator forms keep their parentheses.
    fn emit_operand(&mut self, ast: &Ast) -> String {
        let needs_parens = matches!(
            ast.head_symbol(),
            Some("+" | "-" | "*" | "/" | ">" | "<" | ">=" | "<=" | "=" | "and" | "or")
        );
        let rendered = self.emit_expr(ast, None);
        if needs_parens {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn indexed(&mut self, args: &[Ast], suffix: &str) -> String {
        let xs = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
        format!("{xs}{suffix}")
    }

    /// `(.Method recv args…)` → `recv.Method(args…)`.
    fn emit_method_call(&mut self, method: &str, args: &[Ast]) -> String {
        let recv = args.first().map_or_else(String::new, |a| self.emit_expr(a, None));
        let rest: Vec<String> = args[1..].iter().map(|a| self.emit_expr(a, None)).collect();
        format!("{recv}.{method}({})", rest.join(", "))
    }

    /// Record constructor (positional struct literal) or accessor.
    fn emit_record_use(&mut self, name: &str, args: &[Ast]) -> String {
        let decl = self.records.get(name).cloned();
        let go_name = go_ident(name);

        match args {
            [Ast::Symbol(sym, _)] if sym.starts_with(':') => {
                format!("{go_name}{{}}.{}", go_field_name(&sym[1..]))
            }
            [fields @ Ast::Array(_, _)] => {
                let entries = fields.as_array().unwrap_or_default();
                let mut provided: HashMap<String, String> = HashMap::new();
                for pair in entries.chunks_exact(2) {
                    if let Some(raw) = pair[0].as_symbol() {
                        let field = raw.trim_end_matches(':').to_string();
                        let value = self.emit_expr(&pair[1], None);
                        provided.insert(field, value);
                    }
                }
                // Positional literal, declaration order
                let ordered: Vec<String> = decl
                    .map(|d| {
                        d.fields
                            .iter()
                            .filter_map(|(field, _)| provided.remove(field))
                            .collect()
                    })
                    .unwrap_or_default();
                format!("{go_name}{{{}}}", ordered.join(", "))
            }
            _ => format!("{go_name}{{}}"),
        }
    }
}

// -------------------------------------------------------------------------
// Free helpers
// -------------------------------------------------------------------------

/// Maps an internal type to Go syntax.
#[must_use]
pub fn go_type(ty: &Type) -> String {
    match ty {
        Type::Var(_) => "interface{}".to_string(),
        Type::Con(name) => go_type_name(name),
        Type::Fun(params, result) => {
            let rendered: Vec<String> = params.iter().map(go_type).collect();
            format!("func({}) {}", rendered.join(", "), go_type(result))
        }
        Type::Arr(elem) => format!("[]{}", go_type(elem)),
        Type::Map(key, value) => format!("map[{}]{}", go_type(key), go_type(value)),
    }
}

fn go_type_name(name: &str) -> String {
    match name {
        "int" | "string" | "bool" => name.to_string(),
        "float" | "number" => "float64".to_string(),
        "any" => "interface{}".to_string(),
        other => go_ident(other),
    }
}

/// Maps a source-level type annotation to Go syntax.
fn annotation_type(ast: &Ast) -> String {
    match ast {
        Ast::Symbol(name, _) => match name.as_str() {
            "int" | "string" | "bool" => name.clone(),
            "float" | "number" => "float64".to_string(),
            "any" => "interface{}".to_string(),
            other if other.starts_with(|c: char| c.is_ascii_uppercase()) => go_ident(other),
            _ => "interface{}".to_string(),
        },
        Ast::Array(elements, _) if elements.len() == 1 => {
            format!("[]{}", annotation_type(&elements[0]))
        }
        _ => "interface{}".to_string(),
    }
}

fn closure_return_type(elements: &[Ast]) -> String {
    elements
        .get(3)
        .map_or_else(|| "interface{}".to_string(), annotation_type)
}

/// A hint is only worth threading when it names a concrete type.
fn concrete_hint(ret: &str) -> Option<&str> {
    if ret == "interface{}" { None } else { Some(ret) }
}

/// The Go zero value for a rendered type.
fn zero_value(go_ty: &str) -> String {
    match go_ty {
        "int" | "float64" => "0".to_string(),
        "string" => "\"\"".to_string(),
        "bool" => "false".to_string(),
        _ => "nil".to_string(),
    }
}

/// Forms that are valid Go statements on their own (calls).
fn is_statement_expr(ast: &Ast) -> bool {
    let Some(head) = ast.head_symbol() else {
        return ast.as_list().is_some_and(|l| !l.is_empty());
    };
    if matches!(
        head,
        "+" | "-" | "*" | "/" | ">" | "<" | ">=" | "<=" | "=" | "and" | "or" | "not" | "if"
            | "do" | "let" | "map" | "fn" | "first" | "rest" | "cons" | "count" | "len"
            | "empty?" | "get" | "slice" | "append"
    ) {
        return false;
    }
    // Accessors are not statements
    !(ast.as_list().is_some_and(|l| {
        l.len() == 2 && l[1].as_symbol().is_some_and(|s| s.starts_with(':'))
    }))
}

/// Renders a float so Go reads it as a float literal.
fn float_literal(n: f64) -> String {
    let s = n.to_string();
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Renders a Go string literal with escapes.
fn go_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
