//! The semantic analyzer.
//!
//! Walks expanded top-level forms, maintaining a symbol table, a typing
//! environment, and the accumulated global substitution. Produces coded
//! diagnostics and a scheme for every top-level definition.
//!
//! Special forms are dispatched on the head symbol; any other list is an
//! application. Analysis keeps going past a bad form so one run reports
//! as much as possible.

use std::collections::{BTreeSet, HashMap};

use vex_foundation::{
    Diagnostic, DiagnosticCode, DiagnosticSink, Scheme, Type, Value, VxMap,
};
use vex_language::pretty::pretty_print;
use vex_language::{Ast, Span};

use crate::builtins::seed_builtins;
use crate::infer::{Subst, VarGen, generalize, instantiate, numeric_join, unify};
use crate::record::{RecordDecl, RecordTable};
use crate::symbol::{SymbolTable, is_kebab_case, kebab_case_suggestion};

/// Analysis depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Full analysis: every check, every diagnostic.
    Full,
    /// Signature extraction for the resolver: sibling-package calls are
    /// not enforced, since package info is not loaded yet.
    Signature,
}

/// Cross-package information supplied by the resolver.
#[derive(Clone, Debug, Default)]
pub struct PackageContext {
    /// Local package name → exported symbol names.
    pub exports: HashMap<String, BTreeSet<String>>,
    /// Local package name → per-symbol type schemes.
    pub schemes: HashMap<String, HashMap<String, Scheme>>,
}

impl PackageContext {
    /// Returns true if the name refers to a known local Vex package.
    #[must_use]
    pub fn is_local(&self, package: &str) -> bool {
        self.exports.contains_key(package)
    }
}

/// The result of analyzing one compilation unit.
#[derive(Debug)]
pub struct AnalysisResult {
    /// Accumulated diagnostics.
    pub sink: DiagnosticSink,
    /// Scheme for every top-level definition, substitution applied.
    pub schemes: HashMap<String, Scheme>,
    /// Declared records.
    pub records: RecordTable,
    /// Symbols named in `(export [...])` forms.
    pub exports: BTreeSet<String>,
}

impl AnalysisResult {
    /// Returns true if analysis produced at least one error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.sink.has_errors()
    }
}

/// The semantic analyzer for one compilation unit.
pub struct Analyzer {
    mode: Mode,
    file: String,
    symbols: SymbolTable,
    env: VxMap<String, Scheme>,
    records: RecordTable,
    subst: Subst,
    vars: VarGen,
    sink: DiagnosticSink,
    packages: PackageContext,
    exports: BTreeSet<String>,
    host_imports: BTreeSet<String>,
    top_schemes: HashMap<String, Scheme>,
}

impl Analyzer {
    /// Creates a full-mode analyzer for the given file name.
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self::with_mode(file, Mode::Full)
    }

    /// Creates an analyzer in the given mode.
    #[must_use]
    pub fn with_mode(file: impl Into<String>, mode: Mode) -> Self {
        let mut env = VxMap::new();
        seed_builtins(&mut env);
        Self {
            mode,
            file: file.into(),
            symbols: SymbolTable::new(),
            env,
            records: RecordTable::new(),
            subst: Subst::new(),
            vars: VarGen::new(),
            sink: DiagnosticSink::new(),
            packages: PackageContext::default(),
            exports: BTreeSet::new(),
            host_imports: BTreeSet::new(),
            top_schemes: HashMap::new(),
        }
    }

    /// Supplies cross-package exports and schemes from the resolver.
    #[must_use]
    pub fn with_packages(mut self, packages: PackageContext) -> Self {
        self.packages = packages;
        self
    }

    /// Analyzes a sequence of expanded top-level forms.
    pub fn analyze(mut self, forms: &[Ast]) -> AnalysisResult {
        for form in forms {
            self.infer_expr(form);
        }

        let schemes = self
            .top_schemes
            .iter()
            .map(|(name, scheme)| (name.clone(), self.subst.apply_scheme(scheme)))
            .collect();

        AnalysisResult {
            sink: self.sink,
            schemes,
            records: self.records,
            exports: self.exports,
        }
    }

    // ---------------------------------------------------------------------
    // Expression inference
    // ---------------------------------------------------------------------

    /// Infers the type of an expression, reporting diagnostics as it goes.
    ///
    /// Always returns a type so analysis can continue; error recovery
    /// yields a fresh variable or the opaque type.
    fn infer_expr(&mut self, ast: &Ast) -> Type {
        match ast {
            Ast::Bool(_, _) => Type::boolean(),
            Ast::Int(_, _) => Type::int(),
            Ast::Float(_, _) => Type::float(),
            Ast::Str(_, _) => Type::string(),
            Ast::Symbol(name, span) => self.infer_symbol(name, *span),
            Ast::Array(elements, span) => self.infer_array(elements, *span),
            Ast::List(elements, span) => self.infer_list(elements, *span),
            Ast::Splice(_, span) => {
                self.error(
                    DiagnosticCode::MacTemplate,
                    *span,
                    "splice form outside a macro template",
                );
                Type::opaque()
            }
        }
    }

    fn infer_symbol(&mut self, name: &str, span: Span) -> Type {
        if name.contains('/') {
            // Qualified references type like their call counterparts
            return self.infer_qualified(name, span);
        }
        if let Some(scheme) = self.env.get(name).cloned() {
            return instantiate(&scheme, &mut self.vars);
        }
        if self.host_imports.contains(name) {
            // Bare reference to a host-language package
            return Type::opaque();
        }
        self.error(
            DiagnosticCode::TypUndef,
            span,
            format!("undefined identifier '{name}'"),
        );
        self.vars.fresh()
    }

    /// `(import "path")` or `(import ["p1" "p2" …])`: record the imported
    /// names so bare references to host packages type as opaque.
    fn collect_imports(&mut self, args: &[Ast]) -> Type {
        for arg in args {
            match arg {
                Ast::Str(path, _) => {
                    self.record_import(path);
                }
                Ast::Array(entries, _) => {
                    for entry in entries {
                        if let Some(path) = entry.as_str() {
                            self.record_import(path);
                        }
                    }
                }
                _ => {}
            }
        }
        Type::opaque()
    }

    fn record_import(&mut self, path: &str) {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.host_imports.insert(name.to_string());
    }

    fn infer_array(&mut self, elements: &[Ast], _span: Span) -> Type {
        let elem_ty = self.vars.fresh();
        for elem in elements {
            let ty = self.infer_expr(elem);
            self.unify_at(&elem_ty, &ty, elem.span(), DiagnosticCode::TypArrayElem, |e, a| {
                format!("array element: expected {e}, got {a}")
            });
        }
        Type::arr(self.subst.apply(&elem_ty))
    }

    fn infer_list(&mut self, elements: &[Ast], span: Span) -> Type {
        let Some(head) = elements.first() else {
            return Type::opaque();
        };

        if let Some(name) = head.as_symbol() {
            match name {
                "def" => return self.infer_def(elements, span),
                "fn" => return self.infer_fn(elements, span),
                "if" => return self.infer_if(elements, span),
                "do" => return self.infer_do(&elements[1..]),
                "let" => return self.infer_let(elements, span),
                "record" => return self.declare_record(elements, span),
                "export" => return self.collect_exports(elements, span),
                "import" => return self.collect_imports(&elements[1..]),
                "macro" => return self.register_macro_value(elements),
                "map" => return self.infer_map(elements, span),
                "+" | "-" | "*" | "/" => {
                    return self.infer_arithmetic(name, &elements[1..], span);
                }
                _ => {}
            }

            if self.records.is_record(name) {
                return self.infer_record_use(name, &elements[1..], span);
            }
            if let Some(method) = name.strip_prefix('.') {
                return self.infer_method_call(method, &elements[1..], span);
            }
            if name.contains('/') {
                return self.infer_package_call(name, &elements[1..], span);
            }
            // Instance field access: `(u :field)` on a record-typed symbol
            if elements.len() == 2 {
                if let Some(field) = elements[1].as_symbol().and_then(|s| s.strip_prefix(':')) {
                    if let Some(ty) = self.instance_accessor(name, field, elements[1].span()) {
                        return ty;
                    }
                }
            }
            return self.infer_application(name, head.span(), &elements[1..]);
        }

        // Head is itself an expression: infer and apply
        let callee_ty = self.infer_expr(head);
        self.apply_function(&callee_ty, "<expr>", &elements[1..], span)
    }

    // ---------------------------------------------------------------------
    // Special forms
    // ---------------------------------------------------------------------

    /// `(def name expr)` with generalization under the value restriction.
    fn infer_def(&mut self, elements: &[Ast], span: Span) -> Type {
        if elements.len() != 3 {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                format!("def expects a name and a value, got {} form(s)", elements.len() - 1),
            );
            return Type::opaque();
        }

        let Some(name) = elements[1].as_symbol().map(str::to_string) else {
            self.error(
                DiagnosticCode::SymNaming,
                elements[1].span(),
                format!("def name must be a symbol, got {}", elements[1].type_name()),
            );
            return Type::opaque();
        };

        self.check_symbol_name(&name, elements[1].span());

        let expr = &elements[2];

        // Pre-bind function definitions so recursive bodies resolve
        let placeholder = if expr.head_symbol() == Some("fn") {
            let var = self.vars.fresh();
            self.env.insert(name.clone(), Scheme::mono(var.clone()));
            Some(var)
        } else {
            None
        };

        let ty = self.infer_expr(expr);
        if let Some(var) = &placeholder {
            self.unify_at(var, &ty, expr.span(), DiagnosticCode::TypEq, |e, a| {
                format!("recursive definition: expected {e}, got {a}")
            });
            // Drop the placeholder before generalizing so its variables
            // are not pinned by the environment
            self.env.remove(&name);
        }
        let resolved = self.subst.apply(&ty);

        // Value restriction: only syntactic values generalize
        let scheme = if self.is_syntactic_value(expr) {
            let env_free = self.env_free_vars();
            generalize(&env_free, &resolved)
        } else {
            Scheme::mono(resolved.clone())
        };

        if self.symbols.lookup_current(&name).is_some() {
            self.error(
                DiagnosticCode::SymRedef,
                elements[1].span(),
                format!("'{name}' is already defined in this scope"),
            );
        } else {
            self.symbols
                .define(name.clone(), resolved, Self::value_of(&name, expr));
        }

        self.env.insert(name.clone(), scheme.clone());
        if self.symbols.depth() == 0 {
            self.top_schemes.insert(name, scheme);
        }

        ty
    }

    /// `(fn [p: T …] -> R body…)` with mandatory annotations.
    fn infer_fn(&mut self, elements: &[Ast], span: Span) -> Type {
        if elements.len() < 5 {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                "fn expects a parameter array, '->', a return type, and a body",
            );
            return Type::opaque();
        }

        let mut annot_vars: HashMap<String, u32> = HashMap::new();

        if elements[2].as_symbol() != Some("->") {
            self.error(
                DiagnosticCode::TypArg,
                elements[2].span(),
                "fn requires a '->' return type annotation",
            );
        }
        let ret_ty = self.parse_type(&elements[3], &mut annot_vars);

        let saved_env = self.env.clone();
        self.symbols.enter_scope();

        let param_tys = self.bind_params(&elements[1], &mut annot_vars);

        let mut body_ty = Type::opaque();
        for form in &elements[4..] {
            body_ty = self.infer_expr(form);
        }
        let last_span = elements.last().map_or(span, Ast::span);
        self.unify_at(&ret_ty, &body_ty, last_span, DiagnosticCode::TypEq, |e, a| {
            format!("function body: expected {e}, got {a}")
        });

        self.symbols.exit_scope();
        self.env = saved_env;

        self.subst.apply(&Type::fun(param_tys, ret_ty))
    }

    /// Binds `[name: type …]` parameters into the new scope.
    fn bind_params(&mut self, params: &Ast, annot_vars: &mut HashMap<String, u32>) -> Vec<Type> {
        let Some(elements) = params.as_array() else {
            self.error(
                DiagnosticCode::TypArg,
                params.span(),
                format!("fn parameters must be an array, got {}", params.type_name()),
            );
            return Vec::new();
        };

        let mut tys = Vec::new();
        let mut index = 0;
        while index < elements.len() {
            let name_node = &elements[index];
            let Some(raw) = name_node.as_symbol() else {
                self.error(
                    DiagnosticCode::TypArg,
                    name_node.span(),
                    format!("parameter name must be a symbol, got {}", name_node.type_name()),
                );
                index += 1;
                continue;
            };

            let Some(name) = raw.strip_suffix(':') else {
                self.error(
                    DiagnosticCode::TypArg,
                    name_node.span(),
                    format!("parameter '{raw}' needs a type annotation ('{raw}: type')"),
                );
                index += 1;
                continue;
            };

            self.check_symbol_name(name, name_node.span());

            let ty = if index + 1 < elements.len() {
                let ty = self.parse_type(&elements[index + 1], annot_vars);
                index += 2;
                ty
            } else {
                self.error(
                    DiagnosticCode::TypArg,
                    name_node.span(),
                    format!("parameter '{name}' is missing its type"),
                );
                index += 1;
                self.vars.fresh()
            };

            self.env.insert(name.to_string(), Scheme::mono(ty.clone()));
            self.symbols
                .define(name, ty.clone(), Value::raw(name.to_string()));
            tys.push(ty);
        }
        tys
    }

    /// `(if c t e?)`: condition unifies with bool, branches with each other.
    fn infer_if(&mut self, elements: &[Ast], span: Span) -> Type {
        if elements.len() < 3 || elements.len() > 4 {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                "if expects a condition, a then-branch, and an optional else-branch",
            );
            return Type::opaque();
        }

        let cond_ty = self.infer_expr(&elements[1]);
        self.unify_at(
            &Type::boolean(),
            &cond_ty,
            elements[1].span(),
            DiagnosticCode::TypCond,
            |_, a| format!("if condition must be bool, got {a}"),
        );

        let then_ty = self.infer_expr(&elements[2]);
        let Some(else_form) = elements.get(3) else {
            // No else branch: result is the then-type
            return self.subst.apply(&then_ty);
        };

        let else_ty = self.infer_expr(else_form);
        let then_res = self.subst.apply(&then_ty);
        let else_res = self.subst.apply(&else_ty);

        match unify(&then_res, &else_res) {
            Ok(delta) => {
                self.subst.compose(delta);
                let a = self.subst.apply(&then_res);
                let b = self.subst.apply(&else_res);
                if a.is_numeric() && b.is_numeric() {
                    numeric_join(&a, &b)
                } else {
                    a
                }
            }
            Err(_) => {
                let both_records = self.is_declared_record(&then_res) && self.is_declared_record(&else_res);
                let code = if both_records {
                    DiagnosticCode::RecNominal
                } else {
                    DiagnosticCode::TypIfMismatch
                };
                let message = if both_records {
                    format!(
                        "records are nominal: branch types {then_res} and {else_res} do not unify"
                    )
                } else {
                    format!(
                        "Expected: type(then) == type(else); Got: then={}, else={}",
                        self.render_public(&then_res),
                        self.render_public(&else_res)
                    )
                };
                self.error(code, span, message);
                self.subst.apply(&then_res)
            }
        }
    }

    /// `(do e₁ … eₙ)`: result is the last expression's type.
    fn infer_do(&mut self, forms: &[Ast]) -> Type {
        let mut ty = Type::opaque();
        for form in forms {
            ty = self.infer_expr(form);
        }
        ty
    }

    /// `(let [name expr …] body…)` with monomorphic bindings.
    fn infer_let(&mut self, elements: &[Ast], span: Span) -> Type {
        if elements.len() < 3 {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                "let expects a binding array and a body",
            );
            return Type::opaque();
        }
        let Some(bindings) = elements[1].as_array() else {
            self.error(
                DiagnosticCode::AriArgs,
                elements[1].span(),
                format!("let bindings must be an array, got {}", elements[1].type_name()),
            );
            return Type::opaque();
        };
        if bindings.len() % 2 != 0 {
            self.error(
                DiagnosticCode::AriArgs,
                elements[1].span(),
                "let bindings must come in name/value pairs",
            );
        }

        let saved_env = self.env.clone();
        self.symbols.enter_scope();

        for pair in bindings.chunks_exact(2) {
            let Some(name) = pair[0].as_symbol() else {
                self.error(
                    DiagnosticCode::SymNaming,
                    pair[0].span(),
                    format!("let binding name must be a symbol, got {}", pair[0].type_name()),
                );
                continue;
            };
            self.check_symbol_name(name, pair[0].span());
            let ty = self.infer_expr(&pair[1]);
            let resolved = self.subst.apply(&ty);
            self.env.insert(name.to_string(), Scheme::mono(resolved.clone()));
            self.symbols
                .define(name, resolved, Self::value_of(name, &pair[1]));
        }

        let mut body_ty = Type::opaque();
        for form in &elements[2..] {
            body_ty = self.infer_expr(form);
        }

        self.symbols.exit_scope();
        self.env = saved_env;
        body_ty
    }

    /// `(record Name [f: T …])` declares a nominal record.
    fn declare_record(&mut self, elements: &[Ast], span: Span) -> Type {
        if elements.len() != 3 {
            self.error(
                DiagnosticCode::RecDecl,
                span,
                "record expects a name and a field array",
            );
            return Type::opaque();
        }
        let Some(name) = elements[1].as_symbol() else {
            self.error(
                DiagnosticCode::RecDecl,
                elements[1].span(),
                format!("record name must be a symbol, got {}", elements[1].type_name()),
            );
            return Type::opaque();
        };
        let Some(fields) = elements[2].as_array() else {
            self.error(
                DiagnosticCode::RecDecl,
                elements[2].span(),
                format!("record fields must be an array, got {}", elements[2].type_name()),
            );
            return Type::opaque();
        };

        let mut decl = RecordDecl::new(name, span);
        let mut index = 0;
        while index < fields.len() {
            let field_node = &fields[index];
            let Some(raw) = field_node.as_symbol() else {
                self.error(
                    DiagnosticCode::RecDecl,
                    field_node.span(),
                    format!("record field must be a symbol, got {}", field_node.type_name()),
                );
                index += 1;
                continue;
            };
            let Some(field) = raw.strip_suffix(':') else {
                self.error(
                    DiagnosticCode::RecDecl,
                    field_node.span(),
                    format!("record field '{raw}' needs a type ('{raw}: type')"),
                );
                index += 1;
                continue;
            };

            if !is_kebab_case(field) {
                self.error(
                    DiagnosticCode::SymNaming,
                    field_node.span(),
                    format!("record field '{field}' must be kebab-case"),
                );
            }

            let ty = if index + 1 < fields.len() {
                let ty = self.parse_field_type(&fields[index + 1]);
                index += 2;
                ty
            } else {
                self.error(
                    DiagnosticCode::RecDecl,
                    field_node.span(),
                    format!("record field '{field}' is missing its type"),
                );
                index += 1;
                Type::opaque()
            };

            if !decl.add_field(field, ty) {
                self.error(
                    DiagnosticCode::RecDupField,
                    field_node.span(),
                    format!("duplicate record field '{field}'"),
                );
            }
        }

        if !self.records.declare(decl) {
            self.error(
                DiagnosticCode::SymRedef,
                span,
                format!("record '{name}' is already declared"),
            );
        }
        Type::opaque()
    }

    /// `(export [sym …])`: records exports; no runtime effect.
    fn collect_exports(&mut self, elements: &[Ast], span: Span) -> Type {
        let Some(entries) = elements.get(1).and_then(Ast::as_array) else {
            self.error(DiagnosticCode::SynParse, span, "export expects a symbol array");
            return Type::opaque();
        };
        for entry in entries {
            if let Some(name) = entry.as_symbol() {
                self.exports.insert(name.to_string());
            } else {
                self.error(
                    DiagnosticCode::SynParse,
                    entry.span(),
                    format!("export entries must be symbols, got {}", entry.type_name()),
                );
            }
        }
        Type::opaque()
    }

    /// `(macro …)` reaching the analyzer just records the binding.
    fn register_macro_value(&mut self, elements: &[Ast]) -> Type {
        if let Some(name) = elements.get(1).and_then(Ast::as_symbol) {
            self.symbols
                .define(name, Type::opaque(), Value::macro_ref(name));
        }
        Type::opaque()
    }

    /// `(map [k v k v …])` with keys and values unified separately.
    fn infer_map(&mut self, elements: &[Ast], span: Span) -> Type {
        let Some(entries) = elements.get(1).and_then(Ast::as_array) else {
            self.error(DiagnosticCode::AriArgs, span, "map expects an entry array");
            return Type::map(self.vars.fresh(), self.vars.fresh());
        };
        if entries.len() % 2 != 0 {
            self.error(
                DiagnosticCode::AriArgs,
                elements[1].span(),
                "map entries must come in key/value pairs",
            );
        }

        let key_ty = self.vars.fresh();
        let val_ty = self.vars.fresh();

        for pair in entries.chunks_exact(2) {
            let kt = self.infer_map_key(&pair[0]);
            self.unify_at(&key_ty, &kt, pair[0].span(), DiagnosticCode::TypMapKey, |e, a| {
                format!("map key: expected {e}, got {a}")
            });

            let vt = self.infer_expr(&pair[1]);
            self.unify_at(&val_ty, &vt, pair[1].span(), DiagnosticCode::TypMapVal, |e, a| {
                format!("map value: expected {e}, got {a}")
            });
        }

        Type::map(self.subst.apply(&key_ty), self.subst.apply(&val_ty))
    }

    /// Map keys written `name:` are string keys; anything else is an
    /// ordinary expression.
    fn infer_map_key(&mut self, key: &Ast) -> Type {
        if let Some(sym) = key.as_symbol() {
            if sym.ends_with(':') {
                return Type::string();
            }
        }
        self.infer_expr(key)
    }

    // ---------------------------------------------------------------------
    // Applications
    // ---------------------------------------------------------------------

    /// Variadic-folded arithmetic over the numeric family.
    fn infer_arithmetic(&mut self, op: &str, args: &[Ast], span: Span) -> Type {
        let min_args = if op == "+" { 1 } else { 2 };
        if args.len() < min_args {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                format!("'{op}' expects at least {min_args} operand(s), got {}", args.len()),
            );
            return Type::number();
        }

        let mut saw_float = false;
        let mut all_int = true;
        for arg in args {
            let ty = self.infer_expr(arg);
            let ok = self.unify_at(&Type::number(), &ty, arg.span(), DiagnosticCode::TypArg, |_, a| {
                format!("operand to '{op}': expected number, got {a}")
            });
            if ok {
                match self.subst.apply(&ty) {
                    t if t == Type::float() => {
                        saw_float = true;
                        all_int = false;
                    }
                    t if t == Type::int() => {}
                    _ => all_int = false,
                }
            } else {
                all_int = false;
            }
        }

        // Any float operand promotes the result to float, else int
        if saw_float {
            Type::float()
        } else if all_int {
            Type::int()
        } else {
            Type::number()
        }
    }

    /// Record constructor `(Name [f: v …])` or accessor `(Name :f)`.
    fn infer_record_use(&mut self, name: &str, args: &[Ast], span: Span) -> Type {
        let decl = self
            .records
            .get(name)
            .cloned()
            .expect("caller checked is_record");

        match args {
            [Ast::Symbol(sym, field_span)] if sym.starts_with(':') => {
                let field = &sym[1..];
                match decl.field_type(field) {
                    Some(ty) => ty.clone(),
                    None => {
                        self.error(
                            DiagnosticCode::RecUnknownField,
                            *field_span,
                            format!("record '{name}' has no field '{field}'"),
                        );
                        Type::opaque()
                    }
                }
            }
            [fields @ Ast::Array(_, _)] => self.check_constructor(&decl, fields),
            _ => {
                self.error(
                    DiagnosticCode::RecDecl,
                    span,
                    format!("'{name}' expects a field array or a ':field' accessor"),
                );
                Type::con(name)
            }
        }
    }

    /// Checks constructor fields against the declaration.
    fn check_constructor(&mut self, decl: &RecordDecl, fields: &Ast) -> Type {
        let entries = fields.as_array().unwrap_or_default();
        let mut provided: Vec<String> = Vec::new();

        let mut index = 0;
        while index < entries.len() {
            let Some(raw) = entries[index].as_symbol() else {
                self.error(
                    DiagnosticCode::RecDecl,
                    entries[index].span(),
                    format!(
                        "constructor field must be 'name: value', got {}",
                        entries[index].type_name()
                    ),
                );
                index += 1;
                continue;
            };
            let Some(field) = raw.strip_suffix(':') else {
                self.error(
                    DiagnosticCode::RecDecl,
                    entries[index].span(),
                    format!("constructor field '{raw}' must end with ':'"),
                );
                index += 1;
                continue;
            };

            if provided.iter().any(|f| f == field) {
                self.error(
                    DiagnosticCode::RecDupField,
                    entries[index].span(),
                    format!("field '{field}' given more than once"),
                );
            }
            provided.push(field.to_string());

            let Some(value) = entries.get(index + 1) else {
                self.error(
                    DiagnosticCode::RecDecl,
                    entries[index].span(),
                    format!("field '{field}' is missing its value"),
                );
                break;
            };
            index += 2;

            let Some(expected) = decl.field_type(field).cloned() else {
                self.error(
                    DiagnosticCode::RecUnknownField,
                    entries[index - 2].span(),
                    format!("record '{}' has no field '{field}'", decl.name),
                );
                self.infer_expr(value);
                continue;
            };

            let actual = self.infer_expr(value);
            self.unify_at(&expected, &actual, value.span(), DiagnosticCode::TypEq, |e, a| {
                format!("field '{field}': expected {e}, got {a}")
            });
        }

        for (field, _) in &decl.fields {
            if !provided.iter().any(|f| f == field) {
                self.error(
                    DiagnosticCode::RecMissingField,
                    fields.span(),
                    format!("missing field '{field}' in '{}' constructor", decl.name),
                );
            }
        }

        decl.instance_type()
    }

    /// Field access on a record-typed symbol. Returns None when the head
    /// is not record-typed, so the caller falls through to application.
    fn instance_accessor(&mut self, name: &str, field: &str, field_span: Span) -> Option<Type> {
        let scheme = self.env.get(name)?.clone();
        let ty = self.subst.apply(&scheme.ty);
        let Type::Con(record) = &ty else {
            return None;
        };
        let decl = self.records.get(record)?.clone();
        match decl.field_type(field) {
            Some(field_ty) => Some(field_ty.clone()),
            None => {
                self.error(
                    DiagnosticCode::RecUnknownField,
                    field_span,
                    format!("record '{record}' has no field '{field}'"),
                );
                Some(Type::opaque())
            }
        }
    }

    /// Host-language method call `(.Method recv args…)`.
    fn infer_method_call(&mut self, method: &str, args: &[Ast], span: Span) -> Type {
        if args.is_empty() {
            self.error(
                DiagnosticCode::AriArgs,
                span,
                format!("method call '.{method}' needs a receiver"),
            );
            return Type::opaque();
        }
        for arg in args {
            self.infer_expr(arg);
        }
        Type::opaque()
    }

    /// Cross-package call `(pkg/func args…)`.
    fn infer_package_call(&mut self, head: &str, args: &[Ast], span: Span) -> Type {
        let (package, func) = head.split_once('/').expect("caller checked '/'");

        if self.mode == Mode::Full && self.packages.is_local(package) {
            let exported = self.packages.exports[package].contains(func);
            if !exported {
                self.error_with_suggestion(
                    DiagnosticCode::PkgNotExported,
                    span,
                    format!("'{func}' is not exported by package '{package}'"),
                    format!("add '{func}' to the (export [...]) list in package '{package}'"),
                );
            }
            if let Some(scheme) = self
                .packages
                .schemes
                .get(package)
                .and_then(|m| m.get(func))
                .cloned()
            {
                let fn_ty = instantiate(&scheme, &mut self.vars);
                return self.apply_function(&fn_ty, head, args, span);
            }
        }

        // External host import (or signature mode): opaque result
        for arg in args {
            self.infer_expr(arg);
        }
        Type::opaque()
    }

    /// Qualified symbol in value position.
    fn infer_qualified(&mut self, name: &str, span: Span) -> Type {
        let (package, sym) = name.split_once('/').expect("caller checked '/'");
        if self.mode == Mode::Full && self.packages.is_local(package) {
            if !self.packages.exports[package].contains(sym) {
                self.error_with_suggestion(
                    DiagnosticCode::PkgNotExported,
                    span,
                    format!("'{sym}' is not exported by package '{package}'"),
                    format!("add '{sym}' to the (export [...]) list in package '{package}'"),
                );
            }
            if let Some(scheme) = self.packages.schemes.get(package).and_then(|m| m.get(sym)) {
                let scheme = scheme.clone();
                return instantiate(&scheme, &mut self.vars);
            }
        }
        Type::opaque()
    }

    /// Application of a named local symbol.
    fn infer_application(&mut self, head: &str, head_span: Span, args: &[Ast]) -> Type {
        let Some(scheme) = self.env.get(head).cloned() else {
            self.error(
                DiagnosticCode::TypUndef,
                head_span,
                format!("undefined identifier '{head}'"),
            );
            for arg in args {
                self.infer_expr(arg);
            }
            return self.vars.fresh();
        };

        let fn_ty = instantiate(&scheme, &mut self.vars);
        self.apply_function(&fn_ty, head, args, head_span)
    }

    /// Unifies arguments against a function type and returns the result.
    fn apply_function(&mut self, fn_ty: &Type, head: &str, args: &[Ast], span: Span) -> Type {
        let resolved = self.subst.apply(fn_ty);
        match resolved {
            Type::Fun(params, result) => {
                if params.len() != args.len() {
                    self.error(
                        DiagnosticCode::AriArgs,
                        span,
                        format!(
                            "'{head}' expects {} argument(s), got {}",
                            params.len(),
                            args.len()
                        ),
                    );
                    return self.subst.apply(&result);
                }

                // Equality failures get their own code
                let code = if head == "=" {
                    DiagnosticCode::TypEq
                } else {
                    DiagnosticCode::TypArg
                };

                for (param, arg) in params.iter().zip(args) {
                    let arg_ty = self.infer_expr(arg);
                    self.unify_at(param, &arg_ty, arg.span(), code, |e, a| {
                        format!("argument to '{head}': expected {e}, got {a}")
                    });
                }
                self.subst.apply(&result)
            }
            Type::Var(_) => {
                // Unknown callee type: constrain it to a function
                let arg_tys: Vec<Type> = args.iter().map(|a| self.infer_expr(a)).collect();
                let ret = self.vars.fresh();
                let wanted = Type::Fun(arg_tys, Box::new(ret.clone()));
                self.unify_at(&resolved, &wanted, span, DiagnosticCode::TypArg, |e, a| {
                    format!("'{head}': expected {e}, got {a}")
                });
                self.subst.apply(&ret)
            }
            Type::Con(ref name) if name == vex_foundation::types::OPAQUE => {
                for arg in args {
                    self.infer_expr(arg);
                }
                Type::opaque()
            }
            other => {
                self.error(
                    DiagnosticCode::TypArg,
                    span,
                    format!("'{head}' is not callable (type {other})"),
                );
                for arg in args {
                    self.infer_expr(arg);
                }
                self.vars.fresh()
            }
        }
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Parses a type annotation. Unknown lowercase names become
    /// annotation variables scoped to the enclosing `fn`.
    fn parse_type(&mut self, ast: &Ast, annot_vars: &mut HashMap<String, u32>) -> Type {
        match ast {
            Ast::Symbol(name, _) => match name.as_str() {
                "int" | "float" | "number" | "string" | "bool" | "any" => Type::con(name.clone()),
                _ if self.records.is_record(name) => Type::con(name.clone()),
                _ if name.starts_with(|c: char| c.is_ascii_uppercase()) => Type::con(name.clone()),
                _ => {
                    let id = *annot_vars
                        .entry(name.clone())
                        .or_insert_with(|| self.vars.fresh_id());
                    Type::Var(id)
                }
            },
            // [T] is an array annotation
            Ast::Array(elements, span) => {
                if elements.len() == 1 {
                    Type::arr(self.parse_type(&elements[0], annot_vars))
                } else {
                    self.error(
                        DiagnosticCode::TypArg,
                        *span,
                        "array type annotation takes exactly one element type",
                    );
                    Type::arr(self.vars.fresh())
                }
            }
            other => {
                self.error(
                    DiagnosticCode::TypArg,
                    other.span(),
                    format!("invalid type annotation: {}", other.type_name()),
                );
                self.vars.fresh()
            }
        }
    }

    /// Parses a record field type: named types only.
    fn parse_field_type(&mut self, ast: &Ast) -> Type {
        match ast {
            Ast::Symbol(name, _) => Type::con(name.clone()),
            Ast::Array(elements, _) if elements.len() == 1 => {
                Type::arr(self.parse_field_type(&elements[0]))
            }
            other => {
                self.error(
                    DiagnosticCode::RecDecl,
                    other.span(),
                    format!("invalid field type: {}", other.type_name()),
                );
                Type::opaque()
            }
        }
    }

    /// Unifies, composing on success and reporting on failure.
    ///
    /// Returns true if unification succeeded.
    fn unify_at(
        &mut self,
        expected: &Type,
        actual: &Type,
        span: Span,
        code: DiagnosticCode,
        message: impl Fn(&str, &str) -> String,
    ) -> bool {
        let left = self.subst.apply(expected);
        let right = self.subst.apply(actual);
        match unify(&left, &right) {
            Ok(delta) => {
                self.subst.compose(delta);
                true
            }
            Err(_) => {
                let rendered = message(&self.render_public(&left), &self.render_public(&right));
                self.error(code, span, rendered);
                false
            }
        }
    }

    /// Renders a type in the public projection used by diagnostics:
    /// numeric family members all render as `number`.
    fn render_public(&self, ty: &Type) -> String {
        let resolved = self.subst.apply(ty);
        if resolved.is_numeric() {
            "number".to_string()
        } else {
            resolved.to_string()
        }
    }

    /// Free variables of the typing environment under the current
    /// substitution.
    fn env_free_vars(&self) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        for scheme in self.env.values() {
            out.extend(self.subst.apply_scheme(scheme).free_vars());
        }
        out
    }

    /// The value restriction: literals, `fn` forms, record constructors,
    /// and collection constructors are syntactic values.
    fn is_syntactic_value(&self, ast: &Ast) -> bool {
        match ast {
            Ast::Bool(_, _) | Ast::Int(_, _) | Ast::Float(_, _) | Ast::Str(_, _) => true,
            Ast::Array(_, _) => true,
            Ast::List(_, _) => match ast.head_symbol() {
                Some("fn" | "map") => true,
                Some(head) => self.records.is_record(head),
                None => false,
            },
            _ => false,
        }
    }

    /// Summarizes an expression as a semantic value for the symbol table.
    fn value_of(name: &str, expr: &Ast) -> Value {
        match expr {
            Ast::Bool(b, _) => Value::Bool(*b),
            Ast::Int(n, _) => Value::Int(*n),
            Ast::Float(n, _) => Value::Float(*n),
            Ast::Str(s, _) => Value::string(s.clone()),
            Ast::List(elements, _) if expr.head_symbol() == Some("fn") => {
                let arity = elements
                    .get(1)
                    .and_then(Ast::as_array)
                    .map_or(0, |params| params.len() / 2);
                Value::function(name, arity)
            }
            other => Value::raw(pretty_print(other)),
        }
    }

    /// Checks the kebab-case rule, with a suggestion when violated.
    fn check_symbol_name(&mut self, name: &str, span: Span) {
        if !is_kebab_case(name) {
            self.error_with_suggestion(
                DiagnosticCode::SymNaming,
                span,
                format!("'{name}' must be kebab-case"),
                format!("rename to '{}'", kebab_case_suggestion(name)),
            );
        }
    }

    fn is_declared_record(&self, ty: &Type) -> bool {
        matches!(ty, Type::Con(name) if self.records.is_record(name))
    }

    fn error(&mut self, code: DiagnosticCode, span: Span, message: impl Into<String>) {
        let file = self.file.clone();
        self.sink
            .report(Diagnostic::error(code, file, span.line, span.column, message));
    }

    fn error_with_suggestion(
        &mut self,
        code: DiagnosticCode,
        span: Span,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        let file = self.file.clone();
        self.sink.report(
            Diagnostic::error(code, file, span.line, span.column, message)
                .with_suggestion(suggestion),
        );
    }
}
