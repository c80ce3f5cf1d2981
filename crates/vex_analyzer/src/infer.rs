//! Unification engine.
//!
//! The analyzer accumulates one process-local [`Subst`] per compilation
//! unit. [`unify`] returns a *delta* substitution; the caller composes it
//! into the accumulated map and reads every public type through
//! [`Subst::apply`]. Composition is associative; the occur check runs on
//! every variable bind.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use vex_foundation::{Scheme, Type};

/// A substitution: a partial map from variable id to type.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: HashMap<u32, Type>,
}

impl Subst {
    /// Creates an empty substitution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a substitution binding a single variable.
    #[must_use]
    pub fn singleton(id: u32, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(id, ty);
        Self { map }
    }

    /// Returns true if no variables are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Applies this substitution to a type, chasing chains.
    #[must_use]
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(id) => match self.map.get(id) {
                // Bound variables may point at types containing further
                // bound variables; the occur check keeps this acyclic.
                Some(bound) => self.apply(bound),
                None => ty.clone(),
            },
            Type::Con(_) => ty.clone(),
            Type::Fun(params, result) => Type::Fun(
                params.iter().map(|p| self.apply(p)).collect(),
                Box::new(self.apply(result)),
            ),
            Type::Arr(elem) => Type::arr(self.apply(elem)),
            Type::Map(key, value) => Type::map(self.apply(key), self.apply(value)),
        }
    }

    /// Applies this substitution to a scheme, leaving quantified
    /// variables untouched.
    #[must_use]
    pub fn apply_scheme(&self, scheme: &Scheme) -> Scheme {
        if scheme.vars.is_empty() {
            return Scheme::mono(self.apply(&scheme.ty));
        }
        // Shadow the quantified variables so they stay symbolic
        let mut masked = self.clone();
        for v in &scheme.vars {
            masked.map.remove(v);
        }
        Scheme::new(scheme.vars.clone(), masked.apply(&scheme.ty))
    }

    /// Composes a delta into this substitution (`self = delta ∘ self`).
    ///
    /// Existing bindings are rewritten through the delta, then the
    /// delta's own bindings are added.
    pub fn compose(&mut self, delta: Subst) {
        for value in self.map.values_mut() {
            *value = delta.apply(value);
        }
        for (id, ty) in delta.map {
            self.map.entry(id).or_insert(ty);
        }
    }
}

/// Why unification failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyErrorKind {
    /// The two types have incompatible shapes or constants.
    Mismatch,
    /// Binding would create an infinite type.
    Occurs,
    /// The two function types have different parameter counts.
    Arity,
}

/// A failed unification, carrying both sides for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnifyError {
    /// The expected (left) type.
    pub expected: Type,
    /// The actual (right) type.
    pub actual: Type,
    /// The failure category.
    pub kind: UnifyErrorKind,
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UnifyErrorKind::Mismatch => {
                write!(f, "expected {}, got {}", self.expected, self.actual)
            }
            UnifyErrorKind::Occurs => write!(
                f,
                "infinite type: cannot unify {} with {}",
                self.expected, self.actual
            ),
            UnifyErrorKind::Arity => write!(
                f,
                "function arity mismatch: {} vs {}",
                self.expected, self.actual
            ),
        }
    }
}

/// Structurally unifies two types, returning the delta substitution.
///
/// The numeric family is baked in: `int`, `float`, and `number` unify
/// freely. The opaque external type unifies with anything.
pub fn unify(a: &Type, b: &Type) -> Result<Subst, UnifyError> {
    match (a, b) {
        (Type::Var(x), Type::Var(y)) if x == y => Ok(Subst::new()),
        (Type::Var(x), other) | (other, Type::Var(x)) => bind_var(*x, other),

        (Type::Con(x), Type::Con(y)) if x == y => Ok(Subst::new()),
        // int ∪ float both unify with number, and with each other
        (x, y) if x.is_numeric() && y.is_numeric() => Ok(Subst::new()),
        // External calls type as opaque and unify with anything
        (x, _) if x.is_opaque() => Ok(Subst::new()),
        (_, y) if y.is_opaque() => Ok(Subst::new()),

        (Type::Fun(params_a, result_a), Type::Fun(params_b, result_b)) => {
            if params_a.len() != params_b.len() {
                return Err(UnifyError {
                    expected: a.clone(),
                    actual: b.clone(),
                    kind: UnifyErrorKind::Arity,
                });
            }
            let mut subst = Subst::new();
            for (pa, pb) in params_a.iter().zip(params_b) {
                let delta = unify(&subst.apply(pa), &subst.apply(pb))?;
                subst.compose(delta);
            }
            let delta = unify(&subst.apply(result_a), &subst.apply(result_b))?;
            subst.compose(delta);
            Ok(subst)
        }

        (Type::Arr(elem_a), Type::Arr(elem_b)) => unify(elem_a, elem_b),

        (Type::Map(key_a, val_a), Type::Map(key_b, val_b)) => {
            let mut subst = unify(key_a, key_b)?;
            let delta = unify(&subst.apply(val_a), &subst.apply(val_b))?;
            subst.compose(delta);
            Ok(subst)
        }

        _ => Err(UnifyError {
            expected: a.clone(),
            actual: b.clone(),
            kind: UnifyErrorKind::Mismatch,
        }),
    }
}

/// Binds a variable to a type, after the occur check.
fn bind_var(id: u32, ty: &Type) -> Result<Subst, UnifyError> {
    if ty.contains_var(id) {
        return Err(UnifyError {
            expected: Type::Var(id),
            actual: ty.clone(),
            kind: UnifyErrorKind::Occurs,
        });
    }
    Ok(Subst::singleton(id, ty.clone()))
}

/// Joins two members of the numeric family for result typing.
///
/// Identical members join to themselves; differing members widen to
/// `number`.
#[must_use]
pub fn numeric_join(a: &Type, b: &Type) -> Type {
    if a == b {
        a.clone()
    } else {
        Type::number()
    }
}

/// Generator for fresh unification variables.
#[derive(Debug, Default)]
pub struct VarGen {
    next: u32,
}

impl VarGen {
    /// Creates a generator starting at variable 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh variable id.
    pub fn fresh_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns a fresh variable type.
    pub fn fresh(&mut self) -> Type {
        Type::Var(self.fresh_id())
    }
}

/// Quantifies the variables free in `ty` but not free in the environment.
#[must_use]
pub fn generalize(env_free: &BTreeSet<u32>, ty: &Type) -> Scheme {
    let vars: Vec<u32> = ty
        .free_vars()
        .into_iter()
        .filter(|v| !env_free.contains(v))
        .collect();
    Scheme::new(vars, ty.clone())
}

/// Instantiates a scheme with fresh variables for its quantifiers.
#[must_use]
pub fn instantiate(scheme: &Scheme, vars: &mut VarGen) -> Type {
    if scheme.vars.is_empty() {
        return scheme.ty.clone();
    }
    let mut fresh = Subst::new();
    for &v in &scheme.vars {
        let delta = Subst::singleton(v, vars.fresh());
        fresh.compose(delta);
    }
    fresh.apply(&scheme.ty)
}
