//! Cross-phase properties from the compiler contract.

use proptest::prelude::*;

use vex_analyzer::{Analyzer, generalize, instantiate, unify};
use vex_analyzer::infer::{Subst, UnifyErrorKind, VarGen};
use vex_foundation::{Scheme, Type};
use vex_language::pretty::pretty_print_all;
use vex_language::{MacroExpander, parse};

fn analyze(source: &str) -> vex_analyzer::AnalysisResult {
    let forms = parse(source).expect("parse failed");
    let expanded = MacroExpander::new()
        .expand_all(&forms)
        .expect("expansion failed");
    Analyzer::new("prop.vx").analyze(&expanded)
}

/// Strategy over small well-formed programs built from literals.
fn literal_defs() -> impl Strategy<Value = String> {
    let literal = prop_oneof![
        any::<i32>().prop_map(|n| n.to_string()),
        any::<bool>().prop_map(|b| b.to_string()),
        "[a-z]{1,8}".prop_map(|s| format!("\"{s}\"")),
    ];
    prop::collection::vec(literal, 1..8).prop_map(|values| {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("(def name-{i} {v})"))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

proptest! {
    #[test]
    fn parsing_is_deterministic(source in literal_defs()) {
        let first = parse(&source).unwrap();
        let second = parse(&source).unwrap();
        prop_assert_eq!(pretty_print_all(&first), pretty_print_all(&second));
    }

    #[test]
    fn well_typed_literal_programs_have_no_errors(source in literal_defs()) {
        let result = analyze(&source);
        prop_assert!(!result.has_errors(), "{}", result.sink.format());
        // Every top-level def has a principal type
        prop_assert_eq!(result.schemes.len(), source.lines().count());
    }

    #[test]
    fn occur_check_blocks_infinite_types(id in 0u32..64) {
        let err = unify(&Type::Var(id), &Type::arr(Type::Var(id))).unwrap_err();
        prop_assert_eq!(err.kind, UnifyErrorKind::Occurs);

        let nested = Type::fun(vec![Type::int()], Type::map(Type::string(), Type::Var(id)));
        let err = unify(&Type::Var(id), &nested).unwrap_err();
        prop_assert_eq!(err.kind, UnifyErrorKind::Occurs);
    }

    #[test]
    fn substitutions_never_bind_self_referencing_vars(id in 0u32..64) {
        // A successful bind never produces a self-containing type
        if let Ok(subst) = unify(&Type::Var(id), &Type::arr(Type::int())) {
            let applied = subst.apply(&Type::Var(id));
            prop_assert!(!applied.contains_var(id));
        }
    }
}

#[test]
fn numeric_family_members_unify_pairwise() {
    let members = [Type::int(), Type::float(), Type::number()];
    for a in &members {
        for b in &members {
            assert!(unify(a, b).is_ok(), "{a} vs {b}");
        }
    }
}

#[test]
fn nominal_constants_with_equal_structure_stay_distinct() {
    assert!(unify(&Type::con("A"), &Type::con("B")).is_err());
    assert!(
        unify(
            &Type::map(Type::string(), Type::con("A")),
            &Type::map(Type::string(), Type::con("B"))
        )
        .is_err()
    );
}

#[test]
fn instantiation_preserves_scheme_shape() {
    let mut vars = VarGen::new();
    let scheme = Scheme::new(
        vec![0],
        Type::fun(vec![Type::Var(0), Type::arr(Type::Var(0))], Type::Var(0)),
    );

    for _ in 0..4 {
        let inst = instantiate(&scheme, &mut vars);
        let Type::Fun(params, result) = &inst else {
            panic!("expected function type");
        };
        assert_eq!(&params[0], result.as_ref());
        assert_eq!(params[1], Type::arr(result.as_ref().clone()));
    }
}

#[test]
fn generalization_respects_environment() {
    // A variable free in the environment must not be quantified
    let ty = Type::fun(vec![Type::Var(3)], Type::Var(4));
    let env_free = std::collections::BTreeSet::from([3]);
    let scheme = generalize(&env_free, &ty);
    assert_eq!(scheme.vars, vec![4]);
}

#[test]
fn value_restriction_holds_for_applications() {
    let result = analyze("(defn id [x: a] -> a x)\n(def v (id 1))\n(def w (id \"s\"))");
    assert!(!result.has_errors());
    assert!(result.schemes["id"].is_polymorphic());
    assert!(!result.schemes["v"].is_polymorphic());
    assert!(!result.schemes["w"].is_polymorphic());
}

#[test]
fn composition_is_associative_on_reads() {
    // ((s3 ∘ s2) ∘ s1) and (s3 ∘ (s2 ∘ s1)) agree on every read
    let s1 = Subst::singleton(0, Type::Var(1));
    let s2 = Subst::singleton(1, Type::Var(2));
    let s3 = Subst::singleton(2, Type::int());

    let mut left = s1.clone();
    left.compose(s2.clone());
    left.compose(s3.clone());

    let mut inner = s2;
    inner.compose(s3);
    let mut right = s1;
    right.compose(inner);

    for id in 0..3 {
        assert_eq!(left.apply(&Type::Var(id)), right.apply(&Type::Var(id)));
    }
}

#[test]
fn generated_imports_are_unique_across_phases() {
    use vex_codegen::GoGenerator;

    let forms = parse(
        "(import [\"fmt\" \"strings\"])\n(import \"fmt\")\n(fmt/Println (strings/ToUpper \"q\"))",
    )
    .unwrap();
    let expanded = MacroExpander::new().expand_all(&forms).unwrap();
    let analysis = Analyzer::new("prop.vx").analyze(&expanded);
    let go = GoGenerator::new()
        .with_analysis(analysis.records, analysis.schemes)
        .generate(&expanded);

    assert_eq!(go.matches("\"fmt\"").count(), 1);
    assert_eq!(go.matches("\"strings\"").count(), 1);
}
