//! Built-in type schemes seeded at analyzer construction.
//!
//! Arithmetic and comparison work over the numeric family; the list
//! operations are polymorphic over the element type. `+` is additionally
//! variadic-folded by the analyzer itself.

use vex_foundation::{Scheme, Type, VxMap};

/// Seeds the typing environment with the built-in schemes.
pub fn seed_builtins(env: &mut VxMap<String, Scheme>) {
    let number2 = || Scheme::mono(Type::fun(vec![Type::number(), Type::number()], Type::number()));
    let compare = || Scheme::mono(Type::fun(vec![Type::number(), Type::number()], Type::boolean()));
    let logic2 = || Scheme::mono(Type::fun(vec![Type::boolean(), Type::boolean()], Type::boolean()));

    // Arithmetic over the numeric family
    for op in ["+", "-", "*", "/"] {
        env.insert(op.to_string(), number2());
    }

    // Comparisons
    for op in [">", "<", ">=", "<="] {
        env.insert(op.to_string(), compare());
    }

    // Polymorphic equality: forall a. a -> a -> bool
    env.insert(
        "=".to_string(),
        Scheme::new(vec![0], Type::fun(vec![Type::Var(0), Type::Var(0)], Type::boolean())),
    );

    // Boolean logic
    env.insert(
        "not".to_string(),
        Scheme::mono(Type::fun(vec![Type::boolean()], Type::boolean())),
    );
    env.insert("and".to_string(), logic2());
    env.insert("or".to_string(), logic2());

    // List operations, polymorphic over the element type
    let a = || Type::Var(0);
    let arr_a = || Type::arr(Type::Var(0));

    env.insert(
        "first".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a()], a())),
    );
    env.insert(
        "rest".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a()], arr_a())),
    );
    env.insert(
        "cons".to_string(),
        Scheme::new(vec![0], Type::fun(vec![a(), arr_a()], arr_a())),
    );
    env.insert(
        "count".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a()], Type::int())),
    );
    env.insert(
        "len".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a()], Type::int())),
    );
    env.insert(
        "empty?".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a()], Type::boolean())),
    );
    env.insert(
        "get".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a(), Type::int()], a())),
    );
    env.insert(
        "slice".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a(), Type::int()], arr_a())),
    );
    env.insert(
        "append".to_string(),
        Scheme::new(vec![0], Type::fun(vec![arr_a(), arr_a()], arr_a())),
    );
}
