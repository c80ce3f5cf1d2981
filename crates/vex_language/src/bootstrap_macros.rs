//! Bootstrap macro templates.
//!
//! These templates are registered automatically when an expander is
//! constructed, before any user source is seen.
//!
//! - `defn` - define a named function: sugar for `(def name (fn …))`
//! - `deftest` / `simple-deftest` - define a named test backed by the
//!   `test` support package
//! - `when` - run body when the condition holds
//! - `unless` - run body when the condition does not hold

use crate::macro_def::{MacroDef, MacroParam};
use crate::macro_registry::MacroRegistry;
use crate::parser::parse;
use crate::span::Span;

/// Registers the bootstrap templates into the given registry.
pub fn register_bootstrap_macros(registry: &mut MacroRegistry) {
    // (defn name [params…] -> Ret body…)
    //   => (def name (fn [params…] -> Ret body…))
    register_template(
        registry,
        "defn",
        &["name", "args", "arrow", "ret"],
        Some("body"),
        "(def ~name (fn ~args -> ~ret ~body))",
    );

    // (deftest "name" body…)
    //   => (test/run "name" (fn [] -> bool (do body…)))
    register_template(
        registry,
        "deftest",
        &["name"],
        Some("body"),
        "(test/run ~name (fn [] -> bool (do ~body)))",
    );

    // simple-deftest is the single-assertion spelling; same expansion
    register_template(
        registry,
        "simple-deftest",
        &["name"],
        Some("body"),
        "(test/run ~name (fn [] -> bool (do ~body)))",
    );

    // (when test body…) => (if test (do body…))
    register_template(registry, "when", &["test"], Some("body"), "(if ~test (do ~body))");

    // (unless test body…) => (if (not test) (do body…))
    register_template(
        registry,
        "unless",
        &["test"],
        Some("body"),
        "(if (not ~test) (do ~body))",
    );
}

/// Parses a template body and registers it under the given name.
fn register_template(
    registry: &mut MacroRegistry,
    name: &str,
    normal_params: &[&str],
    rest_param: Option<&str>,
    body_template: &str,
) {
    let mut params: Vec<MacroParam> = normal_params
        .iter()
        .map(|&p| MacroParam::Normal(p.to_string()))
        .collect();
    if let Some(rest) = rest_param {
        params.push(MacroParam::Rest(rest.to_string()));
    }

    let body = match parse(body_template) {
        Ok(forms) => forms,
        Err(e) => {
            // Bootstrap templates are compiled in; failing to parse one
            // is a programming error.
            panic!("failed to parse bootstrap macro '{name}': {e}");
        }
    };

    registry.register_unchecked(MacroDef::new(name, params, body, Span::at_start()));
}
