//! Identifier mapping from Vex to Go.
//!
//! Kebab-case Vex names become snake_case Go identifiers; record names
//! and fields become exported Go names.

/// Maps a Vex symbol to a Go identifier (`say-hi` → `say_hi`).
///
/// The predicate suffixes `?` and `!` are dropped.
#[must_use]
pub fn go_ident(name: &str) -> String {
    name.trim_end_matches(['?', '!'])
        .replace('-', "_")
}

/// Maps a record field to an exported Go field name
/// (`first-name` → `FirstName`).
#[must_use]
pub fn go_field_name(field: &str) -> String {
    field
        .split('-')
        .map(capitalize)
        .collect()
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
