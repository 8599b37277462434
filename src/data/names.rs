//! Name helpers shared by lookup, uniqueness checks and export.

/// Capitalize each whitespace-separated word: "tie/ln fighter" -> "Tie/ln Fighter".
pub fn prettify_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Strip a trailing parenthesised qualifier so card variants share one identity:
/// "gar saxon (crew)" -> "gar saxon", "maul (1 crew)" -> "maul".
pub fn root_name(name: &str) -> &str {
    match name.find('(') {
        Some(idx) => name[..idx].trim_end(),
        None => name.trim(),
    }
}

/// Catalog keys are lowercase; exported names are prettified.
pub fn catalog_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
