//! Identifier and keyword mapping from QS to Python
//!
//! Pure functions: the same QS name always maps to the same Python name.

/// Python keywords; QS identifiers spelled like these get a trailing `_`
pub const PYTHON_RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// QS keywords and placeholders with a direct Python spelling
const LITERAL_NAMES: &[(&str, &str)] = &[
    ("this", "self"),
    ("true", "True"),
    ("false", "False"),
    ("null", "None"),
    ("undefined", "None"),
    ("unknown", "None"),
];

/// Legacy method spellings renamed on member access
const METHOD_ALIASES: &[(&str, &str)] = &[("startsWith", "startswith")];

#[must_use]
pub fn is_reserved(name: &str) -> bool {
    PYTHON_RESERVED.contains(&name)
}

/// Map a QS identifier to a valid Python identifier
///
/// ```
/// use qsa_core::names::map_identifier;
///
/// assert_eq!(map_identifier("class"), "class_");
/// assert_eq!(map_identifier("this"), "self");
/// assert_eq!(map_identifier("cursor"), "cursor");
/// ```
#[must_use]
pub fn map_identifier(name: &str) -> String {
    if let Some((_, host)) = LITERAL_NAMES.iter().find(|(qs, _)| *qs == name) {
        return (*host).to_string();
    }
    escape_reserved(name)
}

/// Map the property name of a member access (`obj.name`)
#[must_use]
pub fn map_member(name: &str) -> String {
    if let Some((_, host)) = METHOD_ALIASES.iter().find(|(qs, _)| *qs == name) {
        return (*host).to_string();
    }
    escape_reserved(name)
}

/// `$` has no Python spelling
const DOLLAR: &str = "_S_";

fn escape_reserved(name: &str) -> String {
    if name.contains('$') {
        return escape_reserved(&name.replace('$', DOLLAR));
    }
    if is_reserved(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_get_suffix() {
        assert_eq!(map_identifier("class"), "class_");
        assert_eq!(map_identifier("from"), "from_");
        assert_eq!(map_identifier("lambda"), "lambda_");
        assert_eq!(map_identifier("None"), "None_");
    }

    #[test]
    fn literal_names_map_to_host() {
        assert_eq!(map_identifier("this"), "self");
        assert_eq!(map_identifier("true"), "True");
        assert_eq!(map_identifier("false"), "False");
        assert_eq!(map_identifier("null"), "None");
        assert_eq!(map_identifier("unknown"), "None");
    }

    #[test]
    fn plain_names_are_unchanged() {
        assert_eq!(map_identifier("formRecordfacturas"), "formRecordfacturas");
        assert_eq!(map_identifier("self"), "self");
    }

    #[test]
    fn dollar_is_spelled_out() {
        assert_eq!(map_identifier("$"), "_S_");
        assert_eq!(map_identifier("$tmp"), "_S_tmp");
        assert_eq!(map_identifier("a$b$"), "a_S_b_S_");
        assert_eq!(map_member("$el"), "_S_el");
    }

    #[test]
    fn member_aliases() {
        assert_eq!(map_member("startsWith"), "startswith");
        assert_eq!(map_member("import"), "import_");
        assert_eq!(map_member("valueBuffer"), "valueBuffer");
        // literal renames only apply to bare identifiers
        assert_eq!(map_member("null"), "null");
    }
}
