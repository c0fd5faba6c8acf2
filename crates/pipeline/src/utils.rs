//! Identifier and literal helpers shared by the parser and the renderer.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that cannot name a generated function, parameter or type.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
        // names the generated request functions already use
        "url",
        "config",
        "http",
        "baseURL",
        "query",
        "body",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` has to be quoted when used as an object key.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    !(first.is_ascii_alphabetic() || first == '_' || first == '$')
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escapes a string for a `'...'` literal.
///
/// Line terminators are escaped too, since a raw one ends the literal.
pub fn escape_js_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Single-quoted JavaScript string literal.
pub fn quote(s: &str) -> String {
    format!("'{}'", escape_js_string(s))
}

/// The key as written in an object literal or type: bare when it is a valid
/// identifier, quoted otherwise.
pub fn quote_if_needed(name: &str) -> String {
    if needs_quoting(name) {
        quote(name)
    } else {
        name.to_string()
    }
}

/// Turns an arbitrary name into a camelCase identifier.
///
/// Separators are dropped and the following letter upper-cased, a leading
/// digit gets a `_` prefix, and reserved words are prefixed with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if upper_next && !result.is_empty() {
                result.extend(c.to_uppercase());
            } else {
                result.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    if result.is_empty() {
        return "_empty".to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    if TS_RESERVED_WORDS.contains(result.as_str()) {
        result.insert(0, '_');
    }
    result
}

/// PascalCase type name for a schema key such as `pet-store.Order` or `Page«User»`.
pub fn sanitize_type_name(name: &str) -> String {
    let ident = sanitize_identifier(name);
    if !ident.starts_with('_') || name.starts_with('_') {
        return capitalize_first(&ident);
    }
    // prefixed because of a leading digit or a reserved word
    let rest = capitalize_first(ident.trim_start_matches('_'));
    if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit()) {
        format!("T{rest}")
    } else {
        rest
    }
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("foo"));
        assert!(!needs_quoting("_foo"));
        assert!(!needs_quoting("$foo"));
        assert!(!needs_quoting("foo123"));

        assert!(needs_quoting(""));
        assert!(needs_quoting("123foo"));
        assert!(needs_quoting("foo-bar"));
        assert!(needs_quoting("foo bar"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("hello"), "'hello'");
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("content-type"), "'content-type'");
    }

    #[test]
    fn test_quote_escapes_line_terminators() {
        assert_eq!(quote("a\nb"), "'a\\nb'");
        assert_eq!(quote("a\r\nb"), "'a\\r\\nb'");
        assert_eq!(quote("a\u{2028}b\u{2029}"), "'a\\u2028b\\u2029'");
        assert_eq!(quote("C:\\tmp"), "'C:\\\\tmp'");
        assert!(!quote("multi\nline\u{2028}").contains(['\n', '\u{2028}']));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("foo"), "foo");
        assert_eq!(sanitize_identifier("foo-bar"), "fooBar");
        assert_eq!(sanitize_identifier("foo.bar baz"), "fooBarBaz");
        assert_eq!(sanitize_identifier("123foo"), "_123foo");
        assert_eq!(sanitize_identifier("delete"), "_delete");
        assert_eq!(sanitize_identifier("url"), "_url");
        assert_eq!(sanitize_identifier("--"), "_empty");
    }

    #[test]
    fn test_sanitize_type_name() {
        assert_eq!(sanitize_type_name("user"), "User");
        assert_eq!(sanitize_type_name("pet-store.Order"), "PetStoreOrder");
        assert_eq!(sanitize_type_name("Page«User»"), "PageUser");
        assert_eq!(sanitize_type_name("1st"), "T1st");
        assert_eq!(sanitize_type_name("delete"), "Delete");
    }
}
