/// Checks a name against the identifier rule `^[a-zA-Z][a-zA-Z0-9_]*$`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// The last segment of a qualified name: `inc.Response` -> `Response`.
pub fn base_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Everything before the last segment of a qualified name, or `""` for a bare name.
pub fn namespace_prefix(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(prefix, _)| prefix)
}

/// Joins a namespace and a bare name.
pub fn qualify_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rule() {
        assert!(is_valid_identifier("User"));
        assert!(is_valid_identifier("a1_b"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("_hidden"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("has-dash"));
    }

    #[test]
    fn test_qualified_name_parts() {
        assert_eq!(base_name("inc.Response"), "Response");
        assert_eq!(base_name("Response"), "Response");
        assert_eq!(namespace_prefix("a.b.C"), "a.b");
        assert_eq!(namespace_prefix("C"), "");
        assert_eq!(qualify_name("inc", "User"), "inc.User");
        assert_eq!(qualify_name("", "User"), "User");
    }
}
