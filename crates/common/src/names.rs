//! Qualified-name helpers.
//!
//! Qualified names use JVM binary-name conventions: package segments joined
//! with `.`, nested types attached with `$`, members attached with `#`
//! (member signatures keep their parameter list, e.g.
//! `a.b.Foo$Inner#run(int,java.lang.String)`).

/// The type portion of a qualified name: everything before the member part.
pub fn type_part(qualified: &str) -> &str {
    match qualified.find('#') {
        Some(idx) => &qualified[..idx],
        None => qualified,
    }
}

/// The enclosing top-level type: the type portion with nesting stripped.
pub fn top_level_type(qualified: &str) -> &str {
    let ty = type_part(qualified);
    match ty.find('$') {
        Some(idx) => &ty[..idx],
        None => ty,
    }
}

/// The package of a qualified name, or `""` for the default package.
pub fn package_of(qualified: &str) -> &str {
    let top = top_level_type(qualified);
    match top.rfind('.') {
        Some(idx) => &top[..idx],
        None => "",
    }
}

/// The simple (unqualified) name: the member name for members, the last
/// type segment otherwise.
pub fn simple_name(qualified: &str) -> &str {
    if let Some(idx) = qualified.find('#') {
        let member = &qualified[idx + 1..];
        match member.find('(') {
            Some(paren) => &member[..paren],
            None => member,
        }
    } else {
        let ty = qualified;
        let after_dollar = match ty.rfind('$') {
            Some(idx) => &ty[idx + 1..],
            None => ty,
        };
        match after_dollar.rfind('.') {
            Some(idx) => &after_dollar[idx + 1..],
            None => after_dollar,
        }
    }
}

/// The container of a symbol: the type for members, the outer type for
/// nested types, `None` for top-level types and packages.
pub fn container_of(qualified: &str) -> Option<&str> {
    if let Some(idx) = qualified.find('#') {
        return Some(&qualified[..idx]);
    }
    qualified.rfind('$').map(|idx| &qualified[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name_parts() {
        let q = "a.b.Foo$Inner#run(int)";
        assert_eq!(type_part(q), "a.b.Foo$Inner");
        assert_eq!(top_level_type(q), "a.b.Foo");
        assert_eq!(package_of(q), "a.b");
        assert_eq!(simple_name(q), "run");
        assert_eq!(container_of(q), Some("a.b.Foo$Inner"));
    }

    #[test]
    fn test_type_name_parts() {
        assert_eq!(simple_name("a.b.Foo"), "Foo");
        assert_eq!(simple_name("a.b.Foo$Inner"), "Inner");
        assert_eq!(package_of("a.b.Foo"), "a.b");
        assert_eq!(container_of("a.b.Foo"), None);
        assert_eq!(container_of("a.b.Foo$Inner"), Some("a.b.Foo"));
    }

    #[test]
    fn test_default_package() {
        assert_eq!(package_of("Foo"), "");
        assert_eq!(simple_name("Foo"), "Foo");
    }
}
