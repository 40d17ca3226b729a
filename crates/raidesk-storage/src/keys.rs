//! Key namespaces and glob translation
//!
//! `list_keys` accepts a minimal glob: `*` matches any run of characters and
//! `?` exactly one. Every other character is literal, so each backend has to
//! escape whatever its own matcher would treat as special.

/// Namespace owned by [`SessionManager`](crate::SessionManager)
pub const SESSION_PREFIX: &str = "session:";

/// Namespace owned by [`PlanRepository`](crate::PlanRepository)
pub const PLAN_PREFIX: &str = "plan:";

/// Escape character used in translated `LIKE` patterns
pub(crate) const LIKE_ESCAPE: char = '\\';

/// Storage key for a session ID
pub fn session_key(id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}

/// Storage key for a plan ID
pub fn plan_key(id: &str) -> String {
    format!("{}{}", PLAN_PREFIX, id)
}

/// Glob matching every key in a namespace (prefixes never contain `*` or `?`)
pub(crate) fn namespace_pattern(prefix: &str) -> String {
    format!("{}*", prefix)
}

/// Translate a glob into a SQL `LIKE` pattern using [`LIKE_ESCAPE`]
///
/// `%`, `_` and the escape character itself are literal in the glob, so they
/// get escaped before `*`/`?` become `%`/`_`.
pub(crate) fn glob_to_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for c in pattern.chars() {
        match c {
            '*' => out.push('%'),
            '?' => out.push('_'),
            '%' | '_' | LIKE_ESCAPE => {
                out.push(LIKE_ESCAPE);
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

/// Translate a glob into a Redis `MATCH` pattern
///
/// Redis globs also understand `[...]` classes and backslash escapes; those
/// characters are literal for us.
pub(crate) fn glob_to_redis(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for c in pattern.chars() {
        match c {
            '[' | ']' | '\\' | '^' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(session_key("abc"), "session:abc");
        assert_eq!(plan_key("p1"), "plan:p1");
        assert_eq!(namespace_pattern(PLAN_PREFIX), "plan:*");
    }

    #[test]
    fn test_glob_to_like() {
        assert_eq!(glob_to_like("plan:*"), "plan:%");
        assert_eq!(glob_to_like("session:????"), "session:____");
        assert_eq!(glob_to_like("*"), "%");
    }

    #[test]
    fn test_glob_to_like_escapes_sql_wildcards() {
        assert_eq!(glob_to_like("plan:a_b*"), "plan:a\\_b%");
        assert_eq!(glob_to_like("100%"), "100\\%");
        assert_eq!(glob_to_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_glob_to_redis() {
        assert_eq!(glob_to_redis("plan:*"), "plan:*");
        assert_eq!(glob_to_redis("k?"), "k?");
        assert_eq!(glob_to_redis("plan:[x]*"), "plan:\\[x\\]*");
    }
}
