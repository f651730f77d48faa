/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders in raw
/// config text.
///
/// Unresolvable variables without a default are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injected lookup, so tests never touch
/// the process environment.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut body = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            body.push(c);
        }

        if !closed || body.is_empty() {
            result.push_str("${");
            result.push_str(&body);
            if closed {
                result.push('}');
            }
            continue;
        }

        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (body.as_str(), None),
        };
        // An empty value counts as unset when a default is given.
        match (lookup(name), default) {
            (Some(val), Some(default)) if val.is_empty() => result.push_str(default),
            (Some(val), _) => result.push_str(&val),
            (None, Some(default)) => result.push_str(default),
            (None, None) => {
                result.push_str("${");
                result.push_str(&body);
                result.push('}');
            },
        }
    }

    result
}
