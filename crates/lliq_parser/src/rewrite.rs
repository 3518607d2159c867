use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Helper invocations may be written bare, e.g. `smash "a" "b"` or
// `randint 1 10`. Rewrite them into call syntax before lexing so the
// expression grammar only ever sees `name(arg, arg)`.
static HELPER_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(smash|slice|uppercase|lowercase|randint|choice)\b\s+("[^"]*"|'[^']*'|\w+)(?:\s+("[^"]*"|'[^']*'|\w+))?"#,
    )
    .unwrap()
});

pub fn rewrite_helper_calls(expr: &str) -> String {
    HELPER_CALL
        .replace_all(expr, |caps: &Captures| {
            let name = &caps[1];
            let first = &caps[2];
            match caps.get(3) {
                Some(second) => format!("{}({}, {})", name, first, second.as_str()),
                None => format!("{}({})", name, first),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::rewrite_helper_calls;

    #[test]
    fn two_string_args() {
        assert_eq!(
            rewrite_helper_calls(r#"smash "a" "b""#),
            r#"smash("a", "b")"#
        );
    }

    #[test]
    fn numeric_args() {
        assert_eq!(rewrite_helper_calls("randint 1 10"), "randint(1, 10)");
    }

    #[test]
    fn single_arg() {
        assert_eq!(rewrite_helper_calls("uppercase name"), "uppercase(name)");
    }

    #[test]
    fn canonical_call_is_left_alone() {
        assert_eq!(rewrite_helper_calls("uppercase(s)"), "uppercase(s)");
    }

    #[test]
    fn only_two_args_are_consumed() {
        // a third bare argument stays behind for the parser to reject
        assert_eq!(rewrite_helper_calls("slice s 1 4"), "slice(s, 1) 4");
    }

    #[test]
    fn embedded_in_larger_expression() {
        assert_eq!(
            rewrite_helper_calls(r#"smash greeting "!" + suffix"#),
            r#"smash(greeting, "!") + suffix"#
        );
    }
}
