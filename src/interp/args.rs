// src/interp/args.rs

//! Default interpolation grammar.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{InterpolationError, Interpolator};

static ENV_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z0-9_]+)\}|([A-Za-z0-9_]+))").expect("static regex is valid")
});

/// Splits the input into words using POSIX shell quoting rules, then replaces
/// `$NAME` and `${NAME}` inside each word.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellInterpolator;

impl Interpolator for ShellInterpolator {
    fn parse_and_replace(
        &self,
        input: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Vec<String>, InterpolationError> {
        let words = shell_words::split(input).map_err(|_| InterpolationError::UnbalancedQuotes {
            input: input.to_string(),
        })?;

        words
            .iter()
            .map(|word| {
                check_braces(word)?;
                Ok(replace_env(word, vars))
            })
            .collect()
    }

    fn replace(
        &self,
        input: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, InterpolationError> {
        check_braces(input)?;
        Ok(replace_env(input, vars))
    }
}

fn replace_env(word: &str, vars: &HashMap<String, String>) -> String {
    ENV_TOKEN
        .replace_all(word, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match vars.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Every `${` must be closed and enclose a non-empty `[A-Za-z0-9_]` name.
fn check_braces(word: &str) -> Result<(), InterpolationError> {
    let mut rest = word;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| InterpolationError::UnterminatedBrace {
                input: word.to_string(),
            })?;

        let name = &after[..end];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(InterpolationError::InvalidName {
                name: name.to_string(),
            });
        }
        rest = &after[end + 1..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_bare_and_braced_tokens() {
        let out = ShellInterpolator
            .parse_and_replace(
                "--port $PORT --host=${HOST}:80",
                &vars(&[("PORT", "8080"), ("HOST", "localhost")]),
            )
            .unwrap();
        assert_eq!(out, vec!["--port", "8080", "--host=localhost:80"]);
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let out = ShellInterpolator
            .parse_and_replace("$MISSING ${ALSO_MISSING}", &HashMap::new())
            .unwrap();
        assert_eq!(out, vec!["$MISSING", "${ALSO_MISSING}"]);
    }

    #[test]
    fn quoted_words_stay_together() {
        let out = ShellInterpolator
            .parse_and_replace("-c 'echo $GREETING world'", &vars(&[("GREETING", "hi")]))
            .unwrap();
        assert_eq!(out, vec!["-c", "echo hi world"]);
    }

    #[test]
    fn task_dir_token_in_path() {
        let out = ShellInterpolator
            .parse_and_replace(
                "$NOMAD_TASK_DIR/run.sh",
                &vars(&[("NOMAD_TASK_DIR", "/var/alloc/abc/local")]),
            )
            .unwrap();
        assert_eq!(out, vec!["/var/alloc/abc/local/run.sh"]);
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let err = ShellInterpolator
            .parse_and_replace("echo 'oops", &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, InterpolationError::UnbalancedQuotes { .. }));
    }

    #[test]
    fn unterminated_brace_is_rejected() {
        let err = ShellInterpolator
            .parse_and_replace("${PORT", &vars(&[("PORT", "1")]))
            .unwrap_err();
        assert!(matches!(err, InterpolationError::UnterminatedBrace { .. }));
    }

    #[test]
    fn empty_or_invalid_brace_names_are_rejected() {
        assert!(matches!(
            ShellInterpolator.parse_and_replace("${}", &HashMap::new()),
            Err(InterpolationError::InvalidName { .. })
        ));
        assert!(matches!(
            ShellInterpolator.parse_and_replace("${A-B}", &HashMap::new()),
            Err(InterpolationError::InvalidName { .. })
        ));
    }

    #[test]
    fn single_values_keep_their_spaces() {
        let out = ShellInterpolator
            .replace("$DIR/my data 'x'", &vars(&[("DIR", "/alloc")]))
            .unwrap();
        assert_eq!(out, "/alloc/my data 'x'");

        assert!(matches!(
            ShellInterpolator.replace("${DIR", &HashMap::new()),
            Err(InterpolationError::UnterminatedBrace { .. })
        ));
    }

    #[test]
    fn plain_dollar_is_not_a_token() {
        let out = ShellInterpolator
            .parse_and_replace("cost: 5$ $", &HashMap::new())
            .unwrap();
        assert_eq!(out, vec!["cost:", "5$", "$"]);
    }
}
