use std::fmt::Display;

use thiserror::Error;

/// Format a caveman-style diagnostic line.
pub fn caveman(line_number: usize, short: &str, detail: &str) -> String {
    if detail.is_empty() {
        format!("[oops] brain hurt line {}: {}", line_number, short)
    } else {
        format!("[oops] brain hurt line {}: {} — {}", line_number, short, detail)
    }
}

/// The one structured exception of the language. Raised by `oops`, failed
/// lookups during calls and instantiations, and the loop ceiling; caught by
/// `try`/`catch` or converted to a single output line at the run boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Oops {
    pub message: String,
    pub line_number: Option<usize>,
}

impl Oops {
    pub fn new(message: impl Into<String>, line_number: Option<usize>) -> Oops {
        Oops {
            message: message.into(),
            line_number,
        }
    }
}

impl Display for Oops {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line_number {
            Some(line_number) => write!(f, "{}", caveman(line_number, &self.message, "")),
            None => write!(f, "[oops] {}", self.message),
        }
    }
}

/// Why an expression failed to evaluate. The execution engine usually folds
/// one of these into an `Oops` or into a statement's fallback path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("bad expression: {0}")]
    Syntax(String),
    #[error("unknown name `{0}`")]
    UnknownName(String),
    #[error("`{0}` not object")]
    NotAnObject(String),
    #[error("`{target}` has no `{name}`")]
    UnknownProperty { target: String, name: String },
    #[error("can't {op} `{left}` and `{right}`")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
    },
    #[error("can't {op} `{operand}`")]
    InvalidOperand { op: String, operand: String },
    #[error("divided by zero")]
    DivisionByZero,
    #[error("`{name}` wants {expected} thing(s), got {got}")]
    HelperArity {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("`{name}` can't take that: {detail}")]
    HelperArgument { name: String, detail: String },
    #[error("`{0}` not a helper")]
    NotAHelper(String),
}

#[cfg(test)]
mod tests {
    use super::{caveman, Oops};

    #[test]
    fn caveman_with_and_without_detail() {
        assert_eq!(
            caveman(3, "me no know command", "frobnicate"),
            "[oops] brain hurt line 3: me no know command — frobnicate"
        );
        assert_eq!(
            caveman(3, "me no know command", ""),
            "[oops] brain hurt line 3: me no know command"
        );
    }

    #[test]
    fn oops_display() {
        assert_eq!(
            Oops::new("bad news", Some(7)).to_string(),
            "[oops] brain hurt line 7: bad news"
        );
        assert_eq!(Oops::new("bad news", None).to_string(), "[oops] bad news");
    }
}
