use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::EvalError;
use crate::value::Value;

/// The fixed set of helper functions exposed to the expression language.
/// Helpers are not overridable and not first-class values; they only exist
/// as call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Smash,
    Slice,
    Uppercase,
    Lowercase,
    Randint,
    Choice,
}

impl Helper {
    pub fn lookup(name: &str) -> Option<Helper> {
        use Helper::*;

        match name {
            "smash" => Some(Smash),
            "slice" => Some(Slice),
            "uppercase" => Some(Uppercase),
            "lowercase" => Some(Lowercase),
            "randint" => Some(Randint),
            "choice" => Some(Choice),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        use Helper::*;

        match self {
            Smash => "smash",
            Slice => "slice",
            Uppercase => "uppercase",
            Lowercase => "lowercase",
            Randint => "randint",
            Choice => "choice",
        }
    }

    pub fn apply(&self, args: &[Value]) -> Result<Value, EvalError> {
        use Helper::*;

        match self {
            Smash => match args {
                [a] => Ok(Value::Str(a.to_string())),
                [a, b] => Ok(Value::Str(format!("{}{}", a, b))),
                _ => Err(self.arity_error("1 or 2", args.len())),
            },
            Slice => match args {
                [s, start] => {
                    let start = self.int_arg(start)?;
                    Ok(Value::Str(slice_chars(&s.to_string(), start, None)))
                }
                [s, start, end] => {
                    let start = self.int_arg(start)?;
                    let end = self.int_arg(end)?;
                    Ok(Value::Str(slice_chars(&s.to_string(), start, Some(end))))
                }
                _ => Err(self.arity_error("2 or 3", args.len())),
            },
            Uppercase => match args {
                [s] => Ok(Value::Str(s.to_string().to_uppercase())),
                _ => Err(self.arity_error("1", args.len())),
            },
            Lowercase => match args {
                [s] => Ok(Value::Str(s.to_string().to_lowercase())),
                _ => Err(self.arity_error("1", args.len())),
            },
            Randint => match args {
                [low, high] => {
                    let low = self.int_arg(low)?;
                    let high = self.int_arg(high)?;
                    if low > high {
                        return Err(EvalError::HelperArgument {
                            name: self.name().to_string(),
                            detail: format!("empty range {} to {}", low, high),
                        });
                    }
                    Ok(Value::Integer(rand::thread_rng().gen_range(low..=high)))
                }
                _ => Err(self.arity_error("2", args.len())),
            },
            Choice => {
                if args.is_empty() {
                    return Err(self.arity_error("at least 1", 0));
                }
                let picked = args
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .unwrap_or(Value::Nil);
                Ok(picked)
            }
        }
    }

    fn arity_error(&self, expected: &str, got: usize) -> EvalError {
        EvalError::HelperArity {
            name: self.name().to_string(),
            expected: expected.to_string(),
            got,
        }
    }

    fn int_arg(&self, value: &Value) -> Result<i64, EvalError> {
        if let Some(int) = value.as_int() {
            return Ok(int);
        }
        if let Value::Str(text) = value {
            if let Ok(int) = text.trim().parse::<i64>() {
                return Ok(int);
            }
        }
        Err(EvalError::HelperArgument {
            name: self.name().to_string(),
            detail: format!("wanted a number, got {}", value.typename()),
        })
    }
}

/// Substring by character offsets with negative-index and clamping rules
/// matching conventional slicing: negative counts from the end, out-of-range
/// bounds clamp, an empty range yields an empty string.
fn slice_chars(s: &str, start: i64, end: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let clamp = |i: i64| -> i64 {
        if i < 0 {
            (i + len).max(0)
        } else {
            i.min(len)
        }
    };
    let from = clamp(start);
    let to = match end {
        Some(end) => clamp(end),
        None => len,
    };
    if from >= to {
        String::new()
    } else {
        chars[from as usize..to as usize].iter().collect()
    }
}
