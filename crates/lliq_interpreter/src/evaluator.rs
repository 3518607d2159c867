use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use lliq_parser::ast::Expr;
use lliq_parser::token::Token;
use lliq_parser::{lexer, parser, rewrite};

use crate::environment::{lookup, ScopeHandle};
use crate::error::EvalError;
use crate::helpers::Helper;
use crate::value::Value;

static INTERP_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([A-Za-z_]\w*)").unwrap());

/// Substitute every `$name` occurrence inside a string with the stringified
/// value of `name`, resolved local-then-global, defaulting to empty. This is
/// a pure text pass and never recurses into expression evaluation.
pub fn interpolate(text: &str, env: &ScopeHandle, globals: &ScopeHandle) -> String {
    INTERP_VAR
        .replace_all(text, |caps: &Captures| {
            match lookup(env, globals, &caps[1]) {
                Some(value) => value.to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

/// Evaluate one expression string against the two-tier scope. Bare helper
/// invocations are rewritten to call form first, then the text is lexed and
/// parsed by the expression grammar.
pub fn evaluate(expr: &str, env: &ScopeHandle, globals: &ScopeHandle) -> Result<Value, EvalError> {
    let rewritten = rewrite::rewrite_helper_calls(expr.trim());
    let tokens = lexer::lex(&rewritten).map_err(|err| EvalError::Syntax(err.to_string()))?;
    let ast = parser::parse(tokens).map_err(|err| EvalError::Syntax(err.to_string()))?;
    eval_expr(&ast, env, globals)
}

fn eval_expr(expr: &Expr, env: &ScopeHandle, globals: &ScopeHandle) -> Result<Value, EvalError> {
    match expr {
        Expr::Integer(value) => Ok(Value::Integer(*value)),
        Expr::Float(value) => Ok(Value::Float(*value)),
        Expr::Boolean(value) => Ok(Value::Boolean(*value)),
        Expr::NoneLit => Ok(Value::Nil),
        Expr::Str(value) => Ok(Value::Str(interpolate(value, env, globals))),

        Expr::Identifier(name) => {
            lookup(env, globals, name).ok_or_else(|| EvalError::UnknownName(name.clone()))
        }

        Expr::Property { target, name } => {
            let value = lookup(env, globals, target)
                .ok_or_else(|| EvalError::UnknownName(target.clone()))?;
            match value {
                Value::Instance(inst) => {
                    inst.get_prop(name)
                        .ok_or_else(|| EvalError::UnknownProperty {
                            target: target.clone(),
                            name: name.clone(),
                        })
                }
                _ => Err(EvalError::NotAnObject(target.clone())),
            }
        }

        Expr::Call { callee, args } => {
            let helper =
                Helper::lookup(callee).ok_or_else(|| EvalError::NotAHelper(callee.clone()))?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, env, globals)?);
            }
            helper.apply(&values)
        }

        Expr::Prefix { op, right } => {
            let right = eval_expr(right, env, globals)?;
            eval_prefix(op, right)
        }

        Expr::Infix { op, left, right } => match op {
            // logical operators short-circuit on truthiness
            Token::And => {
                let left = eval_expr(left, env, globals)?;
                if !left.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let right = eval_expr(right, env, globals)?;
                Ok(Value::Boolean(right.is_truthy()))
            }
            Token::Or => {
                let left = eval_expr(left, env, globals)?;
                if left.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let right = eval_expr(right, env, globals)?;
                Ok(Value::Boolean(right.is_truthy()))
            }
            _ => {
                let left = eval_expr(left, env, globals)?;
                let right = eval_expr(right, env, globals)?;
                eval_infix(op, left, right)
            }
        },
    }
}

fn eval_prefix(op: &Token, right: Value) -> Result<Value, EvalError> {
    match op {
        Token::Minus => match right {
            Value::Integer(value) => match value.checked_neg() {
                Some(negated) => Ok(Value::Integer(negated)),
                None => Ok(Value::Float(-(value as f64))),
            },
            Value::Float(value) => Ok(Value::Float(-value)),
            other => Err(EvalError::InvalidOperand {
                op: op.to_string(),
                operand: other.typename(),
            }),
        },
        Token::Not => Ok(Value::Boolean(!right.is_truthy())),
        _ => Err(EvalError::InvalidOperand {
            op: op.to_string(),
            operand: right.typename(),
        }),
    }
}

fn eval_infix(op: &Token, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        Token::EqualEqual => Ok(Value::Boolean(left == right)),
        Token::BangEqual => Ok(Value::Boolean(left != right)),

        Token::LessThan | Token::GreaterThan | Token::LessEqual | Token::GreaterEqual => {
            eval_ordering(op, left, right)
        }

        // integer arithmetic spills into float instead of overflowing
        Token::Plus => match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => match a.checked_add(*b) {
                Some(n) => Ok(Value::Integer(n)),
                None => eval_float_arith(op, left, right),
            },
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            _ => eval_float_arith(op, left, right),
        },
        Token::Minus => match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => match a.checked_sub(*b) {
                Some(n) => Ok(Value::Integer(n)),
                None => eval_float_arith(op, left, right),
            },
            _ => eval_float_arith(op, left, right),
        },
        Token::Star => match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => match a.checked_mul(*b) {
                Some(n) => Ok(Value::Integer(n)),
                None => eval_float_arith(op, left, right),
            },
            (Value::Str(s), Value::Integer(n)) => Ok(Value::Str(s.repeat((*n).max(0) as usize))),
            _ => eval_float_arith(op, left, right),
        },
        // division is always true division; two integers make a float
        Token::Slash => match (left.as_float(), right.as_float()) {
            (Some(_), Some(b)) if b == 0.0 => Err(EvalError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(operand_error(op, &left, &right)),
        },

        _ => Err(operand_error(op, &left, &right)),
    }
}

fn eval_ordering(op: &Token, left: Value, right: Value) -> Result<Value, EvalError> {
    let outcome = match (&left, &right) {
        (Value::Str(a), Value::Str(b)) => match op {
            Token::LessThan => a < b,
            Token::GreaterThan => a > b,
            Token::LessEqual => a <= b,
            _ => a >= b,
        },
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => match op {
                Token::LessThan => a < b,
                Token::GreaterThan => a > b,
                Token::LessEqual => a <= b,
                _ => a >= b,
            },
            _ => return Err(operand_error(op, &left, &right)),
        },
    };
    Ok(Value::Boolean(outcome))
}

fn eval_float_arith(op: &Token, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => match op {
            Token::Plus => Ok(Value::Float(a + b)),
            Token::Minus => Ok(Value::Float(a - b)),
            Token::Star => Ok(Value::Float(a * b)),
            _ => Err(operand_error(op, &left, &right)),
        },
        _ => Err(operand_error(op, &left, &right)),
    }
}

fn operand_error(op: &Token, left: &Value, right: &Value) -> EvalError {
    EvalError::InvalidOperands {
        op: op.to_string(),
        left: left.typename(),
        right: right.typename(),
    }
}
