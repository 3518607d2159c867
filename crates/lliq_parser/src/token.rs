use std::fmt;

/// Tokens of the restricted expression sub-language.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    EqualEqual,
    BangEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    // Delimiters
    Comma,
    Dot,
    LeftParen,
    RightParen,

    // Identifiers & Literals
    Identifier(String),
    Integer(i64),
    Float(f64),
    Str(String),

    // Keywords
    And,
    Or,
    Not,
    True,
    False,
    NoneLit,

    // Special
    Eof,
}

impl Token {
    /// Get the Token for the given keyword, if valid.
    pub fn lookup_keyword(s: &str) -> Option<Token> {
        use Token::*;

        match s {
            "and" => Some(And),
            "or" => Some(Or),
            "not" => Some(Not),
            "True" => Some(True),
            "False" => Some(False),
            "None" => Some(NoneLit),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Star => write!(f, "*"),
            Slash => write!(f, "/"),

            EqualEqual => write!(f, "=="),
            BangEqual => write!(f, "!="),
            LessThan => write!(f, "<"),
            GreaterThan => write!(f, ">"),
            LessEqual => write!(f, "<="),
            GreaterEqual => write!(f, ">="),

            Comma => write!(f, ","),
            Dot => write!(f, "."),
            LeftParen => write!(f, "("),
            RightParen => write!(f, ")"),

            Identifier(name) => write!(f, "{}", name),
            Integer(value) => write!(f, "{}", value),
            Float(value) => {
                // Force one-decimal value for floats with no decimal place
                // e.g. 1.0 instead of 1
                if value.fract() == 0.0 {
                    write!(f, "{:.1}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            Str(value) => write!(f, "\"{}\"", value),

            And => write!(f, "and"),
            Or => write!(f, "or"),
            Not => write!(f, "not"),
            True => write!(f, "True"),
            False => write!(f, "False"),
            NoneLit => write!(f, "None"),

            Eof => write!(f, "EOF"),
        }
    }
}
