use std::fmt::Display;
use std::iter::Peekable;
use std::num::{ParseFloatError, ParseIntError};
use std::str::Chars;

use crate::token::Token;

#[derive(Debug)]
pub enum LexError {
    UnexpectedChar(char),
    StringNotClosed(char),
    InvalidFloat(ParseFloatError),
    InvalidInt(ParseIntError),
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnexpectedChar(c) => write!(f, "unexpected character \"{}\"", c),
            LexError::StringNotClosed(c) => write!(
                f,
                "expected closing {} of string literal but reached end of expression",
                c
            ),
            LexError::InvalidFloat(err) => write!(f, "invalid float: {}", err),
            LexError::InvalidInt(err) => write!(f, "invalid int: {}", err),
        }
    }
}

type LexResult<T> = Result<T, LexError>;

pub struct Lexer<'a> {
    input_iter: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input_iter: input.chars().peekable(),
        }
    }

    /// Consume the next character from the input.
    fn read_char(&mut self) -> Option<char> {
        self.input_iter.next()
    }

    /// Get the next character from the input without consuming it.
    fn peek_char(&mut self) -> Option<&char> {
        self.input_iter.peek()
    }

    /// Consume whitespace until a non-whitespace character is found.
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek_char() {
            if c.is_whitespace() {
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read the next characters as a string literal. Single and double
    /// quotes both delimit strings; the closing quote must match the
    /// opening one.
    fn read_string(&mut self, opening: char) -> LexResult<Token> {
        let mut str = String::new();

        loop {
            match self.read_char() {
                Some(ch) if ch == opening => break,
                Some('\\') => match self.read_char() {
                    Some('\'') => str.push('\''),
                    Some('\"') => str.push('\"'),
                    Some('\\') => str.push('\\'),
                    Some('n') => str.push('\n'),
                    Some('t') => str.push('\t'),
                    // An unrecognized escape keeps the backslash as-is
                    Some(ch) => {
                        str.push('\\');
                        str.push(ch);
                    }
                    None => return Err(LexError::StringNotClosed(opening)),
                },
                Some(ch) => str.push(ch),
                None => return Err(LexError::StringNotClosed(opening)),
            }
        }

        Ok(Token::Str(str))
    }

    /// Read the current and following characters as a number token.
    fn read_number(&mut self, first: char) -> LexResult<Token> {
        let mut number = String::new();
        number.push(first);

        let mut is_float = false;
        while let Some(&c) = self.peek_char() {
            if c.is_ascii_digit() {
                number.push(c);
                self.read_char();
            } else if c == '.' && !is_float {
                // A dot is only part of the number when a digit follows;
                // otherwise it is a property accessor.
                let mut lookahead = self.input_iter.clone();
                lookahead.next();
                match lookahead.peek() {
                    Some(d) if d.is_ascii_digit() => {
                        is_float = true;
                        number.push(c);
                        self.read_char();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }

        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(LexError::InvalidFloat)
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(LexError::InvalidInt)
        }
    }

    /// Read an identifier or keyword.
    fn read_identifier(&mut self, first: char) -> Token {
        let mut name = String::new();
        name.push(first);

        while let Some(&c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.read_char();
            } else {
                break;
            }
        }

        Token::lookup_keyword(&name).unwrap_or(Token::Identifier(name))
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let ch = match self.read_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            '+' => Ok(Token::Plus),
            '-' => Ok(Token::Minus),
            '*' => Ok(Token::Star),
            '/' => Ok(Token::Slash),

            '=' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    Ok(Token::EqualEqual)
                }
                _ => Err(LexError::UnexpectedChar('=')),
            },
            '!' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    Ok(Token::BangEqual)
                }
                _ => Err(LexError::UnexpectedChar('!')),
            },
            '<' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    Ok(Token::LessEqual)
                }
                _ => Ok(Token::LessThan),
            },
            '>' => match self.peek_char() {
                Some('=') => {
                    self.read_char();
                    Ok(Token::GreaterEqual)
                }
                _ => Ok(Token::GreaterThan),
            },

            ',' => Ok(Token::Comma),
            '.' => Ok(Token::Dot),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),

            '"' | '\'' => self.read_string(ch),

            c if c.is_ascii_digit() => self.read_number(c),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(c)),

            c => Err(LexError::UnexpectedChar(c)),
        }
    }
}

/// Lex a whole expression into a token list ending with `Eof`.
pub fn lex(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::lex;
    use crate::token::Token;

    #[test]
    fn operators_and_literals() {
        let tokens = lex("x + 1 * 2.5 == 'hi'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("x".to_string()),
                Token::Plus,
                Token::Integer(1),
                Token::Star,
                Token::Float(2.5),
                Token::EqualEqual,
                Token::Str("hi".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn keywords_vs_identifiers() {
        let tokens = lex("a and not b or True").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".to_string()),
                Token::And,
                Token::Not,
                Token::Identifier("b".to_string()),
                Token::Or,
                Token::True,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn property_dot_is_not_a_float() {
        let tokens = lex("c.n + 1.5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("c".to_string()),
                Token::Dot,
                Token::Identifier("n".to_string()),
                Token::Plus,
                Token::Float(1.5),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn dollar_is_rejected() {
        assert!(lex("$x + 1").is_err());
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert!(lex("\"oops").is_err());
    }

    #[test]
    fn quote_styles_match() {
        assert_eq!(
            lex("\"a\"").unwrap()[0],
            Token::Str("a".to_string())
        );
        assert_eq!(lex("'b'").unwrap()[0], Token::Str("b".to_string()));
    }
}
