use std::fmt::Display;

use crate::ast::Expr;
use crate::token::Token;

#[derive(Debug)]
pub enum ParseError {
    Unexpected(Token),
    Expected(String, Token),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unexpected(token) => write!(f, "unexpected token {}", token),
            ParseError::Expected(expected, got) => {
                write!(
                    f,
                    "expected next token to be {}, but got {} instead",
                    expected, got
                )
            }
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Binding strength, lowest first. Mirrors the host language's ordering:
/// `or` < `and` < `not` < comparisons < sum < product < unary minus.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Or,
    And,
    Comparison,
    Sum,
    Product,
}

fn precedence_of(token: &Token) -> Precedence {
    match token {
        Token::Or => Precedence::Or,
        Token::And => Precedence::And,
        Token::EqualEqual
        | Token::BangEqual
        | Token::LessThan
        | Token::GreaterThan
        | Token::LessEqual
        | Token::GreaterEqual => Precedence::Comparison,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Star | Token::Slash => Precedence::Product,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Expected(
                expected.to_string(),
                self.current().clone(),
            ))
        }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let next = precedence_of(self.current());
            if next == Precedence::Lowest || next <= precedence {
                break;
            }
            let op = self.advance();
            let right = self.parse_expression(precedence_of(&op))?;
            left = Expr::Infix {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Token::Integer(value) => Ok(Expr::Integer(value)),
            Token::Float(value) => Ok(Expr::Float(value)),
            Token::Str(value) => Ok(Expr::Str(value)),
            Token::True => Ok(Expr::Boolean(true)),
            Token::False => Ok(Expr::Boolean(false)),
            Token::NoneLit => Ok(Expr::NoneLit),

            Token::Identifier(name) => self.parse_identifier_suffix(name),

            Token::Minus => {
                let right = self.parse_prefix()?;
                Ok(Expr::Prefix {
                    op: Token::Minus,
                    right: Box::new(right),
                })
            }
            Token::Not => {
                // `not` binds looser than comparisons, like the host grammar
                let right = self.parse_expression(Precedence::And)?;
                Ok(Expr::Prefix {
                    op: Token::Not,
                    right: Box::new(right),
                })
            }

            Token::LeftParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }

            token => Err(ParseError::Unexpected(token)),
        }
    }

    /// An identifier may stand alone, access a property (`obj.prop`) or
    /// call a helper (`name(a, b)`).
    fn parse_identifier_suffix(&mut self, name: String) -> ParseResult<Expr> {
        match self.current() {
            Token::Dot => {
                self.advance();
                match self.advance() {
                    Token::Identifier(prop) => Ok(Expr::Property {
                        target: name,
                        name: prop,
                    }),
                    token => Err(ParseError::Expected("identifier".to_string(), token)),
                }
            }
            Token::LeftParen => {
                self.advance();
                let mut args = Vec::new();
                if *self.current() != Token::RightParen {
                    args.push(self.parse_expression(Precedence::Lowest)?);
                    while *self.current() == Token::Comma {
                        self.advance();
                        args.push(self.parse_expression(Precedence::Lowest)?);
                    }
                }
                self.expect(Token::RightParen)?;
                Ok(Expr::Call { callee: name, args })
            }
            _ => Ok(Expr::Identifier(name)),
        }
    }
}

/// Parse a full token list (as produced by `lexer::lex`) into one
/// expression. Trailing tokens after the expression are an error.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Expr> {
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression(Precedence::Lowest)?;
    parser.expect(Token::Eof)?;
    Ok(expr)
}
