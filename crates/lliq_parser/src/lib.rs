pub mod ast;
pub mod block;
pub mod lexer;
pub mod line;
pub mod link;
pub mod parser;
pub mod rewrite;
pub mod token;

/// Parse a full program: indentation tokenize, build blocks, link siblings
/// into a tagged statement list.
pub fn parse_program(source: &str) -> Vec<ast::Stmt> {
    link::link(&block::parse_blocks(&line::tokenize(source)))
}
