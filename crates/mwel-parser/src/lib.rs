//! Parser for the JEL/MWEL scripting languages.
//!
//! A hand-written recursive-descent parser over the lexer's token stream,
//! one method per precedence level. The characteristic reduction behaviors
//! of the grammar all happen parse-side:
//!
//! - chained comparisons collapse into a single node (`a < b <= c` has two
//!   operators and three operands) unless a parenthesized comparison blocks
//!   the chain;
//! - `or`/`and` flatten, concatenating operands and operator positions;
//! - chained assignments gather their targets right-to-left;
//! - adjacent string literals concatenate;
//! - compound-call statements assemble their colon-joined `function_name`.
//!
//! Errors are reported to the [`ErrorSink`] and the parse returns `None`;
//! structural problems inside an otherwise well-formed construct (duplicate
//! object keys, argument-shape violations) are reported without aborting.
//!
//! ```
//! use mwel_error::ErrorCollector;
//! use mwel_lexer::Lexer;
//! use mwel_parser::Parser;
//!
//! let mut errors = ErrorCollector::new();
//! let tokens = Lexer::new(&mut errors).tokenize("local x = 1 + 2\n");
//! let module = Parser::parse(tokens, &mut errors);
//! assert!(module.is_some());
//! assert!(errors.is_empty());
//! ```

mod cursor;
mod error;
mod expr;
mod stmt;

pub use error::{ParseError, ParseResult};

use cursor::TokenCursor;
use mwel_ast::{Expr, Module};
use mwel_error::ErrorSink;
use mwel_lexer::Token;
use tracing::debug;

/// The parser: a token cursor plus the sink that receives diagnostics.
pub struct Parser<'e> {
    cursor: TokenCursor,
    sink: &'e mut dyn ErrorSink,
}

impl<'e> Parser<'e> {
    /// Parse an MWEL module. `None` means errors were reported and the
    /// token stream did not form a well-shaped program.
    pub fn parse(
        tokens: impl IntoIterator<Item = Token>,
        sink: &'e mut dyn ErrorSink,
    ) -> Option<Module> {
        let mut parser = Parser::over(tokens, sink);
        match parser.parse_module() {
            Ok(module) => {
                debug!(statements = module.statements.len(), "parsed module");
                Some(module)
            }
            Err(error) => {
                parser.report(error);
                None
            }
        }
    }

    /// Parse a single JEL expression (the substrate language's start
    /// symbol). Surrounding newlines are permitted; anything else trailing
    /// the expression is an error.
    pub fn parse_expression(
        tokens: impl IntoIterator<Item = Token>,
        sink: &'e mut dyn ErrorSink,
    ) -> Option<Expr> {
        let mut parser = Parser::over(tokens, sink);
        match parser.parse_expression_root() {
            Ok(expr) => Some(expr),
            Err(error) => {
                parser.report(error);
                None
            }
        }
    }

    fn over(tokens: impl IntoIterator<Item = Token>, sink: &'e mut dyn ErrorSink) -> Self {
        Parser { cursor: TokenCursor::new(tokens.into_iter().collect()), sink }
    }

    fn parse_expression_root(&mut self) -> ParseResult<Expr> {
        self.cursor.eat_newlines();
        let expr = self.parse_expr()?;
        self.cursor.eat_newlines();
        match self.cursor.peek() {
            None => Ok(expr),
            Some(token) => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    /// Report without aborting; used for the structural errors.
    pub(crate) fn report(&mut self, error: ParseError) {
        self.sink.report(error.into_record());
    }
}
