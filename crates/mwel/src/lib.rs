//! Front-end for the JEL/MWEL scripting toolchain.
//!
//! Ties the pipeline together: the state-stack lexer, the parser, and the
//! op-list compiler with its scope/closure resolution. The usual entry
//! point is [`compile`]; [`compile_expression`] handles the pure-expression
//! substrate (JEL) on its own.
//!
//! ```
//! use mwel::{compile, ErrorCollector};
//!
//! let mut errors = ErrorCollector::new();
//! let ops = compile("local greeting = 'hello'\n", &mut errors);
//! assert!(ops.is_some());
//! assert!(errors.is_empty());
//! ```

pub use mwel_ast as ast;
pub use mwel_compiler::{render_ops, Compiler, ConstValue, Op, OpKind, OpList, ValueKind};
pub use mwel_error::{ErrorCollector, ErrorRecord, ErrorSink, NullSink};
pub use mwel_lexer::{Dialect, Lexer, Token, TokenKind};
pub use mwel_parser::Parser;
pub use mwel_position_tracking::{Position, SourceLocation};

/// Forwarding sink that remembers whether anything was reported.
struct CountingSink<'a> {
    inner: &'a mut dyn ErrorSink,
    reports: usize,
}

impl ErrorSink for CountingSink<'_> {
    fn report(&mut self, record: ErrorRecord) {
        self.reports += 1;
        self.inner.report(record);
    }
}

/// Compile an MWEL program end to end.
///
/// Every problem found on the way is reported to `sink`. The result is
/// `Some` only for a clean run: a reported error — even one the lexer or
/// parser recovered from — yields `None` without running the compiler.
pub fn compile(source: &str, sink: &mut dyn ErrorSink) -> Option<OpList> {
    let mut sink = CountingSink { inner: sink, reports: 0 };
    let tokens = Lexer::new(&mut sink).tokenize(source);
    let module = Parser::parse(tokens, &mut sink)?;
    if sink.reports > 0 {
        return None;
    }
    Some(Compiler::new().compile(&module))
}

/// Compile a standalone JEL expression. Names are left unresolved
/// (`LOAD_NAME`); the expression substrate has no binding forms.
pub fn compile_expression(source: &str, sink: &mut dyn ErrorSink) -> Option<OpList> {
    let mut sink = CountingSink { inner: sink, reports: 0 };
    let tokens = Lexer::with_dialect(Dialect::Jel, &mut sink).tokenize(source);
    let expr = Parser::parse_expression(tokens, &mut sink)?;
    if sink.reports > 0 {
        return None;
    }
    Some(Compiler::new().compile_expression(&expr))
}
