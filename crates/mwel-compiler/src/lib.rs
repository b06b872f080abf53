//! Op-list compiler for the JEL/MWEL front-end.
//!
//! The compiler walks the parsed tree and emits stack-machine operations
//! into a stack of open op-lists: entering a sub-compilation (a call
//! argument, a short-circuit operand, a clause or function body) pushes a
//! fresh list, and the completed list becomes an argument of the op in the
//! parent. There are no forward jumps.
//!
//! Name resolution is the central piece: every identifier is classified at
//! compile time as global, local, non-local, or closed-over, and closure
//! capture requirements propagate outward through every open function a
//! reference crosses (see [`MAKE_FUNCTION`'s closure tuple][OpKind::MakeFunction]).
//!
//! A `Compiler` is cheap to create and not re-entrant; use one per
//! compilation.
//!
//! ```
//! use mwel_error::ErrorCollector;
//! use mwel_lexer::Lexer;
//! use mwel_parser::Parser;
//! use mwel_compiler::Compiler;
//!
//! let mut errors = ErrorCollector::new();
//! let tokens = Lexer::new(&mut errors).tokenize("local x = 1\n");
//! let module = Parser::parse(tokens, &mut errors).unwrap();
//! let ops = Compiler::new().compile(&module);
//! assert_eq!(2, ops.len());
//! ```

mod expr;
mod op;
mod render;
mod scope;
mod stmt;
mod value;

pub use op::{
    binary_op_code, comparison_op_code, unary_op_code, CallArgsOps, ClauseOps, Op, OpKind, OpList,
};
pub use render::render_ops;
pub use value::{ConstValue, ValueKind};

use std::sync::Arc;

use mwel_ast::{Expr, Module};
use mwel_position_tracking::{Position, SourceLocation};
use scope::{NameResolver, Resolution};
use tracing::debug;

/// The op-list compiler.
#[derive(Default)]
pub struct Compiler {
    op_lists: Vec<OpList>,
    resolver: NameResolver,
    /// Expression-only mode: identifiers lower to `LOAD_NAME` with no scope
    /// resolution.
    plain_names: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    /// Compile an MWEL module into its op-list.
    pub fn compile(mut self, module: &Module) -> OpList {
        self.plain_names = false;
        let ops = self.with_op_list(|compiler| {
            compiler.with_scope(|compiler| {
                compiler.compile_stmt_list(&module.statements, &[]);
            });
        });
        debug_assert!(self.op_lists.is_empty());
        debug_assert!(self.resolver.is_balanced());
        debug!(ops = ops.len(), "compiled module");
        ops
    }

    /// Compile a standalone JEL expression. Names stay unresolved
    /// (`LOAD_NAME`): the substrate language has no binding forms.
    pub fn compile_expression(mut self, expr: &Expr) -> OpList {
        self.plain_names = true;
        let ops = self.with_op_list(|compiler| compiler.emit_expr(expr));
        debug_assert!(self.op_lists.is_empty());
        ops
    }

    /// Append to the innermost open op-list.
    pub(crate) fn emit(&mut self, op: Op) {
        if let Some(list) = self.op_lists.last_mut() {
            list.push(op);
        } else {
            debug_assert!(false, "emit outside any open op-list");
        }
    }

    /// Run `f` against a fresh op-list and hand the completed list back.
    pub(crate) fn with_op_list(&mut self, f: impl FnOnce(&mut Self)) -> OpList {
        self.op_lists.push(OpList::new());
        f(self);
        self.op_lists.pop().unwrap_or_default()
    }

    pub(crate) fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.resolver.push_scope();
        f(self);
        self.resolver.pop_scope();
    }

    /// Compile a function body: fresh op-list, fresh innermost scope, and an
    /// open closure frame collecting captures. Argument installation happens
    /// inside `f`, in reverse order, before the body's own ops.
    pub(crate) fn compile_function_body(
        &mut self,
        f: impl FnOnce(&mut Self),
    ) -> (OpList, Vec<(Arc<str>, i32)>) {
        let mut closure = Vec::new();
        let body = self.with_op_list(|compiler| {
            compiler.resolver.push_scope();
            compiler.resolver.push_closure();
            f(compiler);
            closure = compiler.resolver.pop_closure();
            compiler.resolver.pop_scope();
        });
        (body, closure)
    }

    /// Declare a new local and emit its `INIT_LOCAL`.
    pub(crate) fn emit_new_local(&mut self, name: &Arc<str>, position: Position) {
        self.resolver.declare(name);
        self.emit(Op::new(OpKind::InitLocal(name.clone()), position));
    }

    pub(crate) fn emit_load_name(&mut self, name: &Arc<str>, location: SourceLocation) {
        if self.plain_names {
            self.emit(Op::new(OpKind::LoadName(name.clone()), location));
            return;
        }
        let kind = match self.resolver.resolve(name) {
            Resolution::Global => OpKind::LoadGlobal(name.clone()),
            Resolution::Local => OpKind::LoadLocal(name.clone()),
            Resolution::Nonlocal(depth) => OpKind::LoadNonlocal { name: name.clone(), depth },
            Resolution::Closure => OpKind::LoadClosure(name.clone()),
        };
        self.emit(Op::new(kind, location));
    }

    pub(crate) fn emit_store_name(&mut self, name: &Arc<str>, location: SourceLocation) {
        let kind = match self.resolver.resolve(name) {
            Resolution::Global => OpKind::StoreGlobal(name.clone()),
            Resolution::Local => OpKind::StoreLocal(name.clone()),
            Resolution::Nonlocal(depth) => OpKind::StoreNonlocal { name: name.clone(), depth },
            Resolution::Closure => OpKind::StoreClosure(name.clone()),
        };
        self.emit(Op::new(kind, location));
    }
}
