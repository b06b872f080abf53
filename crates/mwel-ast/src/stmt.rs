//! Statement nodes (the MWEL layer).

use std::sync::Arc;

use mwel_position_tracking::SourceLocation;
use serde::{Deserialize, Serialize};

use crate::expr::{CallArgs, Expr, Name};
use crate::ops::BinaryOp;

/// One clause of a compound call: its argument list, the locals introduced
/// by `->`, and the body statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub args: CallArgs,
    pub local_names: Vec<Name>,
    pub body: Vec<Stmt>,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `local name = value` — introduces a fresh local in the enclosing
    /// scope.
    Local { name: Name, value: Expr },
    /// `a = b = c = value`. Targets are kept in source order; the node's
    /// location holds one position per `=`, also in source order.
    /// Assignment itself is right-to-left.
    ChainedAssignment { targets: Vec<Expr>, value: Expr },
    /// `target op= value`.
    AugmentedAssignment { target: Expr, op: BinaryOp, value: Expr },
    /// A bare call in statement position. Always an `ExprKind::Call`.
    SimpleCall(Expr),
    /// A call statement with one body per clause. `function_name` is the
    /// concatenation of every clause head plus `:`; a bare `else:` clause
    /// contributes an empty head, so the name ends in `::`.
    CompoundCall { function_name: Arc<str>, clauses: Vec<Clause> },
    /// `function name(args): body end`, optionally preceded by `local`.
    Function { name: Name, args: Vec<Name>, body: Vec<Stmt>, local: bool },
    Return { value: Option<Expr> },
}

/// A statement node with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: impl Into<SourceLocation>) -> Self {
        Stmt { kind, location: location.into() }
    }
}

/// The root of a parsed MWEL program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub statements: Vec<Stmt>,
}

impl Module {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Module { statements }
    }
}
