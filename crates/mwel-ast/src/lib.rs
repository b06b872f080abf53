//! Abstract syntax tree for the JEL/MWEL front-end.
//!
//! Nodes are built bottom-up by the parser, mutated only to extend the
//! flattened operator sequences of `or`/`and`/comparison chains within a
//! single reduction, and consumed read-only by the compiler. Every node
//! carries a [`SourceLocation`]: a single position, or one position per
//! combining operator for the chained forms.

mod expr;
mod ops;
mod stmt;

pub use expr::{ArrayItem, ArrayItemRange, CallArgs, Expr, ExprKind, Name, ObjectItems};
pub use ops::{BinaryOp, ComparisonOp, UnaryOp};
pub use stmt::{Clause, Module, Stmt, StmtKind};
