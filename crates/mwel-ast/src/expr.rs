//! Expression nodes.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use mwel_position_tracking::{Position, SourceLocation};
use serde::{Deserialize, Serialize};

use crate::ops::{BinaryOp, ComparisonOp, UnaryOp};

/// An identifier together with where it occurred. Used for function
/// argument names and compound-call clause locals, whose positions the
/// compiler needs when it installs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub name: Arc<str>,
    pub position: Position,
}

impl Name {
    pub fn new(name: impl Into<Arc<str>>, position: Position) -> Self {
        Name { name: name.into(), position }
    }
}

/// Object literal items: insertion-ordered, duplicate keys rejected by the
/// parser as a semantic (not structural) error.
pub type ObjectItems = IndexMap<Arc<str>, Expr>;

/// Call arguments: all positional or all named. The parser rejects mixing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallArgs {
    Positional(Vec<Expr>),
    Named(IndexMap<Arc<str>, Expr>),
}

impl CallArgs {
    pub fn empty() -> Self {
        CallArgs::Positional(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            CallArgs::Positional(args) => args.len(),
            CallArgs::Named(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One item of an array literal: a plain expression or a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayItem {
    Expr(Expr),
    Range(ArrayItemRange),
}

/// `start : stop` or `start : stop : step` inside an array literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItemRange {
    pub start: Expr,
    pub stop: Expr,
    pub step: Option<Expr>,
    /// Position of the first `:`.
    pub position: Position,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Number literal with its optional unit-like tag.
    Number { value: BigDecimal, tag: Option<Arc<str>> },
    String(Arc<str>),
    Boolean(bool),
    Null,
    Identifier(Arc<str>),
    Array(Vec<ArrayItem>),
    Object(ObjectItems),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, operands: Box<[Expr; 2]> },
    /// Flattened `or`: never fewer than two operands, and no direct operand
    /// is itself an un-parenthesized `Or`.
    Or { operands: Vec<Expr>, parenthetic: bool },
    /// Flattened `and`, same shape discipline as `Or`.
    And { operands: Vec<Expr>, parenthetic: bool },
    /// Chained comparison: `operands.len() == ops.len() + 1`. The node's
    /// location holds one position per operator. `parenthetic` blocks
    /// further chain extension.
    Comparison { ops: Vec<ComparisonOp>, operands: Vec<Expr>, parenthetic: bool },
    Call { target: Box<Expr>, args: CallArgs },
    Subscript { target: Box<Expr>, index: Box<Expr> },
    Attribute { target: Box<Expr>, name: Arc<str> },
    /// The l-value-capturing form admitted only as a `<-` named argument.
    AttributeReference { target: Box<Expr>, name: Arc<str> },
    /// Function expression: single-expression body, implicit return.
    Function { args: Vec<Name>, body: Box<Expr> },
}

/// An expression node with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, location: impl Into<SourceLocation>) -> Self {
        Expr { kind, location: location.into() }
    }

    /// The position diagnostics should point at.
    pub fn position(&self) -> Position {
        self.location.first()
    }

    /// Whether this expression may appear on the left of an assignment.
    pub fn is_assignment_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
        )
    }

    /// Whether the node was wrapped in parentheses. Only the chain-forming
    /// kinds record this; parentheses are transparent everywhere else.
    pub fn is_parenthetic(&self) -> bool {
        match &self.kind {
            ExprKind::Or { parenthetic, .. }
            | ExprKind::And { parenthetic, .. }
            | ExprKind::Comparison { parenthetic, .. } => *parenthetic,
            _ => false,
        }
    }

    /// Mark a parenthesized chain-forming node so later reductions do not
    /// extend or flatten into it.
    pub fn mark_parenthetic(&mut self) {
        if let ExprKind::Or { parenthetic, .. }
        | ExprKind::And { parenthetic, .. }
        | ExprKind::Comparison { parenthetic, .. } = &mut self.kind
        {
            *parenthetic = true;
        }
    }
}
