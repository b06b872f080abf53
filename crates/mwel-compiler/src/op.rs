//! The op-list: `(opcode, location, args)` tuples, possibly nested.
//!
//! Sub-compilations (call arguments, short-circuit operands, clause and
//! function bodies) are embedded as arguments of the op that consumes them,
//! so the stream needs no forward jumps.

use std::sync::Arc;

use indexmap::IndexMap;
use mwel_ast::{BinaryOp, ComparisonOp, UnaryOp};
use mwel_position_tracking::SourceLocation;
use serde::{Deserialize, Serialize};

use crate::value::ConstValue;

/// An ordered sequence of ops; the unit of nesting.
pub type OpList = Vec<Op>;

/// Compiled call arguments: one op-list per argument, positional or named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallArgsOps {
    Positional(Vec<OpList>),
    Named(IndexMap<Arc<str>, OpList>),
}

impl CallArgsOps {
    pub fn len(&self) -> usize {
        match self {
            CallArgsOps::Positional(args) => args.len(),
            CallArgsOps::Named(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One compiled clause of a `CALL_COMPOUND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseOps {
    pub args: CallArgsOps,
    pub num_locals: usize,
    pub body: OpList,
}

/// An operation with its opcode-specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    /// Attach the unit-like tag to the number on top of the stack.
    ApplyTag(Arc<str>),
    BinaryOp(BinaryOp),
    BuildArray(usize),
    /// Keys ride as the argument; the values are on the stack, one per key,
    /// in insertion order.
    BuildObject(Vec<Arc<str>>),
    /// start, stop, step (null when absent) on the stack.
    BuildRangeArray,
    CallCompound { function_name: Arc<str>, clauses: Vec<ClauseOps> },
    CallFunction(CallArgsOps),
    CallSimple(CallArgsOps),
    /// `ops` and one operand op-list per comparison position; the runtime
    /// evaluates lazily so a failed link short-circuits.
    CompareOp { ops: Vec<ComparisonOp>, operands: Vec<OpList> },
    ConcatArrays(usize),
    DupTop,
    DupTopTwo,
    /// Bind the top of stack as a fresh local.
    InitLocal(Arc<str>),
    LoadAttr(Arc<str>),
    /// Like `LoadAttr` but produces an l-value reference, not the value.
    LoadAttrRef(Arc<str>),
    LoadClosure(Arc<str>),
    LoadConst(ConstValue),
    LoadGlobal(Arc<str>),
    LoadLocal(Arc<str>),
    /// Unresolved-name form used by the expression-only entry point.
    LoadName(Arc<str>),
    LoadNonlocal { name: Arc<str>, depth: usize },
    LoadSubscr,
    LogicalAnd { operands: Vec<OpList> },
    LogicalOr { operands: Vec<OpList> },
    /// `closure` pairs each captured name with its signed relative depth,
    /// in capture order.
    MakeFunction { num_args: usize, body: OpList, closure: Vec<(Arc<str>, i32)> },
    ReturnValue,
    RotThree,
    RotTwo,
    StoreAttr(Arc<str>),
    StoreClosure(Arc<str>),
    StoreGlobal(Arc<str>),
    StoreLocal(Arc<str>),
    StoreNonlocal { name: Arc<str>, depth: usize },
    StoreSubscr,
    UnaryOp(UnaryOp),
}

impl OpKind {
    /// The conventional opcode name.
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::ApplyTag(_) => "APPLY_TAG",
            OpKind::BinaryOp(_) => "BINARY_OP",
            OpKind::BuildArray(_) => "BUILD_ARRAY",
            OpKind::BuildObject(_) => "BUILD_OBJECT",
            OpKind::BuildRangeArray => "BUILD_RANGE_ARRAY",
            OpKind::CallCompound { .. } => "CALL_COMPOUND",
            OpKind::CallFunction(_) => "CALL_FUNCTION",
            OpKind::CallSimple(_) => "CALL_SIMPLE",
            OpKind::CompareOp { .. } => "COMPARE_OP",
            OpKind::ConcatArrays(_) => "CONCAT_ARRAYS",
            OpKind::DupTop => "DUP_TOP",
            OpKind::DupTopTwo => "DUP_TOP_TWO",
            OpKind::InitLocal(_) => "INIT_LOCAL",
            OpKind::LoadAttr(_) => "LOAD_ATTR",
            OpKind::LoadAttrRef(_) => "LOAD_ATTR_REF",
            OpKind::LoadClosure(_) => "LOAD_CLOSURE",
            OpKind::LoadConst(_) => "LOAD_CONST",
            OpKind::LoadGlobal(_) => "LOAD_GLOBAL",
            OpKind::LoadLocal(_) => "LOAD_LOCAL",
            OpKind::LoadName(_) => "LOAD_NAME",
            OpKind::LoadNonlocal { .. } => "LOAD_NONLOCAL",
            OpKind::LoadSubscr => "LOAD_SUBSCR",
            OpKind::LogicalAnd { .. } => "LOGICAL_AND",
            OpKind::LogicalOr { .. } => "LOGICAL_OR",
            OpKind::MakeFunction { .. } => "MAKE_FUNCTION",
            OpKind::ReturnValue => "RETURN_VALUE",
            OpKind::RotThree => "ROT_THREE",
            OpKind::RotTwo => "ROT_TWO",
            OpKind::StoreAttr(_) => "STORE_ATTR",
            OpKind::StoreClosure(_) => "STORE_CLOSURE",
            OpKind::StoreGlobal(_) => "STORE_GLOBAL",
            OpKind::StoreLocal(_) => "STORE_LOCAL",
            OpKind::StoreNonlocal { .. } => "STORE_NONLOCAL",
            OpKind::StoreSubscr => "STORE_SUBSCR",
            OpKind::UnaryOp(_) => "UNARY_OP",
        }
    }
}

/// One emitted operation. `location` is the source position the op was
/// generated from; ops lowered from multi-operator nodes keep one position
/// per operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub kind: OpKind,
    pub location: SourceLocation,
}

impl Op {
    pub fn new(kind: OpKind, location: impl Into<SourceLocation>) -> Self {
        Op { kind, location: location.into() }
    }
}

/// Stable integer code for a binary operator, assigned by sorting the
/// operator names.
pub fn binary_op_code(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mod => 0,
        BinaryOp::Mul => 1,
        BinaryOp::Pow => 2,
        BinaryOp::Add => 3,
        BinaryOp::Sub => 4,
        BinaryOp::Div => 5,
    }
}

/// Stable integer code for a unary operator.
pub fn unary_op_code(op: UnaryOp) -> u8 {
    match op {
        UnaryOp::Plus => 0,
        UnaryOp::Minus => 1,
        UnaryOp::Not => 2,
    }
}

/// Stable integer code for a comparison operator.
pub fn comparison_op_code(op: ComparisonOp) -> u8 {
    match op {
        ComparisonOp::Ne => 0,
        ComparisonOp::Lt => 1,
        ComparisonOp::Le => 2,
        ComparisonOp::Eq => 3,
        ComparisonOp::Gt => 4,
        ComparisonOp::Ge => 5,
        ComparisonOp::In => 6,
        ComparisonOp::NotIn => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn op_codes_follow_sorted_names() {
        // "%" < "*" < "**" < "+" < "-" < "/"
        let mut binary: Vec<(&str, u8)> = [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::Mod,
            BinaryOp::Pow,
        ]
        .into_iter()
        .map(|op| (op.symbol(), binary_op_code(op)))
        .collect();
        binary.sort_by_key(|(symbol, _)| *symbol);
        let codes: Vec<u8> = binary.iter().map(|(_, code)| *code).collect();
        assert_eq!(vec![0, 1, 2, 3, 4, 5], codes);

        let mut comparison: Vec<(&str, u8)> = [
            ComparisonOp::Lt,
            ComparisonOp::Le,
            ComparisonOp::Gt,
            ComparisonOp::Ge,
            ComparisonOp::Ne,
            ComparisonOp::Eq,
            ComparisonOp::In,
            ComparisonOp::NotIn,
        ]
        .into_iter()
        .map(|op| (op.symbol(), comparison_op_code(op)))
        .collect();
        comparison.sort_by_key(|(symbol, _)| *symbol);
        let codes: Vec<u8> = comparison.iter().map(|(_, code)| *code).collect();
        assert_eq!(vec![0, 1, 2, 3, 4, 5, 6, 7], codes);
    }
}
