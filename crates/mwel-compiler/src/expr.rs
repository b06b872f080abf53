//! Expression lowering.

use bigdecimal::ToPrimitive;
use mwel_ast::{ArrayItem, CallArgs, Expr, ExprKind};
use mwel_position_tracking::SourceLocation;

use crate::op::{CallArgsOps, Op, OpKind};
use crate::value::ConstValue;
use crate::Compiler;

impl Compiler {
    pub(crate) fn emit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Number { value, tag } => {
                let value = value.to_f64().unwrap_or(f64::NAN);
                self.emit(Op::new(OpKind::LoadConst(ConstValue::Number(value)), expr.location.clone()));
                if let Some(tag) = tag {
                    self.emit(Op::new(OpKind::ApplyTag(tag.clone()), expr.location.clone()));
                }
            }
            ExprKind::String(value) => {
                self.emit(Op::new(OpKind::LoadConst(ConstValue::String(value.clone())), expr.location.clone()));
            }
            ExprKind::Boolean(value) => {
                self.emit(Op::new(OpKind::LoadConst(ConstValue::Boolean(*value)), expr.location.clone()));
            }
            ExprKind::Null => {
                self.emit(Op::new(OpKind::LoadConst(ConstValue::Null), expr.location.clone()));
            }
            ExprKind::Identifier(name) => {
                self.emit_load_name(name, expr.location.clone());
            }
            ExprKind::Array(items) => self.emit_array(items, &expr.location),
            ExprKind::Object(items) => {
                for value in items.values() {
                    self.emit_expr(value);
                }
                let keys = items.keys().cloned().collect();
                self.emit(Op::new(OpKind::BuildObject(keys), expr.location.clone()));
            }
            ExprKind::Unary { op, operand } => {
                self.emit_expr(operand);
                self.emit(Op::new(OpKind::UnaryOp(*op), expr.location.clone()));
            }
            ExprKind::Binary { op, operands } => {
                self.emit_expr(&operands[0]);
                self.emit_expr(&operands[1]);
                self.emit(Op::new(OpKind::BinaryOp(*op), expr.location.clone()));
            }
            ExprKind::Or { operands, .. } => {
                let operands = self.compile_operand_lists(operands);
                self.emit(Op::new(OpKind::LogicalOr { operands }, expr.location.clone()));
            }
            ExprKind::And { operands, .. } => {
                let operands = self.compile_operand_lists(operands);
                self.emit(Op::new(OpKind::LogicalAnd { operands }, expr.location.clone()));
            }
            ExprKind::Comparison { ops, operands, .. } => {
                let operands = self.compile_operand_lists(operands);
                self.emit(Op::new(
                    OpKind::CompareOp { ops: ops.clone(), operands },
                    expr.location.clone(),
                ));
            }
            ExprKind::Call { target, args } => {
                self.emit_expr(target);
                let args = self.compile_call_args(args);
                self.emit(Op::new(OpKind::CallFunction(args), expr.location.clone()));
            }
            ExprKind::Subscript { target, index } => {
                self.emit_expr(target);
                self.emit_expr(index);
                self.emit(Op::new(OpKind::LoadSubscr, expr.location.clone()));
            }
            ExprKind::Attribute { target, name } => {
                self.emit_expr(target);
                self.emit(Op::new(OpKind::LoadAttr(name.clone()), expr.location.clone()));
            }
            ExprKind::AttributeReference { target, name } => {
                self.emit_expr(target);
                self.emit(Op::new(OpKind::LoadAttrRef(name.clone()), expr.location.clone()));
            }
            ExprKind::Function { args, body } => {
                self.emit_function_expr(args, body, &expr.location);
            }
        }
    }

    /// Each operand compiled into its own op-list, for ops whose runtime
    /// evaluates operands lazily.
    pub(crate) fn compile_operand_lists(&mut self, operands: &[Expr]) -> Vec<crate::op::OpList> {
        operands
            .iter()
            .map(|operand| self.with_op_list(|compiler| compiler.emit_expr(operand)))
            .collect()
    }

    pub(crate) fn compile_call_args(&mut self, args: &CallArgs) -> CallArgsOps {
        match args {
            CallArgs::Positional(args) => CallArgsOps::Positional(self.compile_operand_lists(args)),
            CallArgs::Named(args) => CallArgsOps::Named(
                args.iter()
                    .map(|(name, value)| {
                        let ops = self.with_op_list(|compiler| compiler.emit_expr(value));
                        (name.clone(), ops)
                    })
                    .collect(),
            ),
        }
    }

    /// Array literals. A plain array is values plus `BUILD_ARRAY`. Range
    /// items build their own array segment, and a mixed literal
    /// concatenates its segments.
    fn emit_array(&mut self, items: &[ArrayItem], location: &SourceLocation) {
        let has_range = items.iter().any(|item| matches!(item, ArrayItem::Range(_)));
        if !has_range {
            for item in items {
                if let ArrayItem::Expr(expr) = item {
                    self.emit_expr(expr);
                }
            }
            self.emit(Op::new(OpKind::BuildArray(items.len()), location.clone()));
            return;
        }

        let mut segments = 0usize;
        let mut run = 0usize;
        for item in items {
            match item {
                ArrayItem::Expr(expr) => {
                    self.emit_expr(expr);
                    run += 1;
                }
                ArrayItem::Range(range) => {
                    if run > 0 {
                        self.emit(Op::new(OpKind::BuildArray(run), location.clone()));
                        segments += 1;
                        run = 0;
                    }
                    self.emit_expr(&range.start);
                    self.emit_expr(&range.stop);
                    match &range.step {
                        Some(step) => self.emit_expr(step),
                        None => self.emit(Op::new(OpKind::LoadConst(ConstValue::Null), range.position)),
                    }
                    self.emit(Op::new(OpKind::BuildRangeArray, range.position));
                    segments += 1;
                }
            }
        }
        if run > 0 {
            self.emit(Op::new(OpKind::BuildArray(run), location.clone()));
            segments += 1;
        }
        if segments > 1 {
            self.emit(Op::new(OpKind::ConcatArrays(segments), location.clone()));
        }
    }
}
