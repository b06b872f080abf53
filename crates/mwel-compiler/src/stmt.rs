//! Statement lowering, including the assignment and function forms.

use mwel_ast::{Expr, ExprKind, Name, Stmt, StmtKind};
use mwel_position_tracking::{Position, SourceLocation};
use tracing::debug;

use crate::op::{ClauseOps, Op, OpKind};
use crate::value::ConstValue;
use crate::Compiler;

impl Compiler {
    pub(crate) fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Local { name, value } => {
                self.emit_expr(value);
                self.emit_new_local(&name.name, stmt.location.first());
            }
            StmtKind::ChainedAssignment { targets, value } => {
                self.emit_chained_assignment(targets, value, &stmt.location);
            }
            StmtKind::AugmentedAssignment { target, op, value } => {
                self.emit_augmented_assignment(target, *op, value, &stmt.location);
            }
            StmtKind::SimpleCall(call) => {
                let ExprKind::Call { target, args } = &call.kind else {
                    debug_assert!(false, "simple call statement without a call expression");
                    return;
                };
                self.emit_expr(target);
                let args = self.compile_call_args(args);
                self.emit(Op::new(OpKind::CallSimple(args), stmt.location.clone()));
            }
            StmtKind::CompoundCall { function_name, clauses } => {
                let clauses: Vec<ClauseOps> = clauses
                    .iter()
                    .map(|clause| {
                        let args = self.compile_call_args(&clause.args);
                        let body = self.with_op_list(|compiler| {
                            compiler.with_scope(|compiler| {
                                compiler.compile_stmt_list(&clause.body, &clause.local_names);
                            });
                        });
                        ClauseOps { args, num_locals: clause.local_names.len(), body }
                    })
                    .collect();
                self.emit(Op::new(
                    OpKind::CallCompound { function_name: function_name.clone(), clauses },
                    stmt.location.clone(),
                ));
            }
            StmtKind::Function { name, args, body, local } => {
                if *local {
                    // Reserve the local before the body compiles so
                    // recursive self-reference resolves onto the enclosing
                    // scope instead of a global.
                    self.emit(Op::new(OpKind::LoadConst(ConstValue::Null), stmt.location.clone()));
                    self.emit_new_local(&name.name, stmt.location.first());
                }
                let (body_ops, closure) = self.compile_function_body(|compiler| {
                    compiler.compile_stmt_list(body, args);
                });
                debug!(name = &*name.name, captures = closure.len(), "compiled function");
                self.emit(Op::new(
                    OpKind::MakeFunction { num_args: args.len(), body: body_ops, closure },
                    stmt.location.clone(),
                ));
                self.emit_store_name(&name.name, stmt.location.clone());
            }
            StmtKind::Return { value } => {
                match value {
                    Some(value) => self.emit_expr(value),
                    None => {
                        self.emit(Op::new(OpKind::LoadConst(ConstValue::Null), stmt.location.clone()));
                    }
                }
                self.emit(Op::new(OpKind::ReturnValue, stmt.location.clone()));
            }
        }
    }

    /// Install clause/function locals (in reverse, matching the runtime's
    /// right-to-left argument pops), then the statements.
    pub(crate) fn compile_stmt_list(&mut self, stmts: &[Stmt], local_names: &[Name]) {
        for name in local_names.iter().rev() {
            self.emit_new_local(&name.name, name.position);
        }
        for stmt in stmts {
            self.emit_stmt(stmt);
        }
    }

    /// A function expression: its single-expression body compiles into a
    /// fresh op-list ending in `RETURN_VALUE`.
    pub(crate) fn emit_function_expr(
        &mut self,
        args: &[Name],
        body: &Expr,
        location: &SourceLocation,
    ) {
        let (body_ops, closure) = self.compile_function_body(|compiler| {
            for name in args.iter().rev() {
                compiler.emit_new_local(&name.name, name.position);
            }
            compiler.emit_expr(body);
            compiler.emit(Op::new(OpKind::ReturnValue, body.location.clone()));
        });
        self.emit(Op::new(
            OpKind::MakeFunction { num_args: args.len(), body: body_ops, closure },
            location.clone(),
        ));
    }

    /// Evaluate the right-hand side once, then store through every target
    /// right-to-left, duplicating the value for all but the leftmost.
    /// `location` carries one position per `=`, pairing each target with
    /// the operator that follows it.
    fn emit_chained_assignment(
        &mut self,
        targets: &[Expr],
        value: &Expr,
        location: &SourceLocation,
    ) {
        self.emit_expr(value);
        let positions: Vec<Position> = match location {
            SourceLocation::Spread(positions) => positions.clone(),
            SourceLocation::Single(position) => vec![*position],
        };
        debug_assert_eq!(positions.len(), targets.len());

        for (index, (target, position)) in targets.iter().zip(positions).enumerate().rev() {
            if index > 0 {
                self.emit(Op::new(OpKind::DupTop, position));
            }
            self.emit_store_target(target, position);
        }
    }

    fn emit_store_target(&mut self, target: &Expr, position: Position) {
        match &target.kind {
            ExprKind::Subscript { target, index } => {
                self.emit_expr(target);
                self.emit_expr(index);
                self.emit(Op::new(OpKind::StoreSubscr, position));
            }
            ExprKind::Attribute { target, name } => {
                self.emit_expr(target);
                self.emit(Op::new(OpKind::StoreAttr(name.clone()), position));
            }
            ExprKind::Identifier(name) => {
                self.emit_store_name(name, SourceLocation::Single(position));
            }
            _ => debug_assert!(false, "assignment target is not a store form"),
        }
    }

    /// Read-modify-write. The target's container and key are evaluated
    /// once; stack shuffling puts the computed value back under them for
    /// the store.
    fn emit_augmented_assignment(
        &mut self,
        target: &Expr,
        op: mwel_ast::BinaryOp,
        value: &Expr,
        location: &SourceLocation,
    ) {
        match &target.kind {
            ExprKind::Subscript { target: container, index } => {
                self.emit_expr(container);
                self.emit_expr(index);
                self.emit(Op::new(OpKind::DupTopTwo, location.clone()));
                self.emit(Op::new(OpKind::LoadSubscr, target.location.clone()));
            }
            ExprKind::Attribute { target: container, name } => {
                self.emit_expr(container);
                self.emit(Op::new(OpKind::DupTop, location.clone()));
                self.emit(Op::new(OpKind::LoadAttr(name.clone()), target.location.clone()));
            }
            ExprKind::Identifier(_) => self.emit_expr(target),
            _ => debug_assert!(false, "augmented target is not a store form"),
        }

        self.emit_expr(value);
        self.emit(Op::new(OpKind::BinaryOp(op), location.clone()));

        match &target.kind {
            ExprKind::Subscript { .. } => {
                self.emit(Op::new(OpKind::RotThree, location.clone()));
                self.emit(Op::new(OpKind::StoreSubscr, location.clone()));
            }
            ExprKind::Attribute { name, .. } => {
                self.emit(Op::new(OpKind::RotTwo, location.clone()));
                self.emit(Op::new(OpKind::StoreAttr(name.clone()), location.clone()));
            }
            ExprKind::Identifier(name) => {
                self.emit_store_name(name, location.clone());
            }
            _ => {}
        }
    }
}
