//! Statement parsing: modules, assignments, call statements, functions.

use std::sync::Arc;

use mwel_ast::{BinaryOp, CallArgs, Clause, Expr, ExprKind, Module, Name, Stmt, StmtKind};
use mwel_lexer::{AugAssignOp, TokenKind};
use mwel_position_tracking::SourceLocation;
use tracing::trace;

use crate::error::{ParseError, ParseResult};
use crate::Parser;

/// Tokens that may close a statement list without a separating newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEnd {
    /// Module level: only end of input terminates.
    Input,
    /// Function body: `end`.
    End,
    /// Compound-call clause body: `end` or `else`.
    EndOrElse,
}

impl BlockEnd {
    fn matches(self, kind: &TokenKind) -> bool {
        match self {
            BlockEnd::Input => false,
            BlockEnd::End => matches!(kind, TokenKind::End),
            BlockEnd::EndOrElse => matches!(kind, TokenKind::End | TokenKind::Else),
        }
    }
}

impl Parser<'_> {
    pub(crate) fn parse_module(&mut self) -> ParseResult<Module> {
        let statements = self.parse_stmt_list(BlockEnd::Input)?;
        match self.cursor.peek() {
            None => Ok(Module::new(statements)),
            Some(token) => Err(ParseError::UnexpectedToken(token.clone())),
        }
    }

    /// Newline-separated statements until end of input or a block
    /// terminator. The terminator itself is left for the caller.
    fn parse_stmt_list(&mut self, end: BlockEnd) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            self.cursor.eat_newlines();
            match self.cursor.peek_kind() {
                None => break,
                Some(kind) if end.matches(kind) => break,
                _ => {}
            }

            let stmt = self.parse_stmt()?;
            trace!(?stmt, "parsed statement");
            statements.push(stmt);

            if self.cursor.eat_newlines() {
                continue;
            }
            match self.cursor.peek_kind() {
                None => break,
                Some(kind) if end.matches(kind) => break,
                Some(_) => {
                    let token = self.cursor.next_token()?;
                    return Err(ParseError::UnexpectedToken(token));
                }
            }
        }
        Ok(statements)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.cursor.peek_kind() {
            Some(TokenKind::Local) => self.parse_local_stmt(),
            Some(TokenKind::Function) => self.parse_function_stmt(false),
            Some(TokenKind::Return) => self.parse_return_stmt(),
            _ => self.parse_expression_stmt(),
        }
    }

    /// `local name = value`, or `local function ...`.
    fn parse_local_stmt(&mut self) -> ParseResult<Stmt> {
        let local_token = self.cursor.next_token()?;
        if matches!(self.cursor.peek_kind(), Some(TokenKind::Function)) {
            return self.parse_function_stmt(true);
        }
        let name = self.expect_identifier()?;
        self.cursor.expect(|k| matches!(k, TokenKind::Assign))?;
        let value = self.parse_expr()?;
        Ok(Stmt::new(StmtKind::Local { name, value }, local_token.position))
    }

    /// `function name(args): body end`.
    fn parse_function_stmt(&mut self, local: bool) -> ParseResult<Stmt> {
        let function_token = self.cursor.next_token()?;
        let name = self.expect_identifier()?;
        self.cursor.expect(|k| matches!(k, TokenKind::LeftParen))?;
        let args = self.parse_function_arg_names()?;
        self.cursor.expect(|k| matches!(k, TokenKind::Colon))?;
        let body = self.parse_stmt_list(BlockEnd::End)?;
        self.cursor.expect(|k| matches!(k, TokenKind::End))?;
        Ok(Stmt::new(
            StmtKind::Function { name, args, body, local },
            function_token.position,
        ))
    }

    fn parse_return_stmt(&mut self) -> ParseResult<Stmt> {
        let return_token = self.cursor.next_token()?;
        let value = match self.cursor.peek_kind() {
            None | Some(TokenKind::Newline) | Some(TokenKind::End) | Some(TokenKind::Else) => None,
            _ => Some(self.parse_expr()?),
        };
        Ok(Stmt::new(StmtKind::Return { value }, return_token.position))
    }

    /// Statements that begin with an expression: assignments, simple calls,
    /// and compound calls.
    fn parse_expression_stmt(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expr()?;
        match self.cursor.peek_kind() {
            Some(TokenKind::Assign) => self.parse_chained_assignment(expr),
            Some(TokenKind::AugAssign(op)) => {
                let op = *op;
                self.parse_augmented_assignment(expr, op)
            }
            Some(TokenKind::Colon) | Some(TokenKind::RightArrow) => {
                self.parse_compound_call(expr)
            }
            _ => {
                if matches!(expr.kind, ExprKind::Call { .. }) {
                    let location = expr.location.clone();
                    return Ok(Stmt::new(StmtKind::SimpleCall(expr), location));
                }
                match self.cursor.advance() {
                    Some(token) => Err(ParseError::UnexpectedToken(token)),
                    None => Err(ParseError::UnexpectedEnd),
                }
            }
        }
    }

    /// `a = b = c = value`: targets collect in source order, each paired
    /// with the position of the `=` that follows it.
    fn parse_chained_assignment(&mut self, first: Expr) -> ParseResult<Stmt> {
        let mut targets = Vec::new();
        let mut positions = Vec::new();
        let mut current = first;
        while let Some(assign) = self.cursor.eat(|k| matches!(k, TokenKind::Assign)) {
            if !current.is_assignment_target() {
                return Err(ParseError::UnexpectedToken(assign));
            }
            targets.push(current);
            positions.push(assign.position);
            current = self.parse_expr()?;
        }
        Ok(Stmt::new(
            StmtKind::ChainedAssignment { targets, value: current },
            SourceLocation::Spread(positions),
        ))
    }

    fn parse_augmented_assignment(&mut self, target: Expr, op: AugAssignOp) -> ParseResult<Stmt> {
        let op_token = self.cursor.next_token()?;
        if !target.is_assignment_target() {
            return Err(ParseError::UnexpectedToken(op_token));
        }
        let op = match op {
            AugAssignOp::Add => BinaryOp::Add,
            AugAssignOp::Sub => BinaryOp::Sub,
            AugAssignOp::Mul => BinaryOp::Mul,
            AugAssignOp::Div => BinaryOp::Div,
            AugAssignOp::Mod => BinaryOp::Mod,
            AugAssignOp::Pow => BinaryOp::Pow,
        };
        let value = self.parse_expr()?;
        Ok(Stmt::new(
            StmtKind::AugmentedAssignment { target, op, value },
            op_token.position,
        ))
    }

    /// Compound call: head clause, any number of `else head(...)` clauses,
    /// an optional bare `else:` clause, one `end`.
    ///
    /// `function_name` concatenates every head identifier plus `:`; the
    /// bare `else:` contributes an empty head, leaving a trailing `::`.
    fn parse_compound_call(&mut self, head: Expr) -> ParseResult<Stmt> {
        let location = head.location.clone();
        let (head_name, head_args) = self.destructure_head(head)?;

        let mut function_name = String::new();
        let mut clauses = Vec::new();
        let mut pending_args = head_args;
        function_name.push_str(&head_name);
        function_name.push(':');

        loop {
            let local_names = if self.cursor.eat(|k| matches!(k, TokenKind::RightArrow)).is_some()
            {
                self.parse_clause_local_names()?
            } else {
                Vec::new()
            };
            self.cursor.expect(|k| matches!(k, TokenKind::Colon))?;
            let body = self.parse_stmt_list(BlockEnd::EndOrElse)?;
            clauses.push(Clause { args: pending_args, local_names, body });

            let token = self.cursor.next_token()?;
            match token.kind {
                TokenKind::End => break,
                TokenKind::Else => {
                    if matches!(self.cursor.peek_kind(), Some(TokenKind::Colon)) {
                        // Bare else: empty head, must be the final clause.
                        function_name.push(':');
                        self.cursor.next_token()?;
                        let body = self.parse_stmt_list(BlockEnd::End)?;
                        clauses.push(Clause {
                            args: CallArgs::empty(),
                            local_names: Vec::new(),
                            body,
                        });
                        self.cursor.expect(|k| matches!(k, TokenKind::End))?;
                        break;
                    }
                    let name = self.expect_identifier()?;
                    self.cursor.expect(|k| matches!(k, TokenKind::LeftParen))?;
                    pending_args = self.parse_call_args()?;
                    function_name.push_str(&name.name);
                    function_name.push(':');
                }
                _ => return Err(ParseError::UnexpectedToken(token)),
            }
        }

        Ok(Stmt::new(
            StmtKind::CompoundCall { function_name: function_name.into(), clauses },
            location,
        ))
    }

    /// Split a compound-call head into its function name and arguments.
    /// A non-identifier target is reported and replaced by an empty name so
    /// the clause structure survives for later stages.
    fn destructure_head(&mut self, head: Expr) -> ParseResult<(Arc<str>, CallArgs)> {
        match head.kind {
            ExprKind::Call { target, args } => match target.kind {
                ExprKind::Identifier(name) => Ok((name, args)),
                _ => {
                    self.report(ParseError::HeadNotIdentifier { position: target.position() });
                    Ok(("".into(), args))
                }
            },
            _ => match self.cursor.advance() {
                Some(token) => Err(ParseError::UnexpectedToken(token)),
                None => Err(ParseError::UnexpectedEnd),
            },
        }
    }

    /// The `-> name, name` locals of a compound-call clause.
    fn parse_clause_local_names(&mut self) -> ParseResult<Vec<Name>> {
        let mut names = vec![self.expect_identifier()?];
        while self.cursor.eat(|k| matches!(k, TokenKind::Comma)).is_some() {
            if matches!(self.cursor.peek_kind(), Some(TokenKind::Colon)) {
                break;
            }
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }
}
