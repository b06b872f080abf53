//! Expression parsing: one method per precedence level, lowest first.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use mwel_ast::{
    ArrayItem, ArrayItemRange, BinaryOp, CallArgs, ComparisonOp, Expr, ExprKind, Name, UnaryOp,
};
use mwel_lexer::{Token, TokenKind};
use mwel_position_tracking::{Position, SourceLocation};

use crate::error::{ParseError, ParseResult};
use crate::Parser;

/// One parsed call-argument item, before the all-positional /
/// all-named shape check.
enum ArgItem {
    Positional(Expr),
    Named { name: Arc<str>, value: Expr, op_token: Token, reference: bool },
}

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    /// `or`, left-associative and flattened: `a or b or c` is one node
    /// with three operands and one position per `or`.
    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;
        while let Some(op_token) = self.cursor.eat(|k| matches!(k, TokenKind::Or)) {
            let right = self.parse_and()?;
            expr = extend_flattened(expr, right, op_token.position, FlattenKind::Or);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_not()?;
        while let Some(op_token) = self.cursor.eat(|k| matches!(k, TokenKind::And)) {
            let right = self.parse_not()?;
            expr = extend_flattened(expr, right, op_token.position, FlattenKind::And);
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if let Some(op_token) = self.cursor.eat(|k| matches!(k, TokenKind::Not)) {
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) },
                op_token.position,
            ));
        }
        self.parse_comparison()
    }

    /// Comparisons chain: `a < b <= c` is a single node. A parenthesized
    /// comparison on the left blocks extension, so `(a < b) != c` nests.
    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_additive()?;
        while let Some((op, position)) = self.eat_comparison_op()? {
            let right = self.parse_additive()?;
            expr = match expr {
                Expr {
                    kind: ExprKind::Comparison { mut ops, mut operands, parenthetic: false },
                    location: SourceLocation::Spread(mut positions),
                } => {
                    ops.push(op);
                    operands.push(right);
                    positions.push(position);
                    Expr {
                        kind: ExprKind::Comparison { ops, operands, parenthetic: false },
                        location: SourceLocation::Spread(positions),
                    }
                }
                left => Expr {
                    kind: ExprKind::Comparison {
                        ops: vec![op],
                        operands: vec![left, right],
                        parenthetic: false,
                    },
                    location: SourceLocation::Spread(vec![position]),
                },
            };
        }
        Ok(expr)
    }

    /// Recognize a comparison operator, including the two-token `not in`.
    fn eat_comparison_op(&mut self) -> ParseResult<Option<(ComparisonOp, Position)>> {
        let op = match self.cursor.peek_kind() {
            Some(TokenKind::LessThan) => ComparisonOp::Lt,
            Some(TokenKind::LessThanOrEqual) => ComparisonOp::Le,
            Some(TokenKind::GreaterThan) => ComparisonOp::Gt,
            Some(TokenKind::GreaterThanOrEqual) => ComparisonOp::Ge,
            Some(TokenKind::NotEqual) => ComparisonOp::Ne,
            Some(TokenKind::Equal) => ComparisonOp::Eq,
            Some(TokenKind::In) => ComparisonOp::In,
            Some(TokenKind::Not)
                if matches!(self.cursor.peek_second().map(|t| &t.kind), Some(TokenKind::In)) =>
            {
                let not_token = self.cursor.next_token()?;
                self.cursor.next_token()?;
                return Ok(Some((ComparisonOp::NotIn, not_token.position)));
            }
            _ => return Ok(None),
        };
        let token = self.cursor.next_token()?;
        Ok(Some((op, token.position)))
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.cursor.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            let op_token = self.cursor.next_token()?;
            let right = self.parse_multiplicative()?;
            expr = binary(expr, op, right, op_token.position);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.cursor.peek_kind() {
                Some(TokenKind::Times) => BinaryOp::Mul,
                Some(TokenKind::Divide) => BinaryOp::Div,
                Some(TokenKind::Modulo) => BinaryOp::Mod,
                _ => break,
            };
            let op_token = self.cursor.next_token()?;
            let right = self.parse_unary()?;
            expr = binary(expr, op, right, op_token.position);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.cursor.peek_kind() {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            _ => return self.parse_exponentiation(),
        };
        let op_token = self.cursor.next_token()?;
        let operand = self.parse_unary()?;
        Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, op_token.position))
    }

    /// `**` is right-associative and binds tighter than unary sign on the
    /// left but looser on the right, so `2**-1` is `2**(-1)`.
    fn parse_exponentiation(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if let Some(op_token) = self.cursor.eat(|k| matches!(k, TokenKind::Power)) {
            let exponent = self.parse_unary()?;
            return Ok(binary(base, BinaryOp::Pow, exponent, op_token.position));
        }
        Ok(base)
    }

    /// Calls, subscripts, and attribute accesses, left-associative and
    /// freely interleaved.
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.cursor.peek_kind() {
                Some(TokenKind::LeftParen) => {
                    let lparen = self.cursor.next_token()?;
                    let args = self.parse_call_args()?;
                    expr = Expr::new(
                        ExprKind::Call { target: Box::new(expr), args },
                        lparen.position,
                    );
                }
                Some(TokenKind::LeftBracket) => {
                    let lbracket = self.cursor.next_token()?;
                    let index = self.parse_expr()?;
                    self.cursor.expect(|k| matches!(k, TokenKind::RightBracket))?;
                    expr = Expr::new(
                        ExprKind::Subscript { target: Box::new(expr), index: Box::new(index) },
                        lbracket.position,
                    );
                }
                Some(TokenKind::Dot) => {
                    let dot = self.cursor.next_token()?;
                    let name = self.expect_identifier()?;
                    expr = Expr::new(
                        ExprKind::Attribute { target: Box::new(expr), name: name.name },
                        dot.position,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = match self.cursor.peek() {
            Some(token) => token.clone(),
            None => return Err(ParseError::UnexpectedEnd),
        };
        match token.kind {
            TokenKind::LeftParen => {
                self.cursor.next_token()?;
                let mut inner = self.parse_expr()?;
                self.cursor.expect(|k| matches!(k, TokenKind::RightParen))?;
                inner.mark_parenthetic();
                Ok(inner)
            }
            TokenKind::Number(_) => self.parse_number_literal(),
            TokenKind::String(_) => self.parse_string_literal(),
            TokenKind::True => {
                self.cursor.next_token()?;
                Ok(Expr::new(ExprKind::Boolean(true), token.position))
            }
            TokenKind::False => {
                self.cursor.next_token()?;
                Ok(Expr::new(ExprKind::Boolean(false), token.position))
            }
            TokenKind::Null => {
                self.cursor.next_token()?;
                Ok(Expr::new(ExprKind::Null, token.position))
            }
            TokenKind::Identifier(ref name) => {
                let name = name.clone();
                self.cursor.next_token()?;
                Ok(Expr::new(ExprKind::Identifier(name), token.position))
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expr(),
            _ => Err(ParseError::UnexpectedToken(token)),
        }
    }

    /// The number token's fragments re-assembled into an
    /// arbitrary-precision decimal; the tag rides along separately.
    fn parse_number_literal(&mut self) -> ParseResult<Expr> {
        let token = self.cursor.next_token()?;
        let TokenKind::Number(parts) = &token.kind else {
            return Err(ParseError::UnexpectedToken(token));
        };
        let literal = parts.to_decimal_literal();
        let value = literal.parse::<BigDecimal>().unwrap_or_else(|_| BigDecimal::from(0));
        let tag = parts.has_tag().then(|| parts.tag.clone());
        Ok(Expr::new(ExprKind::Number { value, tag }, token.position))
    }

    /// Adjacent string tokens concatenate into a single literal.
    fn parse_string_literal(&mut self) -> ParseResult<Expr> {
        let first = self.cursor.next_token()?;
        let TokenKind::String(value) = &first.kind else {
            return Err(ParseError::UnexpectedToken(first));
        };
        let mut value = value.to_string();
        while let Some(token) = self.cursor.eat(|k| matches!(k, TokenKind::String(_))) {
            if let TokenKind::String(part) = &token.kind {
                value.push_str(part);
            }
        }
        Ok(Expr::new(ExprKind::String(value.into()), first.position))
    }

    /// `[ item, ... ]` where an item is an expression or a
    /// `start : stop (: step)?` range.
    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        let lbracket = self.cursor.next_token()?;
        let mut items = Vec::new();
        loop {
            if self.cursor.eat(|k| matches!(k, TokenKind::RightBracket)).is_some() {
                break;
            }
            let expr = self.parse_expr()?;
            if let Some(colon) = self.cursor.eat(|k| matches!(k, TokenKind::Colon)) {
                let stop = self.parse_expr()?;
                let step = if self.cursor.eat(|k| matches!(k, TokenKind::Colon)).is_some() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                items.push(ArrayItem::Range(ArrayItemRange {
                    start: expr,
                    stop,
                    step,
                    position: colon.position,
                }));
            } else {
                items.push(ArrayItem::Expr(expr));
            }
            if self.cursor.eat(|k| matches!(k, TokenKind::Comma)).is_none() {
                self.cursor.expect(|k| matches!(k, TokenKind::RightBracket))?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Array(items), lbracket.position))
    }

    /// `{ key: value, ... }` with string or identifier keys. Duplicate keys
    /// are reported but do not break the structure: insertion order is kept
    /// and the later value wins.
    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        let lbrace = self.cursor.next_token()?;
        let mut items: IndexMap<Arc<str>, Expr> = IndexMap::new();
        loop {
            if self.cursor.eat(|k| matches!(k, TokenKind::RightBrace)).is_some() {
                break;
            }
            let key_token = self.cursor.next_token()?;
            let key: Arc<str> = match &key_token.kind {
                TokenKind::Identifier(name) => name.clone(),
                TokenKind::String(value) => value.clone(),
                _ => return Err(ParseError::UnexpectedToken(key_token)),
            };
            self.cursor.expect(|k| matches!(k, TokenKind::Colon))?;
            let value = self.parse_expr()?;
            if items.contains_key(&key) {
                self.report(ParseError::DuplicateKey { key: key.to_string(), token: key_token });
            }
            items.insert(key, value);
            if self.cursor.eat(|k| matches!(k, TokenKind::Comma)).is_none() {
                self.cursor.expect(|k| matches!(k, TokenKind::RightBrace))?;
                break;
            }
        }
        Ok(Expr::new(ExprKind::Object(items), lbrace.position))
    }

    /// `function (args) body end` — single-expression body, implicit
    /// return.
    fn parse_function_expr(&mut self) -> ParseResult<Expr> {
        let function = self.cursor.next_token()?;
        self.cursor.expect(|k| matches!(k, TokenKind::LeftParen))?;
        let args = self.parse_function_arg_names()?;
        let body = self.parse_expr()?;
        self.cursor.expect(|k| matches!(k, TokenKind::End))?;
        Ok(Expr::new(ExprKind::Function { args, body: Box::new(body) }, function.position))
    }

    /// Comma-separated argument names up to and including the `)`.
    pub(crate) fn parse_function_arg_names(&mut self) -> ParseResult<Vec<Name>> {
        let mut names = Vec::new();
        loop {
            if self.cursor.eat(|k| matches!(k, TokenKind::RightParen)).is_some() {
                break;
            }
            names.push(self.expect_identifier()?);
            if self.cursor.eat(|k| matches!(k, TokenKind::Comma)).is_none() {
                self.cursor.expect(|k| matches!(k, TokenKind::RightParen))?;
                break;
            }
        }
        Ok(names)
    }

    /// Call arguments after the `(`: all positional, or all `name = expr` /
    /// `name <- attr` pairs. `<-` values are validated when the `)` is
    /// reached.
    pub(crate) fn parse_call_args(&mut self) -> ParseResult<CallArgs> {
        let mut items = Vec::new();
        let rparen = loop {
            if let Some(rparen) = self.cursor.eat(|k| matches!(k, TokenKind::RightParen)) {
                break rparen;
            }
            items.push(self.parse_arg_item()?);
            if self.cursor.eat(|k| matches!(k, TokenKind::Comma)).is_none() {
                break self.cursor.expect(|k| matches!(k, TokenKind::RightParen))?;
            }
        };
        self.assemble_call_args(items, rparen)
    }

    fn parse_arg_item(&mut self) -> ParseResult<ArgItem> {
        let named = matches!(self.cursor.peek_kind(), Some(TokenKind::Identifier(_)))
            && matches!(
                self.cursor.peek_second().map(|t| &t.kind),
                Some(TokenKind::Assign) | Some(TokenKind::LeftArrow)
            );
        if !named {
            return Ok(ArgItem::Positional(self.parse_expr()?));
        }

        let name = self.expect_identifier()?;
        let op_token = self.cursor.next_token()?;
        let reference = matches!(op_token.kind, TokenKind::LeftArrow);
        let value = self.parse_expr()?;
        Ok(ArgItem::Named { name: name.name, value, op_token, reference })
    }

    /// Enforce the all-positional / all-named shape and resolve `<-`
    /// items into attribute references.
    fn assemble_call_args(&mut self, items: Vec<ArgItem>, rparen: Token) -> ParseResult<CallArgs> {
        let named_call = matches!(items.first(), Some(ArgItem::Named { .. }));
        if !named_call {
            let mut args = Vec::new();
            for item in items {
                match item {
                    ArgItem::Positional(expr) => args.push(expr),
                    ArgItem::Named { op_token, .. } => {
                        self.report(ParseError::MixedArguments(op_token));
                    }
                }
            }
            return Ok(CallArgs::Positional(args));
        }

        let mut args: IndexMap<Arc<str>, Expr> = IndexMap::new();
        let mut bad_reference = false;
        for item in items {
            match item {
                ArgItem::Named { name, value, reference, .. } => {
                    let value = if reference {
                        match into_attribute_reference(value) {
                            Ok(reference) => reference,
                            Err(value) => {
                                bad_reference = true;
                                value
                            }
                        }
                    } else {
                        value
                    };
                    args.insert(name, value);
                }
                ArgItem::Positional(_) => {
                    self.report(ParseError::MixedArguments(rparen.clone()));
                }
            }
        }
        if bad_reference {
            self.report(ParseError::BadAttributeReference(rparen));
        }
        Ok(CallArgs::Named(args))
    }

    pub(crate) fn expect_identifier(&mut self) -> ParseResult<Name> {
        let token = self.cursor.next_token()?;
        match &token.kind {
            TokenKind::Identifier(name) => Ok(Name::new(name.clone(), token.position)),
            _ => Err(ParseError::UnexpectedToken(token)),
        }
    }
}

enum FlattenKind {
    Or,
    And,
}

/// Fold `right` into `left` for `or`/`and`, concatenating operands and
/// operator positions when the left side is a same-kind un-parenthesized
/// node.
fn extend_flattened(left: Expr, right: Expr, position: Position, kind: FlattenKind) -> Expr {
    match (kind, left) {
        (
            FlattenKind::Or,
            Expr {
                kind: ExprKind::Or { mut operands, parenthetic: false },
                location: SourceLocation::Spread(mut positions),
            },
        ) => {
            operands.push(right);
            positions.push(position);
            Expr {
                kind: ExprKind::Or { operands, parenthetic: false },
                location: SourceLocation::Spread(positions),
            }
        }
        (
            FlattenKind::And,
            Expr {
                kind: ExprKind::And { mut operands, parenthetic: false },
                location: SourceLocation::Spread(mut positions),
            },
        ) => {
            operands.push(right);
            positions.push(position);
            Expr {
                kind: ExprKind::And { operands, parenthetic: false },
                location: SourceLocation::Spread(positions),
            }
        }
        (kind, left) => {
            let operands = vec![left, right];
            let location = SourceLocation::Spread(vec![position]);
            let kind = match kind {
                FlattenKind::Or => ExprKind::Or { operands, parenthetic: false },
                FlattenKind::And => ExprKind::And { operands, parenthetic: false },
            };
            Expr { kind, location }
        }
    }
}

/// Rebuild an attribute expression as the l-value-capturing reference form;
/// anything else is handed back for the caller to diagnose.
fn into_attribute_reference(expr: Expr) -> Result<Expr, Expr> {
    match expr {
        Expr { kind: ExprKind::Attribute { target, name }, location } => {
            Ok(Expr { kind: ExprKind::AttributeReference { target, name }, location })
        }
        other => Err(other),
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr, position: Position) -> Expr {
    Expr::new(ExprKind::Binary { op, operands: Box::new([left, right]) }, position)
}
