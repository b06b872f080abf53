//! Call lowering details: named arguments, compound clause arguments, and
//! the short-circuit operand lists.

use std::collections::VecDeque;

use mwel_compiler::{CallArgsOps, Compiler, ConstValue, Op, OpKind, OpList};
use mwel_error::ErrorCollector;
use mwel_lexer::Lexer;
use mwel_parser::Parser;
use mwel_position_tracking::{Position, SourceLocation};
use pretty_assertions::assert_eq;

fn compile(source: &str) -> VecDeque<Op> {
    let mut errors = ErrorCollector::new();
    let tokens = Lexer::new(&mut errors).tokenize(source);
    let module = Parser::parse(tokens, &mut errors)
        .unwrap_or_else(|| panic!("parse failed for {source:?}: {:?}", errors.records()));
    assert!(errors.is_empty(), "errors in {source:?}: {:?}", errors.records());
    Compiler::new().compile(&module).into()
}

fn pop(ops: &mut VecDeque<Op>) -> Op {
    ops.pop_front().unwrap_or_else(|| panic!("ran out of ops"))
}

#[test]
fn named_arguments_compile_in_declaration_order() {
    let mut ops = compile("foo(b = 2, a = 1)");
    let _ = pop(&mut ops); // LOAD_GLOBAL foo
    let call = pop(&mut ops);
    let OpKind::CallSimple(CallArgsOps::Named(args)) = call.kind else {
        panic!("expected named CALL_SIMPLE, got {:?}", call.kind);
    };
    let keys: Vec<&str> = args.keys().map(|k| &**k).collect();
    assert_eq!(vec!["b", "a"], keys);
    assert!(matches!(
        args["b"][0].kind,
        OpKind::LoadConst(ConstValue::Number(value)) if value == 2.0
    ));
}

#[test]
fn expression_calls_use_call_function() {
    let mut ops = compile("x = foo(a = 1)");
    let _ = pop(&mut ops); // LOAD_GLOBAL foo
    let call = pop(&mut ops);
    assert!(matches!(call.kind, OpKind::CallFunction(CallArgsOps::Named(_))));
    let store = pop(&mut ops);
    assert!(matches!(&store.kind, OpKind::StoreGlobal(name) if &**name == "x"));
}

#[test]
fn compound_clauses_may_take_named_arguments() {
    let mut ops = compile("stage(duration = 5, label = 'warmup'):\n    run(1)\nend");
    let op = pop(&mut ops);
    let OpKind::CallCompound { function_name, clauses } = op.kind else {
        panic!("expected CALL_COMPOUND, got {:?}", op.kind);
    };
    assert_eq!("stage:", &*function_name);
    let CallArgsOps::Named(args) = &clauses[0].args else {
        panic!("expected named clause args");
    };
    let keys: Vec<&str> = args.keys().map(|k| &**k).collect();
    assert_eq!(vec!["duration", "label"], keys);
}

#[test]
fn chained_else_heads_accumulate_the_function_name() {
    let mut ops = compile(
        "when(1):\n    a(1)\nelse when(2):\n    b(2)\nelse when(3):\n    c(3)\nelse:\n    d(4)\nend",
    );
    let op = pop(&mut ops);
    let OpKind::CallCompound { function_name, clauses } = op.kind else {
        panic!("expected CALL_COMPOUND, got {:?}", op.kind);
    };
    assert_eq!("when:when:when::", &*function_name);
    assert_eq!(4, clauses.len());
    for clause in &clauses[..3] {
        assert_eq!(1, clause.args.len());
    }
    assert!(clauses[3].args.is_empty());
}

#[test]
fn logical_operands_evaluate_lazily_from_sublists() {
    // Each operand is a nested op-list, so nothing of `b` or `c` leaks into
    // the outer stream.
    let mut ops = compile("x = a or b or c");
    let op = pop(&mut ops);
    let OpKind::LogicalOr { operands } = op.kind else {
        panic!("expected LOGICAL_OR, got {:?}", op.kind);
    };
    assert_eq!(3, operands.len());
    for (operand, name) in operands.iter().zip(["a", "b", "c"]) {
        assert_eq!(1, operand.len(), "operand list for {name}");
        assert!(
            matches!(&operand[0].kind, OpKind::LoadGlobal(actual) if &**actual == name),
            "operand for {name}: {:?}",
            operand[0].kind,
        );
    }
    let store = pop(&mut ops);
    assert!(matches!(store.kind, OpKind::StoreGlobal(_)));
    assert!(ops.is_empty());
}

#[test]
fn call_arguments_resolve_against_the_calling_scope() {
    let mut ops = compile("local x = 1\nfoo(x, y)");
    let _ = pop(&mut ops); // LOAD_CONST
    let _ = pop(&mut ops); // INIT_LOCAL
    let _ = pop(&mut ops); // LOAD_GLOBAL foo
    let call = pop(&mut ops);
    let OpKind::CallSimple(CallArgsOps::Positional(args)) = call.kind else {
        panic!("expected CALL_SIMPLE, got {:?}", call.kind);
    };
    assert!(matches!(&args[0][0].kind, OpKind::LoadLocal(name) if &**name == "x"));
    assert!(matches!(&args[1][0].kind, OpKind::LoadGlobal(name) if &**name == "y"));
}

#[test]
fn empty_call_args_are_an_empty_positional_list() {
    let mut ops = compile("tick()");
    let _ = pop(&mut ops);
    let call = pop(&mut ops);
    assert_eq!(SourceLocation::Single(Position::new(1, 4)), call.location);
    let OpKind::CallSimple(args) = call.kind else {
        panic!("expected CALL_SIMPLE, got {:?}", call.kind);
    };
    assert!(args.is_empty());
    assert!(matches!(args, CallArgsOps::Positional(_)));
}

#[test]
fn render_includes_named_argument_labels() {
    let mut errors = ErrorCollector::new();
    let tokens = Lexer::new(&mut errors).tokenize("foo(rate = 1)\n");
    let module = Parser::parse(tokens, &mut errors).unwrap_or_else(|| panic!("parse failed"));
    let ops: OpList = Compiler::new().compile(&module);
    let rendered = mwel_compiler::render_ops(&ops);
    assert!(rendered.contains("arg rate:"), "rendered:\n{rendered}");
}
