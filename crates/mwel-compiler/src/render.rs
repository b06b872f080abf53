//! Human-readable op-list rendering, nested argument lists indented under
//! their op.

use crate::op::{CallArgsOps, Op, OpKind, OpList};

/// Render an op-list the way the CLI prints it.
pub fn render_ops(ops: &OpList) -> String {
    let mut out = String::new();
    write_ops(&mut out, ops, 0);
    out
}

fn write_ops(out: &mut String, ops: &OpList, indent: usize) {
    for (index, op) in ops.iter().enumerate() {
        out.push_str(&format!(
            "{:indent$}{index:4} {:14} {}  ",
            "",
            op.kind.name(),
            op.location,
        ));
        write_payload(out, op, indent);
    }
}

fn write_payload(out: &mut String, op: &Op, indent: usize) {
    match &op.kind {
        OpKind::ApplyTag(tag) => {
            out.push_str(tag);
            out.push('\n');
        }
        OpKind::BinaryOp(op) => {
            out.push_str(op.symbol());
            out.push('\n');
        }
        OpKind::UnaryOp(op) => {
            out.push_str(op.symbol());
            out.push('\n');
        }
        OpKind::BuildArray(count) | OpKind::ConcatArrays(count) => {
            out.push_str(&count.to_string());
            out.push('\n');
        }
        OpKind::BuildObject(keys) => {
            out.push_str(&keys.join(","));
            out.push('\n');
        }
        OpKind::LoadConst(value) => {
            out.push_str(&value.to_string());
            out.push('\n');
        }
        OpKind::LoadName(name)
        | OpKind::LoadGlobal(name)
        | OpKind::LoadLocal(name)
        | OpKind::LoadClosure(name)
        | OpKind::StoreGlobal(name)
        | OpKind::StoreLocal(name)
        | OpKind::StoreClosure(name)
        | OpKind::InitLocal(name)
        | OpKind::LoadAttr(name)
        | OpKind::LoadAttrRef(name)
        | OpKind::StoreAttr(name) => {
            out.push_str(name);
            out.push('\n');
        }
        OpKind::LoadNonlocal { name, depth } | OpKind::StoreNonlocal { name, depth } => {
            out.push_str(&format!("{name} {depth}\n"));
        }
        OpKind::CompareOp { ops, operands } => {
            let symbols: Vec<&str> = ops.iter().map(|op| op.symbol()).collect();
            out.push_str(&symbols.join(","));
            out.push('\n');
            write_operand_lists(out, operands, indent);
        }
        OpKind::LogicalAnd { operands } | OpKind::LogicalOr { operands } => {
            out.push('\n');
            write_operand_lists(out, operands, indent);
        }
        OpKind::CallFunction(args) | OpKind::CallSimple(args) => {
            out.push('\n');
            write_call_args(out, args, indent);
        }
        OpKind::CallCompound { function_name, clauses } => {
            out.push_str(function_name);
            out.push('\n');
            for (number, clause) in clauses.iter().enumerate() {
                out.push_str(&format!(
                    "{:indent$}clause {number} ({} locals):\n",
                    "",
                    clause.num_locals,
                    indent = indent + 7,
                ));
                write_call_args(out, &clause.args, indent + 2);
                write_ops(out, &clause.body, indent + 9);
            }
        }
        OpKind::MakeFunction { num_args, body, closure } => {
            let captures: Vec<String> = closure
                .iter()
                .map(|(name, depth)| format!("({name}, {depth})"))
                .collect();
            out.push_str(&format!("args={num_args} closure=[{}]\n", captures.join(", ")));
            write_ops(out, body, indent + 9);
        }
        OpKind::BuildRangeArray
        | OpKind::LoadSubscr
        | OpKind::StoreSubscr
        | OpKind::ReturnValue
        | OpKind::DupTop
        | OpKind::DupTopTwo
        | OpKind::RotTwo
        | OpKind::RotThree => out.push('\n'),
    }
}

fn write_operand_lists(out: &mut String, operands: &[OpList], indent: usize) {
    for (number, ops) in operands.iter().enumerate() {
        out.push_str(&format!("{:indent$}arg {number}:\n", "", indent = indent + 7));
        write_ops(out, ops, indent + 9);
    }
}

fn write_call_args(out: &mut String, args: &CallArgsOps, indent: usize) {
    match args {
        CallArgsOps::Positional(args) => write_operand_lists(out, args, indent),
        CallArgsOps::Named(args) => {
            for (name, ops) in args {
                out.push_str(&format!("{:indent$}arg {name}:\n", "", indent = indent + 7));
                write_ops(out, ops, indent + 9);
            }
        }
    }
}
