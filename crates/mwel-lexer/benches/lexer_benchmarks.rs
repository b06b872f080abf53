use criterion::{criterion_group, criterion_main, Criterion};
use mwel_lexer::{Lexer, Token};
use mwel_error::NullSink;
use std::hint::black_box;

fn collect_all_tokens(input: &str) -> Vec<Token> {
    let mut sink = NullSink;
    Lexer::new(&mut sink).tokenize(input)
}

fn bench_simple_tokens(c: &mut Criterion) {
    let input = "local x = 42\nprint(x)\n";

    c.bench_function("simple_tokens", |b| {
        b.iter(|| collect_all_tokens(black_box(input)));
    });
}

fn bench_grouping_newlines(c: &mut Criterion) {
    let input = "values = [\n    1,\n    2,\n    3,\n]\nlookup = {\n    a: 1,\n    b: 2,\n}\n";

    c.bench_function("grouping_newlines", |b| {
        b.iter(|| collect_all_tokens(black_box(input)));
    });
}

fn bench_string_escapes(c: &mut Criterion) {
    let input = r#"
        greeting = 'Hello, \'world\'!\n'
        banner = """multi
        line banner"""
        path = "a\/b\/c"
    "#;

    c.bench_function("string_escapes", |b| {
        b.iter(|| collect_all_tokens(black_box(input)));
    });
}

fn bench_large_module(c: &mut Criterion) {
    // Generate a large module
    let mut input = String::new();
    for i in 0..1000 {
        input.push_str(&format!("local var{i} = {i}.5ms\n"));
        input.push_str(&format!("print(var{i})\n"));
        if i % 10 == 0 {
            input.push_str(&format!("check(var{i} < {i} + 1)\n"));
        }
    }

    c.bench_function("large_module", |b| {
        b.iter(|| collect_all_tokens(black_box(&input)));
    });
}

criterion_group!(
    benches,
    bench_simple_tokens,
    bench_grouping_newlines,
    bench_string_escapes,
    bench_large_module,
);
criterion_main!(benches);
