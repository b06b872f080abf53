//! `mwelc`: compile MWEL source and print the op-list.
//!
//! Reads the program from the files given as arguments (concatenated, `-`
//! meaning stdin) or from stdin when no files are given. Errors print to
//! stderr; the exit code is non-zero when any error was reported.

use std::io::Read;
use std::process::ExitCode;

use mwel::{compile, render_ops, ErrorCollector};
use tracing_subscriber::EnvFilter;

struct Options {
    json: bool,
    expression: bool,
    files: Vec<String>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options { json: false, expression: false, files: Vec::new() };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => options.json = true,
            "--expression" | "-e" => options.expression = true,
            "--help" | "-h" => {
                return Err("usage: mwelc [--json] [--expression] [file ...]".to_owned())
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option '{arg}'")),
            _ => options.files.push(arg),
        }
    }
    Ok(options)
}

fn read_source(files: &[String]) -> std::io::Result<String> {
    if files.is_empty() {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    let mut source = String::new();
    for file in files {
        if file == "-" {
            std::io::stdin().read_to_string(&mut source)?;
        } else {
            source.push_str(&std::fs::read_to_string(file)?);
        }
    }
    Ok(source)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let source = match read_source(&options.files) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("mwelc: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut errors = ErrorCollector::new();
    let ops = if options.expression {
        mwel::compile_expression(&source, &mut errors)
    } else {
        compile(&source, &mut errors)
    };

    for record in errors.iter() {
        eprintln!("{record}");
    }

    let Some(ops) = ops else {
        return ExitCode::FAILURE;
    };

    if options.json {
        match serde_json::to_string_pretty(&ops) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("mwelc: {error}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", render_ops(&ops));
    }
    ExitCode::SUCCESS
}
