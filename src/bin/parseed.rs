//! Compile a layout file and report the result.
//!
//! Usage:
//!   parseed [OPTIONS] [FILE]
//!   parseed < file.pds
//!
//! Options:
//!   --lexer, -L  Print the token list
//!   --ast, -A    Print the declaration tree
//!   --help, -h   Show this help
//!
//! Reads stdin when FILE is omitted or `-`. On a compile error the underlined source
//! excerpt goes to stderr and the exit status is 1. Set `RUST_LOG=parseed=debug` to trace
//! the pipeline.

use anyhow::{bail, Context};
use parseed::{compile, dump_tokens, tokenize, CompileError, Generator, TreeDump};
use std::io::{self, Read};

const USAGE: &str = "\
usage: parseed [--lexer|-L] [--ast|-A] [FILE]

Compiles a binary layout description. Reads stdin when FILE is omitted or '-'.

  -L, --lexer   print the token list
  -A, --ast     print the declaration tree
  -h, --help    show this help";

struct Args {
    lexer: bool,
    ast: bool,
    file: Option<String>,
}

fn parse_args(raw: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        lexer: false,
        ast: false,
        file: None,
    };
    for arg in raw {
        match arg.as_str() {
            "--lexer" | "-L" => args.lexer = true,
            "--ast" | "-A" => args.ast = true,
            "--help" | "-h" => return Ok(None),
            "-" => args.file = None,
            flag if flag.starts_with('-') => bail!("unknown option '{}'\n\n{}", flag, USAGE),
            path => {
                if let Some(previous) = &args.file {
                    bail!("only one input file is accepted (got '{}' and '{}')", previous, path);
                }
                args.file = Some(path.to_string());
            }
        }
    }
    Ok(Some(args))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Silent unless RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn fail(err: &CompileError) -> ! {
    eprint!("{}", err.render());
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let (source, source_id) = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path))?;
            (text, path.clone())
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            (text, "<stdin>".to_string())
        }
    };

    if args.lexer {
        let tokens = tokenize(&source, &source_id).unwrap_or_else(|e| fail(&e));
        print!("{}", dump_tokens(&tokens));
    }

    let schema = compile(&source, &source_id).unwrap_or_else(|e| fail(&e));

    if args.ast {
        print!("{}", TreeDump.generate_to_string(&schema)?);
    } else if !args.lexer {
        println!(
            "{}: ok, {} struct(s), {} bitfield(s)",
            source_id,
            schema.structs().count(),
            schema.bitfields().count()
        );
    }
    Ok(())
}
